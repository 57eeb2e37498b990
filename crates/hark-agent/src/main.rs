//! # hark
//!
//! Transcription worker binary: loads settings and the model, then either
//! serves jobs over HTTP or runs a single job file.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hark_agent::{init_subscriber, load_model, run_job_file};
use hark_server::{HarkServer, ServerConfig, shutdown_signal};
use hark_settings::HarkSettings;
use hark_worker::{ProcessorConfig, RequestProcessor};

/// Bounded speech-to-text worker.
#[derive(Parser, Debug)]
#[command(name = "hark", version, about = "Bounded speech-to-text worker")]
struct Cli {
    /// Settings file (defaults to `$HARK_SETTINGS` or `~/.hark/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Serve jobs over HTTP.
    Serve {
        /// Host to bind (overrides settings).
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides settings).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Process one job file and print the result as JSON.
    Run {
        /// Job file: `{"input": {"audio_base64": ...}}`.
        #[arg(long, default_value = "test_input.json")]
        input: PathBuf,
    },
}

impl Cli {
    fn load_settings(&self) -> Result<HarkSettings> {
        let path = self
            .settings
            .clone()
            .unwrap_or_else(hark_settings::settings_path);
        hark_settings::load_settings_from_path(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))
    }
}

fn server_config(settings: &HarkSettings, host: Option<String>, port: Option<u16>) -> ServerConfig {
    let mut config = ServerConfig::from_settings(settings);
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    config
}

async fn build_processor(settings: &HarkSettings) -> RequestProcessor {
    let model = load_model(&settings.model).await;
    RequestProcessor::new(model, ProcessorConfig::from_settings(settings))
}

async fn serve(settings: &HarkSettings, host: Option<String>, port: Option<u16>) -> Result<()> {
    let metrics = match hark_server::metrics::install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "metrics disabled");
            None
        }
    };

    let processor = build_processor(settings).await;
    if !processor.model().is_ready() {
        tracing::warn!("no model loaded; every job will return an error");
    }

    let mut server = HarkServer::new(server_config(settings, host, port), processor);
    if let Some(handle) = metrics {
        server = server.with_metrics(handle);
    }

    server
        .serve(shutdown_signal())
        .await
        .context("Server failed")?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn run_once(settings: &HarkSettings, input: &std::path::Path) -> Result<()> {
    let processor = build_processor(settings).await;
    let outcome = run_job_file(&processor, input).await?;
    let rendered = serde_json::to_string_pretty(&outcome).context("Failed to render result")?;
    println!("{rendered}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;
    init_subscriber(&settings.logging.level, settings.logging.json);

    match cli.command {
        Command::Serve { host, port } => serve(&settings, host, port).await,
        Command::Run { input } => run_once(&settings, &input).await,
    }
}
