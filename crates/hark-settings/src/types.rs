//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so a settings
//! file only needs the keys it overrides. Each type implements [`Default`]
//! with production values.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// Root settings type for the worker.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarkSettings {
    /// Speech-to-text model selection.
    pub model: ModelSettings,
    /// Per-request policy limits.
    pub limits: LimitSettings,
    /// HTTP dispatch surface.
    pub server: ServerSettings,
    /// Scratch file placement.
    pub scratch: ScratchSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

/// Model selection. Fixed for the lifetime of the process.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSettings {
    /// Primary model name (e.g. `"medium"`) or path to a ggml model file.
    pub name: String,
    /// Model tried when the primary fails to load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    /// Directory holding `ggml-<name>.bin` files.
    pub model_dir: String,
    /// Download missing catalog models on startup.
    pub auto_download: bool,
    /// Inference threads per request.
    pub threads: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "medium".to_string(),
            fallback: Some("base".to_string()),
            model_dir: default_model_dir().to_string_lossy().into_owned(),
            auto_download: true,
            threads: 4,
        }
    }
}

/// Size and duration ceilings applied to every job.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LimitSettings {
    /// Maximum decoded payload size in bytes.
    pub max_audio_bytes: u64,
    /// Maximum reported audio duration in seconds.
    pub max_duration_secs: u64,
    /// Optional deadline for the blocking transcription call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcribe_timeout_secs: Option<u64>,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_audio_bytes: 50 * MIB,
            max_duration_secs: 600,
            transcribe_timeout_secs: None,
        }
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Maximum request body size in bytes. `None` derives it from
    /// [`LimitSettings::max_audio_bytes`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_body_bytes: Option<u64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_body_bytes: None,
        }
    }
}

impl ServerSettings {
    /// Request body ceiling: the explicit setting, else room for a
    /// base64 payload of `limits.max_audio_bytes` plus line wrapping and
    /// the JSON envelope.
    pub fn body_limit(&self, limits: &LimitSettings) -> u64 {
        self.max_body_bytes.unwrap_or_else(|| {
            let encoded = limits.max_audio_bytes.div_ceil(3).saturating_mul(4);
            encoded
                .saturating_add(encoded / 16)
                .saturating_add(MIB)
        })
    }
}

/// Scratch file settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScratchSettings {
    /// Directory for scratch files. `None` uses the OS temp dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl ScratchSettings {
    /// Resolved scratch directory, if one is configured.
    pub fn dir_path(&self) -> Option<PathBuf> {
        self.dir.as_deref().map(PathBuf::from)
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Default model cache directory under `~/.hark/models`.
pub fn default_model_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".hark").join("models")
}
