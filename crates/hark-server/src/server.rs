//! `HarkServer`: Axum HTTP dispatch surface.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use hark_worker::metrics::JOB_ERRORS_TOTAL;
use hark_worker::{ErrorResponse, Job, JobOutcome, RequestProcessor};
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Pipeline shared by all requests.
    pub processor: Arc<RequestProcessor>,
    /// When the server started.
    pub start_time: Instant,
    /// Jobs currently being processed.
    pub in_flight: Arc<AtomicUsize>,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
    /// Request body ceiling, in bytes.
    pub max_body_bytes: usize,
}

/// Body of a `/runsync` response.
#[derive(Debug, Clone, Serialize)]
pub struct RunSyncResponse {
    /// Job id, echoed or generated.
    pub id: String,
    /// Always `"COMPLETED"`; pipeline errors live in `output.error`.
    pub status: &'static str,
    /// Transcript or error.
    pub output: JobOutcome,
}

/// The hark HTTP server.
pub struct HarkServer {
    config: ServerConfig,
    processor: Arc<RequestProcessor>,
    metrics: Option<PrometheusHandle>,
    start_time: Instant,
}

impl HarkServer {
    /// Create a new server.
    pub fn new(config: ServerConfig, processor: RequestProcessor) -> Self {
        Self {
            config,
            processor: Arc::new(processor),
            metrics: None,
            start_time: Instant::now(),
        }
    }

    /// Serve `/metrics` from `handle`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            processor: Arc::clone(&self.processor),
            start_time: self.start_time,
            in_flight: Arc::new(AtomicUsize::new(0)),
            metrics: self.metrics.clone(),
            max_body_bytes: self.config.max_body_bytes,
        };

        Router::new()
            .route("/runsync", post(runsync_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr: SocketAddr = listener.local_addr()?;
        info!(
            addr = %local_addr,
            model = self.processor.model().model_name(),
            "hark server started"
        );
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("hark server stopped");
        Ok(())
    }
}

/// Decrements the in-flight counter when the request ends, including
/// when the client disconnects mid-job.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        let _ = counter.fetch_add(1, Ordering::Relaxed);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let _ = self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// POST /runsync
async fn runsync_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return oversized_body(&state, &headers);
        }
        Err(rejection) => return rejection.into_response(),
    };

    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "rejecting unparseable body");
            let body = ErrorResponse {
                error: format!("Invalid JSON body: {e}"),
            };
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    let _guard = InFlight::enter(&state.in_flight);
    let (id, output) = match Job::from_value(value) {
        Ok(job) => {
            let id = job
                .id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            (id, state.processor.process(&job).await)
        }
        Err(e) => (uuid::Uuid::new_v4().to_string(), JobOutcome::from(e)),
    };

    Json(RunSyncResponse {
        id,
        status: "COMPLETED",
        output,
    })
    .into_response()
}

/// Body over the transport limit: report it as an oversized payload,
/// estimating the decoded size from the declared length.
fn oversized_body(state: &AppState, headers: &HeaderMap) -> Response {
    let encoded = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or_else(|| u64::try_from(state.max_body_bytes).unwrap_or(u64::MAX));
    let decoded = encoded / 4 * 3;
    let err = state.processor.config().limits.size_error(decoded);
    counter!(JOB_ERRORS_TOTAL, "kind" => err.kind()).increment(1);
    info!(encoded_len = encoded, error = %err, "request body over limit");
    let body = ErrorResponse {
        error: err.to_string(),
    };
    (StatusCode::PAYLOAD_TOO_LARGE, Json(body)).into_response()
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.processor.model(),
        state.in_flight.load(Ordering::Relaxed),
    ))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => crate::metrics::render(handle).into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
