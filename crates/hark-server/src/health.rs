//! `/health` endpoint.

use std::time::Instant;

use hark_transcription::ModelState;
use serde::Serialize;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `"ok"` with a model loaded, `"degraded"` without one.
    pub status: &'static str,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Loaded model name.
    pub model: Option<String>,
    /// Whether jobs can be transcribed.
    pub model_ready: bool,
    /// Jobs currently being processed.
    pub in_flight: usize,
}

/// Build a health response from live state.
pub fn health_check(start_time: Instant, model: &ModelState, in_flight: usize) -> HealthResponse {
    HealthResponse {
        status: if model.is_ready() { "ok" } else { "degraded" },
        uptime_secs: start_time.elapsed().as_secs(),
        model: model.model_name().map(str::to_string),
        model_ready: model.is_ready(),
        in_flight,
    }
}
