//! Model loading at process start.

use hark_settings::ModelSettings;
use hark_transcription::ModelState;
use tracing::info;

/// Load the configured model (falling back if needed) off the async runtime.
///
/// Never fails: a model that cannot be loaded yields
/// [`ModelState::Unavailable`] and the worker keeps serving error results.
pub async fn load_model(settings: &ModelSettings) -> ModelState {
    let settings = settings.clone();
    info!(
        model = %settings.name,
        fallback = settings.fallback.as_deref(),
        "initializing model"
    );
    match tokio::task::spawn_blocking(move || initialize(&settings)).await {
        Ok(state) => state,
        Err(e) => ModelState::unavailable(format!("model initialization panicked: {e}")),
    }
}

#[cfg(feature = "whisper")]
fn initialize(settings: &ModelSettings) -> ModelState {
    let loader = hark_transcription::WhisperLoader {
        model_dir: std::path::PathBuf::from(&settings.model_dir),
        auto_download: settings.auto_download,
        threads: settings.threads,
    };
    hark_transcription::initialize(&loader, &settings.name, settings.fallback.as_deref())
}

#[cfg(not(feature = "whisper"))]
fn initialize(settings: &ModelSettings) -> ModelState {
    tracing::warn!(model = %settings.name, "built without the `whisper` feature; no model loaded");
    ModelState::unavailable("built without the `whisper` feature")
}
