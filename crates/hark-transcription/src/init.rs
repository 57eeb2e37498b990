//! Process-wide model initialization.
//!
//! The model is loaded once at startup through a two-step state machine:
//!
//! ```text
//! Primary ──ok──▶ Ready
//!    │
//!   err ──▶ Fallback ──ok──▶ Ready
//!    │          │
//!    │         err ──▶ Unavailable
//!    └── (no fallback) ──▶ Unavailable
//! ```
//!
//! The outcome is an immutable [`ModelState`] that callers share behind an
//! `Arc` and inject into request handling.

use std::sync::Arc;

use tracing::{info, warn};

use crate::types::{Transcriber, TranscriptionError};

/// Loads a model by name.
pub trait ModelLoader {
    /// Load the model called `name`.
    fn load(&self, name: &str) -> Result<Arc<dyn Transcriber>, TranscriptionError>;
}

impl<F> ModelLoader for F
where
    F: Fn(&str) -> Result<Arc<dyn Transcriber>, TranscriptionError>,
{
    fn load(&self, name: &str) -> Result<Arc<dyn Transcriber>, TranscriptionError> {
        self(name)
    }
}

/// Result of model initialization. Never changes after startup.
#[derive(Clone)]
pub enum ModelState {
    /// A model is loaded and serving.
    Ready {
        /// Name the model was loaded under.
        name: String,
        /// Whether this is the fallback rather than the primary.
        fallback: bool,
        /// Shared, read-only model handle.
        transcriber: Arc<dyn Transcriber>,
    },
    /// No model could be loaded; every request is refused.
    Unavailable {
        /// Why loading failed.
        reason: String,
    },
}

impl ModelState {
    /// Wrap an already-loaded model.
    pub fn ready(transcriber: Arc<dyn Transcriber>) -> Self {
        Self::Ready {
            name: transcriber.model_name().to_string(),
            fallback: false,
            transcriber,
        }
    }

    /// A state that refuses all requests.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Whether a model is loaded.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// The loaded model, or the reason there is none.
    pub fn transcriber(&self) -> Result<&Arc<dyn Transcriber>, &str> {
        match self {
            Self::Ready { transcriber, .. } => Ok(transcriber),
            Self::Unavailable { reason } => Err(reason.as_str()),
        }
    }

    /// Loaded model name, if any.
    pub fn model_name(&self) -> Option<&str> {
        match self {
            Self::Ready { name, .. } => Some(name.as_str()),
            Self::Unavailable { .. } => None,
        }
    }
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready { name, fallback, .. } => f
                .debug_struct("Ready")
                .field("name", name)
                .field("fallback", fallback)
                .finish_non_exhaustive(),
            Self::Unavailable { reason } => {
                f.debug_struct("Unavailable").field("reason", reason).finish()
            }
        }
    }
}

/// Initialization step.
enum Step<'a> {
    Primary(&'a str),
    Fallback(&'a str),
    Done(ModelState),
}

/// Run the initialization state machine.
///
/// A fallback equal to the primary is not retried.
pub fn initialize(loader: &dyn ModelLoader, primary: &str, fallback: Option<&str>) -> ModelState {
    let fallback = fallback
        .map(str::trim)
        .filter(|f| !f.is_empty() && *f != primary.trim());
    let mut failures: Vec<String> = Vec::new();
    let mut step = Step::Primary(primary);

    loop {
        step = match step {
            Step::Primary(name) => match loader.load(name) {
                Ok(transcriber) => {
                    info!(model = name, "model loaded");
                    Step::Done(ModelState::Ready {
                        name: name.to_string(),
                        fallback: false,
                        transcriber,
                    })
                }
                Err(e) => {
                    warn!(model = name, error = %e, "primary model failed to load");
                    failures.push(format!("{name}: {e}"));
                    match fallback {
                        Some(next) => Step::Fallback(next),
                        None => Step::Done(ModelState::unavailable(failures.join("; "))),
                    }
                }
            },
            Step::Fallback(name) => match loader.load(name) {
                Ok(transcriber) => {
                    info!(model = name, "fallback model loaded");
                    Step::Done(ModelState::Ready {
                        name: name.to_string(),
                        fallback: true,
                        transcriber,
                    })
                }
                Err(e) => {
                    warn!(model = name, error = %e, "fallback model failed to load");
                    failures.push(format!("{name}: {e}"));
                    Step::Done(ModelState::unavailable(failures.join("; ")))
                }
            },
            Step::Done(state) => return state,
        };
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;

    use super::*;
    use crate::types::{TranscribeOptions, Transcript};

    struct Named(String);

    impl Transcriber for Named {
        fn model_name(&self) -> &str {
            &self.0
        }

        fn transcribe(
            &self,
            _audio_path: &Path,
            _options: &TranscribeOptions,
        ) -> Result<Transcript, TranscriptionError> {
            Ok(Transcript::default())
        }
    }

    /// Loader that succeeds only for names in `loadable` and records attempts.
    struct ScriptedLoader {
        loadable: Vec<&'static str>,
        attempts: Mutex<Vec<String>>,
    }

    impl ScriptedLoader {
        fn new(loadable: &[&'static str]) -> Self {
            Self {
                loadable: loadable.to_vec(),
                attempts: Mutex::new(Vec::new()),
            }
        }

        fn attempts(&self) -> Vec<String> {
            self.attempts.lock().unwrap().clone()
        }
    }

    impl ModelLoader for ScriptedLoader {
        fn load(&self, name: &str) -> Result<Arc<dyn Transcriber>, TranscriptionError> {
            self.attempts.lock().unwrap().push(name.to_string());
            if self.loadable.iter().any(|n| *n == name) {
                Ok(Arc::new(Named(name.to_string())))
            } else {
                Err(TranscriptionError::ModelNotAvailable(format!("{name} missing")))
            }
        }
    }

    #[test]
    fn primary_loads() {
        let loader = ScriptedLoader::new(&["medium", "base"]);
        let state = initialize(&loader, "medium", Some("base"));
        assert!(state.is_ready());
        assert_eq!(state.model_name(), Some("medium"));
        assert!(matches!(state, ModelState::Ready { fallback: false, .. }));
        assert_eq!(loader.attempts(), vec!["medium"]);
    }

    #[test]
    fn falls_back_when_primary_fails() {
        let loader = ScriptedLoader::new(&["base"]);
        let state = initialize(&loader, "medium", Some("base"));
        assert_eq!(state.model_name(), Some("base"));
        assert!(matches!(state, ModelState::Ready { fallback: true, .. }));
        assert_eq!(loader.attempts(), vec!["medium", "base"]);
    }

    #[test]
    fn unavailable_when_both_fail() {
        let loader = ScriptedLoader::new(&[]);
        let state = initialize(&loader, "medium", Some("base"));
        let reason = state.transcriber().err().unwrap();
        assert!(reason.contains("medium missing"), "{reason}");
        assert!(reason.contains("base missing"), "{reason}");
        assert_eq!(state.model_name(), None);
    }

    #[test]
    fn unavailable_without_fallback() {
        let loader = ScriptedLoader::new(&[]);
        let state = initialize(&loader, "medium", None);
        assert!(!state.is_ready());
        assert_eq!(loader.attempts(), vec!["medium"]);
    }

    #[test]
    fn fallback_equal_to_primary_is_not_retried() {
        let loader = ScriptedLoader::new(&[]);
        let _ = initialize(&loader, "medium", Some("medium"));
        assert_eq!(loader.attempts(), vec!["medium"]);
    }

    #[test]
    fn closure_loader() {
        let loader = |name: &str| -> Result<Arc<dyn Transcriber>, TranscriptionError> {
            Ok(Arc::new(Named(name.to_uppercase())))
        };
        let state = initialize(&loader, "tiny", None);
        assert_eq!(state.transcriber().unwrap().model_name(), "TINY");
    }

    #[test]
    fn ready_wraps_handle() {
        let state = ModelState::ready(Arc::new(Named("small".into())));
        assert_eq!(state.model_name(), Some("small"));
        assert!(format!("{state:?}").contains("small"));
    }
}
