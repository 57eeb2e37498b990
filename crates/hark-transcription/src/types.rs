//! Core types for the transcription capability.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// A timed fragment of the transcript. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment start.
    pub start: f64,
    /// Segment end.
    pub end: f64,
    /// Segment text.
    pub text: String,
}

/// What a [`Transcriber`] reports for one audio file.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    /// Full transcript text.
    pub text: String,
    /// Segments in chronological order.
    pub segments: Vec<Segment>,
    /// Language reported by the model, if any.
    pub language: Option<String>,
    /// Duration of the decoded audio in seconds.
    pub duration_seconds: f64,
}

/// Per-call options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscribeOptions {
    /// Language override. `None` lets the model auto-detect.
    pub language: Option<String>,
}

impl TranscribeOptions {
    /// Options that force `language`.
    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
        }
    }
}

/// A loaded speech-to-text model.
///
/// Implementations are shared read-only across concurrent requests, so a
/// call must not mutate state that another call can observe. `transcribe`
/// blocks for as long as inference takes; async callers run it on the
/// blocking pool.
pub trait Transcriber: Send + Sync {
    /// Name of the loaded model (e.g. `"medium"`).
    fn model_name(&self) -> &str;

    /// Transcribe the audio file at `audio_path`.
    fn transcribe(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<Transcript, TranscriptionError>;
}

/// Errors that can occur during transcription.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    /// Model file missing, unknown, or failed to load.
    #[error("model not available: {0}")]
    ModelNotAvailable(String),

    /// Inference failure inside the model.
    #[error("inference error: {0}")]
    Inference(String),

    /// Audio decoding failure (unsupported format, corrupt data).
    #[error("audio decode error: {0}")]
    AudioDecode(String),

    /// Resampling failure.
    #[error("resample error: {0}")]
    Resample(String),

    /// I/O error (file read/write).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extension trait to reduce `.map_err()` boilerplate when wrapping errors into `TranscriptionError`.
pub trait ResultExt<T> {
    /// Wrap the error as [`TranscriptionError::Inference`] with `context` prefix.
    fn inference(self, context: &str) -> Result<T, TranscriptionError>;
    /// Wrap the error as [`TranscriptionError::AudioDecode`] with `context` prefix.
    fn audio_decode(self, context: &str) -> Result<T, TranscriptionError>;
    /// Wrap the error as [`TranscriptionError::Resample`] with `context` prefix.
    fn resample(self, context: &str) -> Result<T, TranscriptionError>;
    /// Wrap the error as [`TranscriptionError::ModelNotAvailable`] with `context` prefix.
    fn model(self, context: &str) -> Result<T, TranscriptionError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn inference(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::Inference(format!("{context}: {e}")))
    }
    fn audio_decode(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::AudioDecode(format!("{context}: {e}")))
    }
    fn resample(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::Resample(format!("{context}: {e}")))
    }
    fn model(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::ModelNotAvailable(format!("{context}: {e}")))
    }
}
