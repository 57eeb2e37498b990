//! Job failure taxonomy.
//!
//! Every variant renders as the human-readable message returned to the
//! caller in `{"error": ...}`; [`JobError::kind`] gives a stable label for
//! logs and metrics.

use std::time::Duration;

use hark_transcription::TranscriptionError;
use thiserror::Error;

/// Why a job produced an error result instead of a transcript.
#[derive(Debug, Error)]
pub enum JobError {
    /// `audio_base64` absent or empty.
    #[error("No audio_base64 provided")]
    InputMissing,

    /// The job envelope could not be interpreted.
    #[error("Invalid job input: {0}")]
    InvalidInput(String),

    /// Payload is not valid base64.
    #[error("Invalid base64 encoding: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Decoded payload exceeds the size ceiling.
    #[error("File too large: {size_mb:.1}MB (max {max_mb}MB)")]
    SizeExceeded {
        /// Decoded size in MiB.
        size_mb: f64,
        /// Ceiling in MiB.
        max_mb: f64,
    },

    /// Reported audio duration exceeds the duration ceiling.
    #[error("Audio too long: {minutes:.1} minutes (max {max_minutes} minutes)")]
    DurationExceeded {
        /// Reported duration in minutes.
        minutes: f64,
        /// Ceiling in minutes.
        max_minutes: f64,
    },

    /// The scratch file could not be written.
    #[error("Transcription error: failed to stage audio: {0}")]
    Staging(#[source] std::io::Error),

    /// The transcription capability failed or panicked.
    #[error("Transcription error: {0}")]
    Transcription(#[from] TranscriptionError),

    /// The transcription call did not finish within the configured deadline.
    #[error("Transcription timed out after {} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    /// No model is loaded in this process.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
}

impl JobError {
    /// Stable `snake_case` label for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputMissing => "input_missing",
            Self::InvalidInput(_) => "invalid_input",
            Self::Decode(_) => "decode_failure",
            Self::SizeExceeded { .. } => "size_exceeded",
            Self::DurationExceeded { .. } => "duration_exceeded",
            Self::Staging(_) => "staging_failure",
            Self::Transcription(_) => "transcription_failure",
            Self::Timeout(_) => "timeout",
            Self::ModelUnavailable(_) => "model_unavailable",
        }
    }

    /// Whether the caller's payload is at fault (as opposed to the worker).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InputMissing
                | Self::InvalidInput(_)
                | Self::Decode(_)
                | Self::SizeExceeded { .. }
                | Self::DurationExceeded { .. }
        )
    }
}
