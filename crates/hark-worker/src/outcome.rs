//! Result shapes returned to the caller.

use hark_transcription::{Segment, Transcript};
use serde::{Deserialize, Serialize};

use crate::errors::JobError;

/// Language reported when neither the caller nor the model supplies one.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// A successful transcription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    /// Full transcript text.
    pub text: String,
    /// Timed segments in chronological order.
    pub segments: Vec<Segment>,
    /// Forced language, detected language, or `"unknown"`.
    pub detected_language: String,
    /// Audio duration in seconds.
    pub duration: f64,
}

/// A failed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub error: String,
}

/// Exactly one of a transcript or an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutcome {
    /// Transcription finished.
    Success(TranscriptionResponse),
    /// Some stage refused or failed the job.
    Failure(ErrorResponse),
}

impl TranscriptionResponse {
    /// Shape a capability transcript for the caller.
    pub fn from_transcript(transcript: Transcript, force_language: Option<String>) -> Self {
        let detected_language = resolve_language(force_language, transcript.language);
        let mut segments = transcript.segments;
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self {
            text: transcript.text,
            segments,
            detected_language,
            duration: transcript.duration_seconds,
        }
    }
}

impl From<&JobError> for ErrorResponse {
    fn from(err: &JobError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

impl From<JobError> for JobOutcome {
    fn from(err: JobError) -> Self {
        Self::Failure(ErrorResponse::from(&err))
    }
}

impl JobOutcome {
    /// Whether this is a transcript.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The error message, if this is a failure.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(e) => Some(&e.error),
        }
    }

    /// The transcript, if this is a success.
    pub fn transcript(&self) -> Option<&TranscriptionResponse> {
        match self {
            Self::Success(r) => Some(r),
            Self::Failure(_) => None,
        }
    }
}

/// Forced language first, then a non-empty reported one, then `"unknown"`.
pub fn resolve_language(forced: Option<String>, reported: Option<String>) -> String {
    forced
        .or_else(|| reported.filter(|l| !l.trim().is_empty()))
        .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string())
}
