//! Job envelope parsing and payload decoding.

use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::JobError;

/// Extension used when the job does not supply a usable one.
pub const DEFAULT_EXTENSION: &str = "wav";

/// Longest extension kept after sanitizing.
const MAX_EXTENSION_LEN: usize = 16;

/// A job envelope: `{"id": ..., "input": {...}}`.
///
/// `input` stays untyped until [`Job::input`] so a malformed input object
/// becomes an error result instead of a rejected request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Job {
    /// Caller-supplied job id, echoed back in responses.
    #[serde(default)]
    pub id: Option<String>,
    /// Raw input object.
    #[serde(default)]
    pub input: Value,
}

/// The fields of a job input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobInput {
    /// Base64 audio, optionally with a `data:...;base64,` prefix.
    #[serde(default)]
    pub audio_base64: Option<String>,
    /// Format hint for the staged file.
    #[serde(default)]
    pub file_extension: Option<String>,
    /// Language override; blank means auto-detect.
    #[serde(default)]
    pub force_language: Option<String>,
}

/// A job input that passed the presence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioJob {
    /// Encoded payload, not yet decoded.
    pub audio_base64: String,
    /// Sanitized extension, without the leading dot.
    pub extension: String,
    /// Non-blank language override, as supplied.
    pub force_language: Option<String>,
}

impl Job {
    /// Wrap an input object in an envelope without an id.
    pub fn from_input(input: Value) -> Self {
        Self { id: None, input }
    }

    /// Interpret an arbitrary JSON value as a job envelope.
    pub fn from_value(value: Value) -> Result<Self, JobError> {
        if !value.is_object() {
            return Err(JobError::InvalidInput(format!(
                "expected a job object, got {}",
                json_type(&value)
            )));
        }
        serde_json::from_value(value).map_err(|e| JobError::InvalidInput(e.to_string()))
    }

    /// Parse the input object. A missing or null input reads as empty.
    pub fn input(&self) -> Result<JobInput, JobError> {
        match &self.input {
            Value::Null => Ok(JobInput::default()),
            Value::Object(_) => JobInput::deserialize(&self.input)
                .map_err(|e| JobError::InvalidInput(e.to_string())),
            other => Err(JobError::InvalidInput(format!(
                "expected an input object, got {}",
                json_type(other)
            ))),
        }
    }
}

impl JobInput {
    /// Check for a payload and normalize the optional fields.
    pub fn into_audio_job(self) -> Result<AudioJob, JobError> {
        let audio_base64 = self
            .audio_base64
            .filter(|a| !a.is_empty())
            .ok_or(JobError::InputMissing)?;
        Ok(AudioJob {
            audio_base64,
            extension: sanitize_extension(self.file_extension.as_deref()),
            force_language: self.force_language.filter(|l| !l.trim().is_empty()),
        })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Strip a data URI prefix (`data:audio/wav;base64,`) if present.
pub fn normalize_base64(encoded: &str) -> &str {
    encoded
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .map_or(encoded, |(_, payload)| payload)
}

/// Decode a payload as standard padded base64.
///
/// Data URI prefixes and ASCII whitespace (line-wrapped encoders) are
/// tolerated; anything else outside the alphabet is an error.
pub fn decode_audio(encoded: &str) -> Result<Vec<u8>, JobError> {
    let payload = normalize_base64(encoded);
    let compact: Cow<'_, str> = if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(
            payload
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect(),
        )
    } else {
        Cow::Borrowed(payload)
    };
    if compact.is_empty() {
        return Err(JobError::InputMissing);
    }
    Ok(STANDARD.decode(compact.as_bytes())?)
}

/// Reduce a caller-supplied extension to something safe for a file name.
///
/// Drops a leading dot, keeps ASCII alphanumerics, lowercases, and caps
/// the length. Falls back to [`DEFAULT_EXTENSION`] when nothing is left.
pub fn sanitize_extension(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return DEFAULT_EXTENSION.to_string();
    };
    let cleaned: String = raw
        .trim()
        .trim_start_matches('.')
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_EXTENSION_LEN)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if cleaned.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        cleaned
    }
}
