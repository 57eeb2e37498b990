//! Size and duration ceilings.

use hark_settings::{LimitSettings, MIB};
use hark_transcription::TranscriptionError;

use crate::errors::JobError;

/// Upper bounds enforced on every job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Largest decoded payload accepted, in bytes.
    pub max_audio_bytes: u64,
    /// Longest reported audio accepted, in seconds.
    pub max_duration_secs: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self::from(&LimitSettings::default())
    }
}

impl From<&LimitSettings> for Limits {
    fn from(settings: &LimitSettings) -> Self {
        Self {
            max_audio_bytes: settings.max_audio_bytes,
            max_duration_secs: settings.max_duration_secs,
        }
    }
}

impl Limits {
    /// Reject payloads strictly larger than the ceiling.
    pub fn check_size(&self, len: usize) -> Result<(), JobError> {
        if len as u64 > self.max_audio_bytes {
            return Err(self.size_error(len as u64));
        }
        Ok(())
    }

    /// The size rejection for a payload of `len` decoded bytes.
    pub fn size_error(&self, len: u64) -> JobError {
        JobError::SizeExceeded {
            size_mb: len as f64 / MIB as f64,
            max_mb: self.max_audio_bytes as f64 / MIB as f64,
        }
    }

    /// Reject audio strictly longer than the ceiling.
    ///
    /// A duration that is not a finite, non-negative number is a capability
    /// failure.
    pub fn check_duration(&self, seconds: f64) -> Result<(), JobError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(JobError::Transcription(TranscriptionError::Inference(
                format!("invalid audio duration: {seconds}"),
            )));
        }
        if seconds > self.max_duration_secs as f64 {
            return Err(JobError::DurationExceeded {
                minutes: seconds / 60.0,
                max_minutes: self.max_duration_secs as f64 / 60.0,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn defaults() {
        let limits = Limits::default();
        assert_eq!(limits.max_audio_bytes, 50 * MIB);
        assert_eq!(limits.max_duration_secs, 600);
    }

    #[test]
    fn size_at_ceiling_is_accepted() {
        let limits = Limits::default();
        assert!(limits.check_size((50 * MIB) as usize).is_ok());
    }

    #[test]
    fn size_over_ceiling_is_rejected() {
        let err = Limits::default()
            .check_size((50 * MIB) as usize + 1)
            .unwrap_err();
        assert_eq!(err.to_string(), "File too large: 50.0MB (max 50MB)");
    }

    #[test]
    fn size_message_rounds_to_one_decimal() {
        let err = Limits::default()
            .check_size((51.26 * MIB as f64) as usize)
            .unwrap_err();
        assert_eq!(err.to_string(), "File too large: 51.3MB (max 50MB)");
    }

    #[test]
    fn duration_at_ceiling_is_accepted() {
        assert!(Limits::default().check_duration(600.0).is_ok());
    }

    #[test]
    fn duration_over_ceiling_is_rejected() {
        let err = Limits::default().check_duration(601.0).unwrap_err();
        assert_matches!(err, JobError::DurationExceeded { .. });
        assert_eq!(err.to_string(), "Audio too long: 10.0 minutes (max 10 minutes)");
    }

    #[test]
    fn non_finite_duration_is_a_transcription_failure() {
        let limits = Limits::default();
        for bad in [f64::NAN, f64::INFINITY, -1.0] {
            let err = limits.check_duration(bad).unwrap_err();
            assert_matches!(err, JobError::Transcription(TranscriptionError::Inference(_)));
            assert!(err.to_string().starts_with("Transcription error: "), "{err}");
        }
        assert!(limits.check_duration(0.0).is_ok());
    }

    #[test]
    fn size_error_reports_estimate() {
        let err = Limits::default().size_error(80 * MIB);
        assert_eq!(err.to_string(), "File too large: 80.0MB (max 50MB)");
    }

    #[test]
    fn from_settings() {
        let settings = LimitSettings {
            max_audio_bytes: 1024,
            max_duration_secs: 30,
            transcribe_timeout_secs: Some(5),
        };
        let limits = Limits::from(&settings);
        assert_eq!(limits.max_audio_bytes, 1024);
        let err = limits.check_duration(48.0).unwrap_err();
        assert_eq!(err.to_string(), "Audio too long: 0.8 minutes (max 0.5 minutes)");
    }
}
