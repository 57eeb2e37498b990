//! Metric names emitted by the pipeline.
//!
//! The recorder is installed by the binary; without one every call is a no-op.

/// Jobs finished (counter, labels: outcome = `success` | `error`).
pub const JOBS_TOTAL: &str = "hark_jobs_total";
/// Jobs that ended in an error result (counter, labels: kind).
pub const JOB_ERRORS_TOTAL: &str = "hark_job_errors_total";
/// Wall time per job (histogram).
pub const JOB_DURATION_SECONDS: &str = "hark_job_duration_seconds";
/// Reported audio duration of transcribed jobs (histogram).
pub const AUDIO_DURATION_SECONDS: &str = "hark_audio_duration_seconds";
/// Jobs currently inside the pipeline (gauge).
pub const JOBS_IN_FLIGHT: &str = "hark_jobs_in_flight";
/// Scratch files that could not be removed (counter).
pub const SCRATCH_CLEANUP_FAILURES_TOTAL: &str = "hark_scratch_cleanup_failures_total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_prefixed_snake_case() {
        let names = [
            JOBS_TOTAL,
            JOB_ERRORS_TOTAL,
            JOB_DURATION_SECONDS,
            AUDIO_DURATION_SECONDS,
            JOBS_IN_FLIGHT,
            SCRATCH_CLEANUP_FAILURES_TOTAL,
        ];
        for name in names {
            assert!(name.starts_with("hark_"), "{name}");
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "{name}"
            );
        }
    }
}
