//! One-shot job execution for `hark run`.

use std::path::Path;

use anyhow::{Context, Result};
use hark_worker::{Job, JobOutcome, RequestProcessor};

/// Process the job stored at `path`.
///
/// Unreadable files and invalid JSON are errors; an envelope of the wrong
/// shape is reported as an error outcome, the same way the server does.
pub async fn run_job_file(processor: &RequestProcessor, path: &Path) -> Result<JobOutcome> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read job file: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Job file is not valid JSON: {}", path.display()))?;

    Ok(match Job::from_value(value) {
        Ok(job) => processor.process(&job).await,
        Err(e) => JobOutcome::from(e),
    })
}
