//! The request pipeline.
//!
//! ```text
//! model check → parse → decode → size check → stage → transcribe
//!   → duration check → shape → cleanup
//! ```
//!
//! Each stage can short-circuit with a [`JobError`]; [`RequestProcessor::process`]
//! turns every error into an [`ErrorResponse`](crate::outcome::ErrorResponse)
//! so callers always get a [`JobOutcome`].

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hark_settings::HarkSettings;
use hark_transcription::{
    ModelState, TranscribeOptions, Transcriber, Transcript, TranscriptionError,
};
use metrics::{counter, gauge, histogram};
use tracing::{info, warn};

use crate::errors::JobError;
use crate::job::{self, Job};
use crate::limits::Limits;
use crate::metrics::{
    AUDIO_DURATION_SECONDS, JOB_DURATION_SECONDS, JOB_ERRORS_TOTAL, JOBS_IN_FLIGHT, JOBS_TOTAL,
};
use crate::outcome::{JobOutcome, TranscriptionResponse};
use crate::scratch::ScratchFile;

/// Per-process pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Size and duration ceilings.
    pub limits: Limits,
    /// Where scratch files go. `None` means the OS temp dir.
    pub scratch_dir: Option<PathBuf>,
    /// Deadline for the transcription call. `None` waits indefinitely;
    /// a zero setting also means no deadline.
    pub timeout: Option<Duration>,
}

impl ProcessorConfig {
    /// Derive the pipeline configuration from loaded settings.
    pub fn from_settings(settings: &HarkSettings) -> Self {
        Self {
            limits: Limits::from(&settings.limits),
            scratch_dir: settings.scratch.dir_path(),
            timeout: settings
                .limits
                .transcribe_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

/// Runs jobs against the process-wide model.
#[derive(Debug, Clone)]
pub struct RequestProcessor {
    model: ModelState,
    config: ProcessorConfig,
}

impl RequestProcessor {
    /// Create a processor over an initialized model.
    pub fn new(model: ModelState, config: ProcessorConfig) -> Self {
        Self { model, config }
    }

    /// The model this processor serves.
    pub fn model(&self) -> &ModelState {
        &self.model
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Run one job to completion. Never fails; errors become error results.
    pub async fn process(&self, job: &Job) -> JobOutcome {
        let started = Instant::now();
        let in_flight = InFlightGauge::enter();

        let result = self.run(job).await;

        drop(in_flight);
        let elapsed = started.elapsed();
        histogram!(JOB_DURATION_SECONDS).record(elapsed.as_secs_f64());

        match result {
            Ok(response) => {
                counter!(JOBS_TOTAL, "outcome" => "success").increment(1);
                info!(
                    job_id = job.id.as_deref(),
                    language = %response.detected_language,
                    duration_secs = response.duration,
                    segments = response.segments.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "transcription complete"
                );
                JobOutcome::Success(response)
            }
            Err(err) => {
                counter!(JOBS_TOTAL, "outcome" => "error").increment(1);
                counter!(JOB_ERRORS_TOTAL, "kind" => err.kind()).increment(1);
                if err.is_client_error() {
                    info!(job_id = job.id.as_deref(), kind = err.kind(), error = %err, "job rejected");
                } else {
                    warn!(job_id = job.id.as_deref(), kind = err.kind(), error = %err, "job failed");
                }
                JobOutcome::from(err)
            }
        }
    }

    async fn run(&self, job: &Job) -> Result<TranscriptionResponse, JobError> {
        let transcriber = Arc::clone(
            self.model
                .transcriber()
                .map_err(|reason| JobError::ModelUnavailable(reason.to_string()))?,
        );

        let request = job.input()?.into_audio_job()?;
        info!(
            job_id = job.id.as_deref(),
            encoded_len = request.audio_base64.len(),
            extension = %request.extension,
            "job received"
        );

        let audio = job::decode_audio(&request.audio_base64)?;
        info!(job_id = job.id.as_deref(), bytes = audio.len(), "audio decoded");
        self.config.limits.check_size(audio.len())?;

        let scratch =
            ScratchFile::create(&audio, &request.extension, self.config.scratch_dir.as_deref())
                .map_err(JobError::Staging)?;
        drop(audio);

        let options = TranscribeOptions {
            language: request
                .force_language
                .as_deref()
                .map(|l| l.trim().to_string()),
        };
        let transcript = self
            .transcribe(transcriber, scratch.path().to_path_buf(), options)
            .await?;
        if transcript.duration_seconds.is_finite() {
            histogram!(AUDIO_DURATION_SECONDS).record(transcript.duration_seconds);
        }

        self.config
            .limits
            .check_duration(transcript.duration_seconds)?;

        let response = TranscriptionResponse::from_transcript(transcript, request.force_language);
        scratch.close();
        Ok(response)
    }

    /// Run the blocking capability on the blocking pool, bounded by the
    /// configured deadline. On timeout the call keeps running detached.
    async fn transcribe(
        &self,
        transcriber: Arc<dyn Transcriber>,
        path: PathBuf,
        options: TranscribeOptions,
    ) -> Result<Transcript, JobError> {
        let task =
            tokio::task::spawn_blocking(move || transcriber.transcribe(&path, &options));

        let joined = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_elapsed| JobError::Timeout(limit))?,
            None => task.await,
        };

        match joined {
            Ok(result) => Ok(result?),
            Err(e) if e.is_panic() => Err(JobError::Transcription(TranscriptionError::Inference(
                format!("transcriber panicked: {}", panic_message(&*e.into_panic())),
            ))),
            Err(e) => Err(JobError::Transcription(TranscriptionError::Inference(
                format!("transcription task cancelled: {e}"),
            ))),
        }
    }
}

/// Holds the in-flight gauge up until dropped, including when the caller
/// abandons the job future.
struct InFlightGauge;

impl InFlightGauge {
    fn enter() -> Self {
        gauge!(JOBS_IN_FLIGHT).increment(1.0);
        Self
    }
}

impl Drop for InFlightGauge {
    fn drop(&mut self) {
        gauge!(JOBS_IN_FLIGHT).decrement(1.0);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
