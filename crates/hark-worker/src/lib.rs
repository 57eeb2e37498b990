//! Bounded transcription request pipeline.
//!
//! A [`Job`] carries base64 audio. [`RequestProcessor::process`] decodes it,
//! enforces the size ceiling, stages the bytes in a [`ScratchFile`], runs the
//! shared [`Transcriber`](hark_transcription::Transcriber) on the blocking
//! pool, enforces the duration ceiling, and shapes a [`JobOutcome`]. The
//! scratch file is removed on every exit path.
//!
//! ## Crate Position
//!
//! Depends on: hark-settings, hark-transcription.
//! Depended on by: hark-server, hark-agent.

pub mod errors;
pub mod job;
pub mod limits;
pub mod metrics;
pub mod outcome;
pub mod processor;
pub mod scratch;

pub use errors::JobError;
pub use job::{AudioJob, Job, JobInput};
pub use limits::Limits;
pub use outcome::{ErrorResponse, JobOutcome, TranscriptionResponse};
pub use processor::{ProcessorConfig, RequestProcessor};
pub use scratch::ScratchFile;
