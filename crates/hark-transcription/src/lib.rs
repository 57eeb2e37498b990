//! Speech-to-text capability for the hark worker.
//!
//! Request handling only sees the [`Transcriber`] trait: given an audio file
//! path and options it returns a transcript with timed segments, a detected
//! language, and the audio duration. The concrete whisper.cpp engine lives
//! behind the `whisper` feature.
//!
//! # Architecture
//!
//! ```text
//! scratch file → symphonia decode → rubato resample to 16kHz mono f32
//! → whisper.cpp full decode (greedy) → segments + language id
//! ```
//!
//! ## Crate Position
//!
//! Standalone (no hark crate dependencies).
//! Depended on by: hark-worker, hark-agent.

// Always available (no heavy deps)
pub mod init;
pub mod model;
pub mod types;

// Feature-gated (require whisper-rs + symphonia + rubato + hf-hub)
#[cfg(feature = "whisper")]
pub(crate) mod audio;
#[cfg(feature = "whisper")]
pub mod engine;

pub use init::{ModelLoader, ModelState, initialize};
pub use types::{
    ResultExt, Segment, TranscribeOptions, Transcriber, Transcript, TranscriptionError,
};
#[cfg(feature = "whisper")]
pub use engine::{WhisperEngine, WhisperLoader};
