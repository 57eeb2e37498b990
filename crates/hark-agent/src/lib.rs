//! Startup plumbing for the `hark` binary.
//!
//! ## Crate Position
//!
//! Top of the graph: wires hark-settings, hark-transcription, hark-worker,
//! and hark-server together.

pub mod logging;
pub mod runner;
pub mod startup;

pub use logging::init_subscriber;
pub use runner::run_job_file;
pub use startup::load_model;
