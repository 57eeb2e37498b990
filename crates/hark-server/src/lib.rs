//! HTTP dispatch surface for the hark worker.
//!
//! | route          | purpose                                         |
//! |----------------|-------------------------------------------------|
//! | `POST /runsync`| run one job, respond `{id, status, output}`      |
//! | `GET /health`  | liveness plus model readiness                   |
//! | `GET /metrics` | Prometheus text                                 |
//!
//! ## Crate Position
//!
//! Depends on: hark-settings, hark-transcription, hark-worker.
//! Depended on by: hark-agent.

pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use server::{AppState, HarkServer, RunSyncResponse};
pub use shutdown::shutdown_signal;
