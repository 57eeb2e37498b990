//! # hark-settings
//!
//! Configuration for the hark transcription worker.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`HarkSettings::default()`]
//! 2. **Settings file**: `$HARK_SETTINGS` or `~/.hark/settings.json`
//!    (deep-merged over defaults)
//! 3. **Environment variables**: `WHISPER_MODEL` and `HARK_*` overrides
//!
//! Settings are read once at startup and passed down explicitly; there is
//! no global cache.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, deep_merge, load_file_layer, load_settings,
    load_settings_from_path, settings_path,
};
pub use types::*;
