//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`HarkSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::HarkSettings;

/// Env var pointing at an explicit settings file.
pub const SETTINGS_PATH_ENV: &str = "HARK_SETTINGS";

/// Resolve the settings file path (`$HARK_SETTINGS` or `~/.hark/settings.json`).
pub fn settings_path() -> PathBuf {
    if let Some(p) = std::env::var(SETTINGS_PATH_ENV).ok().filter(|v| !v.is_empty()) {
        return PathBuf::from(p);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".hark").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<HarkSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<HarkSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<HarkSettings> {
    let defaults = serde_json::to_value(HarkSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut HarkSettings) {
    apply_overrides(settings, &|name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Values are parsed strictly; anything out of range or malformed is
/// ignored with a warning and the file/default value stays in place.
pub fn apply_overrides(settings: &mut HarkSettings, lookup: &dyn Fn(&str) -> Option<String>) {
    let env = EnvReader { lookup };

    // ── Model ───────────────────────────────────────────────────────
    if let Some(v) = env.string("WHISPER_MODEL") {
        settings.model.name = v;
    }
    if let Some(v) = env.string("WHISPER_FALLBACK_MODEL") {
        settings.model.fallback = match v.to_lowercase().as_str() {
            "none" | "off" => None,
            _ => Some(v),
        };
    }
    if let Some(v) = env.string("HARK_MODEL_DIR") {
        settings.model.model_dir = v;
    }
    if let Some(v) = env.bool("HARK_AUTO_DOWNLOAD") {
        settings.model.auto_download = v;
    }
    if let Some(v) = env.usize("HARK_THREADS", 1, 256) {
        settings.model.threads = v;
    }

    // ── Limits ──────────────────────────────────────────────────────
    if let Some(v) = env.u64("HARK_MAX_AUDIO_BYTES", 1024, 4 * 1024 * 1024 * 1024) {
        settings.limits.max_audio_bytes = v;
    }
    if let Some(v) = env.u64("HARK_MAX_DURATION_SECS", 1, 86_400) {
        settings.limits.max_duration_secs = v;
    }
    if let Some(v) = env.u64("HARK_TRANSCRIBE_TIMEOUT_SECS", 0, 86_400) {
        settings.limits.transcribe_timeout_secs = (v > 0).then_some(v);
    }

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.string("HARK_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env.u16("HARK_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.u64("HARK_MAX_BODY_BYTES", 1024, 8 * 1024 * 1024 * 1024) {
        settings.server.max_body_bytes = Some(v);
    }

    // ── Scratch / logging ───────────────────────────────────────────
    if let Some(v) = env.string("HARK_SCRATCH_DIR") {
        settings.scratch.dir = Some(v);
    }
    if let Some(v) = env.string("HARK_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("HARK_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env readers ─────────────────────────────────────────────────────────────

struct EnvReader<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl EnvReader<'_> {
    fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
    }

    fn string(&self, name: &str) -> Option<String> {
        self.raw(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = self.raw(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u16(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        let val = self.raw(name)?;
        let result = parse_u16_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid u16 env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.raw(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }

    fn usize(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        let val = self.raw(name)?;
        let result = parse_usize_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid usize env var, ignoring");
        }
        result
    }
}
