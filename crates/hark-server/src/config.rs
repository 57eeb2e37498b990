//! Server configuration.

use hark_settings::HarkSettings;
use serde::{Deserialize, Serialize};

/// Bind address and request limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind (`0` for auto-assign).
    pub port: u16,
    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_settings(&HarkSettings::default())
    }
}

impl ServerConfig {
    /// Derive the server configuration from loaded settings.
    pub fn from_settings(settings: &HarkSettings) -> Self {
        let body_limit = settings.server.body_limit(&settings.limits);
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            max_body_bytes: usize::try_from(body_limit).unwrap_or(usize::MAX),
        }
    }

    /// `host:port` string suitable for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
