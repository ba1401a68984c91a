//! Runtime configuration, loaded once at start-up and passed to consumers.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Application configuration.
///
/// Keys match the runtime `config.json` object; missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Identity provider tenant URL.
    pub base_url: String,
    #[serde(rename = "clientID", alias = "clientId")]
    pub client_id: String,
    pub sign_in_redirect_url: String,
    pub sign_out_redirect_url: String,
    /// Incident and user directory backend.
    #[serde(rename = "resourceServerURL", alias = "resourceServerUrl")]
    pub resource_server_url: String,
    pub geocoder_url: String,
    pub scopes: Vec<String>,
    pub clock_tolerance_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.asgardeo.io/t/trailincidents".into(),
            client_id: String::new(),
            sign_in_redirect_url: "http://localhost:3000".into(),
            sign_out_redirect_url: "http://localhost:3000".into(),
            resource_server_url: "http://localhost:8000/api".into(),
            geocoder_url: "https://nominatim.openstreetmap.org/reverse".into(),
            scopes: [
                "openid",
                "profile",
                "email",
                "roles",
                "groups",
                "internal_user_mgt_view",
                "internal_user_mgt_list",
                "internal_user_mgt_create",
                "internal_user_mgt_update",
                "internal_user_mgt_delete",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            clock_tolerance_secs: 300,
        }
    }
}

impl AppConfig {
    /// Parse a config file, reporting any failure.
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Load a config file, falling back to defaults when it is missing or invalid.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(cfg) => {
                info!(path = %path.display(), "configuration loaded");
                cfg
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    /// Apply `TRAILWATCH_RESOURCE_SERVER_URL` and `TRAILWATCH_GEOCODER_URL`.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("TRAILWATCH_RESOURCE_SERVER_URL").filter(|s| !s.is_empty()) {
            self.resource_server_url = url;
        }
        if let Some(url) = lookup("TRAILWATCH_GEOCODER_URL").filter(|s| !s.is_empty()) {
            self.geocoder_url = url;
        }
        self
    }

    /// Copy safe to print: the client id is masked.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        cfg.client_id = if self.client_id.is_empty() {
            "✗ Missing".into()
        } else {
            "✓ Set".into()
        };
        cfg
    }
}
