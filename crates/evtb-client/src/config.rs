//! # Client Configuration
//!
//! Save and load client settings to/from disk.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ApiError, ApiResult};
use crate::session::{DEFAULT_LOGIN_ROUTE, DEFAULT_REDIRECT_DELAY};
use crate::storage;
use crate::token::{DEFAULT_EXPIRY_WINDOW, DEFAULT_STORAGE_KEY};

/// Environment variable overriding [`ClientConfig::api_url`].
pub const API_URL_ENV: &str = "EVTB_API_URL";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the marketplace backend.
    pub api_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Directory for the credential store. Defaults to `<config_dir>/evtb`.
    pub storage_dir: Option<PathBuf>,

    /// Storage key of the credential blob.
    pub storage_key: String,

    /// Route the front end is sent to when the session expires.
    pub login_route: String,

    /// Delay before that redirect, in milliseconds.
    pub redirect_delay_ms: u64,

    /// Tokens expiring within this many seconds are "expiring soon".
    pub expiry_window_secs: u64,

    /// Path fragments marking endpoints that never carry a bearer token
    /// and whose 401s do not end the session.
    pub auth_endpoints: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
            storage_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            redirect_delay_ms: u64::try_from(DEFAULT_REDIRECT_DELAY.as_millis()).unwrap_or(1500),
            expiry_window_secs: DEFAULT_EXPIRY_WINDOW.as_secs(),
            auth_endpoints: vec![
                "login".to_string(),
                "register".to_string(),
                "forgot-password".to_string(),
            ],
        }
    }
}

impl ClientConfig {
    /// Returns the default config file path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("evtb").join("config.json"))
    }

    /// Loads configuration from the default path, or returns defaults.
    ///
    /// `EVTB_API_URL` overrides the stored API URL.
    #[must_use]
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::warn!("Could not determine config directory");
                Self::default()
            }
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!(%url, "Using API URL from environment");
                config.api_url = url;
            }
        }

        config
    }

    /// Loads configuration from `path`, falling back to defaults if it is
    /// missing or unreadable.
    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!(?path, "Loaded configuration");
                    config
                }
                Err(e) => {
                    tracing::warn!(?path, error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(?path, error = %e, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Saves configuration to the default path.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if there is no config directory,
    /// or [`ApiError::Storage`] if the file cannot be written.
    pub fn save(&self) -> ApiResult<()> {
        let path = Self::config_path().ok_or_else(|| {
            ApiError::Configuration("could not determine config directory".to_string())
        })?;
        self.save_to(&path)
    }

    /// Saves configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> ApiResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        tracing::info!(?path, "Saved configuration");
        Ok(())
    }

    /// Checks that the config can drive a client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] describing the first problem found.
    pub fn validate(&self) -> ApiResult<()> {
        let url = self.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ApiError::Configuration(format!(
                "api_url must start with http:// or https://, got {url:?}"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ApiError::Configuration(
                "timeout_secs must be positive".to_string(),
            ));
        }
        if !storage::is_valid_key(&self.storage_key) {
            return Err(ApiError::Configuration(format!(
                "storage_key may only contain letters, digits, '_' and '-', got {:?}",
                self.storage_key
            )));
        }
        if self.auth_endpoints.iter().any(|m| m.trim().is_empty()) {
            return Err(ApiError::Configuration(
                "auth_endpoints must not contain empty entries".to_string(),
            ));
        }
        Ok(())
    }

    /// Request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Redirect grace period.
    #[must_use]
    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    /// "Expiring soon" window.
    #[must_use]
    pub fn expiry_window(&self) -> Duration {
        Duration::from_secs(self.expiry_window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.storage_key, "evtb_auth");
        assert_eq!(config.login_route, "/login");
        assert_eq!(config.redirect_delay(), Duration::from_millis(1500));
        assert_eq!(config.expiry_window(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("evtb").join("config.json");

        let config = ClientConfig {
            api_url: "https://api.evtb.vn".to_string(),
            timeout_secs: 10,
            ..ClientConfig::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(ClientConfig::load_from(&path), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"api_url":"https://api.evtb.vn"}"#).unwrap();

        let config = ClientConfig::load_from(&path);
        assert_eq!(config.api_url, "https://api.evtb.vn");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.auth_endpoints.len(), 3);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{{{").unwrap();

        assert_eq!(ClientConfig::load_from(&path), ClientConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ClientConfig {
            api_url: "ftp://x".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(ApiError::Configuration(_))));

        let config = ClientConfig {
            timeout_secs: 0,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unusable_storage_key() {
        for key in ["", "evtb.auth", "../auth", "evtb auth"] {
            let config = ClientConfig {
                storage_key: key.to_string(),
                ..ClientConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ApiError::Configuration(_))),
                "accepted {key:?}"
            );
        }

        let config = ClientConfig {
            storage_key: "evtb_auth-2".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_auth_endpoint() {
        let config = ClientConfig {
            auth_endpoints: vec!["login".to_string(), "  ".to_string()],
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(ApiError::Configuration(_))));
    }
}
