//! Application configuration module
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment overrides. Only the API location, the polling options and
//! the request timeout are configurable.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default API base URL
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8001";

/// Default polling interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;

/// Default request timeout in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the analytics API, without the `/api` suffix
    pub api_base_url: String,
    /// Polling period for the background auto-sync check
    pub poll_interval_ms: u64,
    /// Whether background polling runs at all
    pub polling_enabled: bool,
    /// Per-request timeout
    pub request_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            polling_enabled: true,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

/// On-disk shape of the config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_base_url: Option<String>,
    poll_interval_ms: Option<u64>,
    polling_enabled: Option<bool>,
    request_timeout_ms: Option<u64>,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Polling period as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingValue("api_base_url"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(url.to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Default location of the config file, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pipeline-dashboard").join("config.toml"))
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: FileConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        AppConfigBuilder::default().merge_file(file).build()
    }

    /// Load a TOML file on top of the defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }
}

/// Builder for AppConfig
#[derive(Debug, Default, Clone)]
pub struct AppConfigBuilder {
    api_base_url: Option<String>,
    poll_interval_ms: Option<u64>,
    polling_enabled: Option<bool>,
    request_timeout_ms: Option<u64>,
}

impl AppConfigBuilder {
    /// Set the API base URL
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Set the polling interval in milliseconds
    pub fn poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = Some(interval_ms);
        self
    }

    /// Enable or disable background polling
    pub fn polling_enabled(mut self, enabled: bool) -> Self {
        self.polling_enabled = Some(enabled);
        self
    }

    /// Set the per-request timeout in milliseconds
    pub fn request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = Some(timeout_ms);
        self
    }

    fn merge_file(mut self, file: FileConfig) -> Self {
        if let Some(url) = file.api_base_url {
            self.api_base_url = Some(url);
        }
        if let Some(interval) = file.poll_interval_ms {
            self.poll_interval_ms = Some(interval);
        }
        if let Some(enabled) = file.polling_enabled {
            self.polling_enabled = Some(enabled);
        }
        if let Some(timeout) = file.request_timeout_ms {
            self.request_timeout_ms = Some(timeout);
        }
        self
    }

    /// Start from an existing configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            api_base_url: Some(config.api_base_url.clone()),
            poll_interval_ms: Some(config.poll_interval_ms),
            polling_enabled: Some(config.polling_enabled),
            request_timeout_ms: Some(config.request_timeout_ms),
        }
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            api_base_url: self
                .api_base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            poll_interval_ms: self.poll_interval_ms.unwrap_or(defaults.poll_interval_ms),
            polling_enabled: self.polling_enabled.unwrap_or(defaults.polling_enabled),
            request_timeout_ms: self.request_timeout_ms.unwrap_or(defaults.request_timeout_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
}
