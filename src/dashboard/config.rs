use std::path::Path;
use std::time::Duration;

use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};

/// Environment override for the API base URL
pub const ENV_API_URL: &str = "DASHBOARD_API_URL";
/// Environment override for the polling interval in milliseconds
pub const ENV_POLL_INTERVAL_MS: &str = "DASHBOARD_POLL_INTERVAL_MS";
/// Environment override for enabling background polling
pub const ENV_POLLING_ENABLED: &str = "DASHBOARD_POLLING_ENABLED";

/// Dashboard configuration wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    app: AppConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self {
            app: builder.build()?,
        })
    }

    /// Defaults, then the config file (if it exists), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) if p.exists() => {
                tracing::info!("Loading dashboard config from {}", p.display());
                AppConfig::from_file(p)?
            }
            Some(p) => {
                tracing::debug!("No config file at {}, using defaults", p.display());
                AppConfig::default()
            }
            None => AppConfig::default(),
        };
        let builder = apply_env(AppConfigBuilder::from_config(&base))?;
        Self::with_builder(builder)
    }

    /// Defaults plus environment overrides only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url(), path)
    }

    pub fn api_base_url(&self) -> &str {
        &self.app.api_base_url
    }

    pub fn poll_interval(&self) -> Duration {
        self.app.poll_interval()
    }

    pub fn polling_enabled(&self) -> bool {
        self.app.polling_enabled
    }

    pub fn request_timeout(&self) -> Duration {
        self.app.request_timeout()
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }
}

fn apply_env(mut builder: AppConfigBuilder) -> Result<AppConfigBuilder, ConfigError> {
    if let Ok(url) = std::env::var(ENV_API_URL) {
        builder = builder.api_base_url(url);
    }
    if let Ok(raw) = std::env::var(ENV_POLL_INTERVAL_MS) {
        let interval = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            field: "poll_interval_ms",
            reason: format!("{} is not a number of milliseconds", raw),
        })?;
        builder = builder.poll_interval_ms(interval);
    }
    if let Ok(raw) = std::env::var(ENV_POLLING_ENABLED) {
        builder = builder.polling_enabled(parse_flag(&raw)?);
    }
    Ok(builder)
}

fn parse_flag(raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: "polling_enabled",
            reason: format!("{} is not a boolean", raw),
        }),
    }
}
