//! Application configuration module
//!
//! Provides the validated configuration values used to open a report queue.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default upload timeout
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Default capacity of the sync and connectivity event channels
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the report server
    pub server_url: Option<String>,
    /// Location of the SQLite queue file
    pub database_path: Option<PathBuf>,
    /// Timeout for a single upload attempt
    pub upload_timeout: Duration,
    /// Buffer size for broadcast event channels
    pub event_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            database_path: None,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.server_url {
            check_server_url(url)?;
        }
        if self.upload_timeout.is_zero() {
            return Err(ConfigError::InvalidValue("upload_timeout must be non-zero"));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue("event_capacity must be non-zero"));
        }
        Ok(())
    }
}

/// Reject server URLs that are not plain http(s)
pub fn check_server_url(url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl(url.to_string()))
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server_url: Option<String>,
    database_path: Option<PathBuf>,
    upload_timeout: Option<Duration>,
    event_capacity: Option<usize>,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Set the queue database file
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = Some(timeout);
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            server_url: self.server_url.map(|url| url.trim_end_matches('/').to_string()),
            database_path: self.database_path,
            upload_timeout: self.upload_timeout.unwrap_or(DEFAULT_UPLOAD_TIMEOUT),
            event_capacity: self.event_capacity.unwrap_or(DEFAULT_EVENT_CAPACITY),
        };
        config.validate()?;
        Ok(config)
    }
}

/// On-disk representation of the configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub server_url: Option<String>,
    pub database_path: Option<PathBuf>,
    pub upload_timeout_secs: Option<u64>,
    pub event_capacity: Option<usize>,
}

impl ConfigFile {
    /// Turn the parsed file into a builder
    pub fn into_builder(self) -> AppConfigBuilder {
        AppConfigBuilder {
            server_url: self.server_url,
            database_path: self.database_path,
            upload_timeout: self.upload_timeout_secs.map(Duration::from_secs),
            event_capacity: self.event_capacity,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
