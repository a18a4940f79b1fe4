use std::env::VarError;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::shared::config::{
    check_server_url, AppConfig, AppConfigBuilder, ConfigError, ConfigFile,
    DEFAULT_EVENT_CAPACITY, DEFAULT_UPLOAD_TIMEOUT,
};

/// Default server URL
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Directory under the platform data dir holding the queue file
const DATA_DIR_NAME: &str = "water-report-sync";

/// Queue database file name
const DATABASE_FILE_NAME: &str = "queue.db";

/// Application configuration wrapper.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
}

impl Default for Config {
    /// Read `REPORT_API_URL`, `REPORT_DB_PATH` and `REPORT_UPLOAD_TIMEOUT_SECS`
    ///
    /// Each variable is checked on its own. A rejected one is logged and
    /// replaced by its default while the others still apply.
    fn default() -> Self {
        let app = AppConfig {
            server_url: Some(
                env_value("REPORT_API_URL", parse_server_url)
                    .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            ),
            database_path: env_value("REPORT_DB_PATH", parse_database_path),
            upload_timeout: env_value("REPORT_UPLOAD_TIMEOUT_SECS", parse_timeout_secs)
                .unwrap_or(DEFAULT_UPLOAD_TIMEOUT),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        };
        Self { app }
    }
}

fn env_value<T>(name: &str, parse: fn(&str) -> Result<T, ConfigError>) -> Option<T> {
    let raw = match std::env::var(name) {
        Ok(raw) => raw,
        Err(VarError::NotPresent) => return None,
        Err(VarError::NotUnicode(_)) => {
            tracing::warn!("[Config] Ignoring {}: not valid UTF-8", name);
            return None;
        }
    };

    match parse(raw.trim()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("[Config] Ignoring {}={:?}: {}", name, raw, e);
            None
        }
    }
}

fn parse_server_url(raw: &str) -> Result<String, ConfigError> {
    let url = raw.trim_end_matches('/');
    check_server_url(url)?;
    Ok(url.to_string())
}

fn parse_database_path(raw: &str) -> Result<PathBuf, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::InvalidValue("database path must not be empty"));
    }
    Ok(PathBuf::from(raw))
}

fn parse_timeout_secs(raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue("upload_timeout must be non-zero")),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(ConfigError::InvalidValue(
            "upload timeout must be a whole number of seconds",
        )),
    }
}

impl Config {
    /// Create a new configuration from environment variables and defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        let app = builder.build()?;
        Ok(Self { app })
    }

    /// Parse a TOML configuration document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents)?;
        Self::with_builder(file.into_builder())
    }

    /// Load a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn server_url(&self) -> &str {
        self.app.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Queue database location
    ///
    /// Falls back to the platform data directory, then the temp directory.
    pub fn database_path(&self) -> PathBuf {
        match &self.app.database_path {
            Some(path) => path.clone(),
            None => {
                let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
                path.push(DATA_DIR_NAME);
                path.push(DATABASE_FILE_NAME);
                path
            }
        }
    }

    pub fn upload_timeout(&self) -> Duration {
        self.app.upload_timeout
    }

    pub fn event_capacity(&self) -> usize {
        self.app.event_capacity
    }
}
