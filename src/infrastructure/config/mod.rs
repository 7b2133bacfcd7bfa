//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub plugins: PluginConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginConfig {
    /// Base directory local plugin paths are resolved against
    pub directory: PathBuf,
    /// Per-operation deadline; 0 disables it
    pub operation_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("sawmon.db"),
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            operation_timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PluginConfig {
    pub fn operation_timeout(&self) -> Option<Duration> {
        (self.operation_timeout_secs > 0).then(|| Duration::from_secs(self.operation_timeout_secs))
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Apply `SAWMON_*` environment overrides.
    pub fn with_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("SAWMON_DATABASE") {
            self.database.path = PathBuf::from(path);
        }

        if let Ok(dir) = std::env::var("SAWMON_PLUGIN_DIR") {
            self.plugins.directory = PathBuf::from(dir);
        }

        if let Ok(timeout) = std::env::var("SAWMON_OPERATION_TIMEOUT") {
            self.plugins.operation_timeout_secs = timeout
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("SAWMON_OPERATION_TIMEOUT: {}", timeout)))?;
        }

        if let Ok(level) = std::env::var("SAWMON_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(self)
    }

    pub fn load_env() -> Result<Self, ConfigError> {
        Config::default().with_env()
    }
}
