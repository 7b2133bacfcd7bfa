//! Application layer errors

use thiserror::Error;

/// Plugin lifecycle and orchestration errors
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Failed installing plugin '{name}': {reason}")]
    InstallationFailure { name: String, reason: String },

    #[error("Failed loading plugin '{name}': {reason}")]
    LoadFailure { name: String, reason: String },

    #[error("Plugin '{0}' already registered")]
    AlreadyRegistered(String),

    #[error("Plugin registry already initialized")]
    AlreadyInitialized,

    #[error("Plugin record not found: {0}")]
    RecordNotFound(i64),

    #[error("Dependency cycle between plugins: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PluginError {
    pub fn installation(name: impl Into<String>, reason: impl ToString) -> Self {
        PluginError::InstallationFailure {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn load(name: impl Into<String>, reason: impl ToString) -> Self {
        PluginError::LoadFailure {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors returned by plugin operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("{0}")]
    Other(String),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Plugin '{0}' already stored")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(i64),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
