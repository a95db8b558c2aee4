//! Error types for keylatch
//!
//! All modules use `KeylatchResult<T>` as their return type. Store backends
//! report `StoreError`, which converts into `KeylatchError::Store`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for keylatch operations
pub type KeylatchResult<T> = Result<T, KeylatchError>;

/// Result type alias for store backend operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by a key-value backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// All errors that can occur in keylatch
#[derive(Error, Debug)]
pub enum KeylatchError {
    // Store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Unsupported store URL: {0}")]
    UnsupportedStore(String),

    // Lock errors
    #[error("Lock busy: {0}")]
    LockBusy(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process terminated by signal")]
    ProcessSignaled,

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl KeylatchError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Store(_) => Some("Check that the store is reachable, or pass --store"),
            Self::UnsupportedStore(_) => {
                Some("Use a redis://, rediss:// or memory:// URL")
            }
            Self::LockBusy(_) => Some("Another holder has it; retry once its TTL runs out"),
            _ => None,
        }
    }
}
