//! Error types for network operations

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for network operations
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("System error: {0}")]
    System(#[from] SystemError),

    #[error(
        "Timed out after {timeout:?} waiting for network to become routable (pending: {})",
        pending.join(", ")
    )]
    ConvergenceTimeout {
        timeout: Duration,
        pending: Vec<String>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NetworkError {
    /// Whether the error was raised before anything on the host was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            NetworkError::Validation(_) | NetworkError::Serialization(_)
        )
    }
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("network configuration has no devices defined")]
    NoDevices,

    #[error("invalid network configuration: {}", problems.join("; "))]
    Invalid { problems: Vec<String> },
}

/// System operation errors
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Command `{command}` failed with exit code {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command `{command}` could not be started: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` timed out after {timeout:?}")]
    CommandTimeout { command: String, timeout: Duration },

    #[error("Service {unit} operation `{operation}` failed: {message}")]
    Service {
        unit: String,
        operation: String,
        message: String,
    },

    #[error("Device manager did not become ready within {timeout:?}")]
    DeviceManagerNotReady { timeout: Duration },

    #[error("Configuration write failed: {}", path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SystemError {
    /// Wrap an I/O failure on `path`.
    pub fn config_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SystemError::ConfigWrite {
            path: path.into(),
            source,
        }
    }
}
