//! Telemetry error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Invalid level or directive.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A global subscriber was already installed.
    #[error("Initialization error: {0}")]
    InitError(String),

    /// The log directory could not be created.
    #[error("cannot create log directory {path}: {source}")]
    LogDirectory {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
