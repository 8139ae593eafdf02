//! Error types for database selection and connectivity

use cadenza_core::{BoxError, ConfigError, ContainerError};
use std::time::Duration;

/// Result type alias for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Unsupported database backend '{driver}' (supported: {})", .supported.join(", "))]
    UnsupportedBackend {
        driver: String,
        supported: Vec<String>,
    },

    #[error("Database configuration error: {message}")]
    Configuration { message: String },

    #[error("Failed to connect with driver '{driver}': {source}")]
    Connection {
        driver: String,
        #[source]
        source: BoxError,
    },

    #[error("Connecting with driver '{driver}' timed out after {timeout:?}")]
    Timeout { driver: String, timeout: Duration },

    #[error("Database session has not been established")]
    NotConnected,

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DatabaseError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wrap a driver's connection failure
    pub fn connection(driver: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            driver: driver.into(),
            source: source.into(),
        }
    }

    pub fn is_unsupported_backend(&self) -> bool {
        matches!(self, Self::UnsupportedBackend { .. })
    }
}
