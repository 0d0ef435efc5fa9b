//! Error types for store operations

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a store error.
///
/// Drivers decide the category when they translate their native errors, so
/// callers never have to inspect messages to know whether a retry can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The transport failed: refused, reset, closed or timed out
    TransientNetwork,
    /// A data-integrity rule rejected the operation (unique, foreign key, ...)
    Integrity,
    /// The requested entity does not exist
    NotFound,
    /// The input was malformed or of the wrong type
    InvalidInput,
    /// Anything else; retrying will not change the outcome
    Permanent,
}

impl ErrorCategory {
    /// Only transport failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::TransientNetwork)
    }
}

/// Error produced by a connection, a driver, or an operation against the store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// The category this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            StoreError::Connection(_) | StoreError::Timeout(_) => ErrorCategory::TransientNetwork,
            StoreError::Constraint(_) => ErrorCategory::Integrity,
            StoreError::NotFound(_) => ErrorCategory::NotFound,
            StoreError::InvalidInput(_) => ErrorCategory::InvalidInput,
            StoreError::Authentication(_)
            | StoreError::Query(_)
            | StoreError::Driver(_)
            | StoreError::Configuration(_)
            | StoreError::Other(_) => ErrorCategory::Permanent,
        }
    }

    /// Whether the operation that produced this error may succeed on a fresh connection
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => StoreError::Timeout(err.to_string()),
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
            | ErrorKind::AddrNotAvailable => StoreError::Connection(err.to_string()),
            _ => StoreError::Other(err.to_string()),
        }
    }
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
