//! Errors reported by the connection manager and the retry executor

use serde::{Deserialize, Serialize};
use steadydb_core::StoreError;
use thiserror::Error;

/// Failure of a manager or executor call
///
/// Operation errors are passed through unmodified in `Operation` so callers
/// can still match on the store's own classification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Every establishment attempt failed
    #[error("failed to connect after {attempts} attempts: {source}")]
    Exhausted { attempts: u32, source: StoreError },

    /// A connection was opened but the liveness probe on it failed
    #[error("connection probe failed: {source}")]
    ProbeFailed { source: StoreError },

    #[error("connection manager is not initialized")]
    NotInitialized,

    /// The execution context was cancelled or its deadline passed
    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid connection configuration: {0}")]
    InvalidConfig(StoreError),

    #[error(transparent)]
    Operation(#[from] StoreError),
}

/// Discriminant of `ConnectionError`, handy for matching and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionErrorKind {
    Exhausted,
    ProbeFailed,
    NotInitialized,
    Cancelled,
    InvalidConfig,
    Operation,
}

impl ConnectionError {
    pub fn kind(&self) -> ConnectionErrorKind {
        match self {
            ConnectionError::Exhausted { .. } => ConnectionErrorKind::Exhausted,
            ConnectionError::ProbeFailed { .. } => ConnectionErrorKind::ProbeFailed,
            ConnectionError::NotInitialized => ConnectionErrorKind::NotInitialized,
            ConnectionError::Cancelled => ConnectionErrorKind::Cancelled,
            ConnectionError::InvalidConfig(_) => ConnectionErrorKind::InvalidConfig,
            ConnectionError::Operation(_) => ConnectionErrorKind::Operation,
        }
    }

    /// The underlying store error, if there is one
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            ConnectionError::Exhausted { source, .. } | ConnectionError::ProbeFailed { source } => {
                Some(source)
            }
            ConnectionError::InvalidConfig(source) | ConnectionError::Operation(source) => {
                Some(source)
            }
            ConnectionError::NotInitialized | ConnectionError::Cancelled => None,
        }
    }
}
