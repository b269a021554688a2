//! Storage-boundary error model shared by every store port.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failure, independent of the backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Compare-and-swap lost against a concurrent writer.
    #[error("version conflict: {0}")]
    Conflict(String),

    /// A unique column already holds the value (column name attached).
    #[error("duplicate value for {0}")]
    Duplicate(String),

    /// Connection, query or decoding failure.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
