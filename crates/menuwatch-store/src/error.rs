//! Error types for the persistent stores.

use thiserror::Error;

/// Errors raised while reading or writing a store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document is not valid JSON for its type
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Referenced entry does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Input rejected before it reached disk
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;
