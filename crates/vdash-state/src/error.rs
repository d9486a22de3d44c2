//! Error types for the host inventory.

use thiserror::Error;

/// Result type alias for inventory operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors raised while reading or writing the inventory.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open inventory database: {0}")]
    Open(String),

    #[error("inventory transaction failed: {0}")]
    Transaction(String),

    #[error("inventory table unavailable: {0}")]
    Table(String),

    #[error("inventory read failed: {0}")]
    Read(String),

    #[error("inventory write failed: {0}")]
    Write(String),

    #[error("failed to encode record: {0}")]
    Encode(String),

    #[error("corrupt inventory record: {0}")]
    Decode(String),
}
