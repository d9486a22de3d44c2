//! Gateway error types.

use thiserror::Error;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors raised while connecting to or querying a single host.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error("request {path} failed: {reason}")]
    Request { path: String, reason: String },

    #[error("request {path} returned status {status}")]
    Status { path: String, status: u16 },

    #[error("failed to decode {path} response: {reason}")]
    Decode { path: String, reason: String },

    #[error("storage pool not found: {0}")]
    PoolNotFound(String),

    #[error("invalid storage pool name: {0:?}")]
    InvalidPoolName(String),

    #[error("host query failed: {0}")]
    Query(String),
}
