//! Scheduler error types.

use std::time::Duration;

use thiserror::Error;
use vdash_gateway::GatewayError;
use vdash_state::StateError;

/// Errors that fail a whole placement call.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("host inventory unavailable: {0}")]
    Inventory(#[from] StateError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Why a single host's probe produced no capacity answer.
///
/// Absorbed into an ineligible outcome, never returned from a placement call.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("probe task ended abnormally: {0}")]
    Aborted(String),
}
