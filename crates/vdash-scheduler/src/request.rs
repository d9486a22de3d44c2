//! Placement requests and decisions.

use serde::Serialize;
use vdash_state::HostId;

/// Compute-domain placement request.
///
/// Both quantities are expected to be non-zero; the API layer rejects
/// anything else before it reaches the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePlacementRequest {
    pub memory_bytes: u64,
    pub vcpu_count: u32,
    pub requires_public_ip: bool,
}

/// Storage-volume placement request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumePlacementRequest {
    pub pool_name: String,
    pub size_bytes: u64,
}

/// Outcome of one placement call. No host is a valid answer, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDecision {
    host_id: Option<HostId>,
}

impl PlacementDecision {
    pub fn placed(host_id: HostId) -> Self {
        Self {
            host_id: Some(host_id),
        }
    }

    pub fn no_eligible_host() -> Self {
        Self { host_id: None }
    }

    pub fn host_id(&self) -> Option<HostId> {
        self.host_id
    }

    pub fn is_found(&self) -> bool {
        self.host_id.is_some()
    }
}
