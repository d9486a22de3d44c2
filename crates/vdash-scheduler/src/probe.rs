//! Probe unit — one capacity check against one host.
//!
//! [`probe_host`] connects through the gateway, computes free capacity,
//! and always returns a [`ProbeOutcome`]. Connection failures, missing
//! pools, query errors and timeouts all become ineligible outcomes that
//! carry the failure; nothing escapes as an error.

use std::time::Duration;

use tracing::{debug, warn};

use vdash_gateway::{
    GatewayConnection, GatewayResult, HypervisorGateway, NodeCapacity, WorkloadUsage,
};
use vdash_state::{Host, HostId};

use crate::error::ProbeError;
use crate::request::{ResourcePlacementRequest, VolumePlacementRequest};

/// What a host must have free to be eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityPredicate {
    /// Node has at least this much unreserved memory and vCPU.
    Domain { memory_bytes: u64, vcpu_count: u32 },
    /// The named pool has at least this many free bytes.
    Pool { pool_name: String, size_bytes: u64 },
}

impl From<&ResourcePlacementRequest> for CapacityPredicate {
    fn from(req: &ResourcePlacementRequest) -> Self {
        Self::Domain {
            memory_bytes: req.memory_bytes,
            vcpu_count: req.vcpu_count,
        }
    }
}

impl From<&VolumePlacementRequest> for CapacityPredicate {
    fn from(req: &VolumePlacementRequest) -> Self {
        Self::Pool {
            pool_name: req.pool_name.clone(),
            size_bytes: req.size_bytes,
        }
    }
}

/// Result of probing one host.
///
/// A failed probe is never eligible.
#[derive(Debug)]
pub struct ProbeOutcome {
    host: Host,
    eligible: bool,
    failure: Option<ProbeError>,
}

impl ProbeOutcome {
    /// The host answered; `eligible` says whether it has room.
    pub fn checked(host: Host, eligible: bool) -> Self {
        Self {
            host,
            eligible,
            failure: None,
        }
    }

    /// The host could not answer.
    pub fn failed(host: Host, failure: ProbeError) -> Self {
        Self {
            host,
            eligible: false,
            failure: Some(failure),
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn host_id(&self) -> HostId {
        self.host.id
    }

    pub fn is_eligible(&self) -> bool {
        self.eligible
    }

    pub fn failure(&self) -> Option<&ProbeError> {
        self.failure.as_ref()
    }
}

/// Unreserved capacity on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeCapacity {
    pub memory_bytes: u64,
    pub vcpus: u32,
}

impl FreeCapacity {
    pub fn satisfies(&self, memory_bytes: u64, vcpu_count: u32) -> bool {
        self.memory_bytes >= memory_bytes && self.vcpus >= vcpu_count
    }
}

/// Node total minus the sum of active domain usage, per resource.
///
/// Overcommitted nodes report zero rather than wrapping.
pub fn free_capacity(capacity: NodeCapacity, workloads: &[WorkloadUsage]) -> FreeCapacity {
    let (used_memory, used_vcpus) = workloads.iter().fold((0u64, 0u32), |(mem, cpu), w| {
        (mem.saturating_add(w.memory_bytes), cpu.saturating_add(w.vcpus))
    });
    FreeCapacity {
        memory_bytes: capacity.memory_bytes.saturating_sub(used_memory),
        vcpus: capacity.vcpus.saturating_sub(used_vcpus),
    }
}

/// Probe one host, bounded by `timeout`.
///
/// The gateway connection lives inside the timed future, so it is
/// dropped on success, on failure, and when the timeout cancels it.
pub async fn probe_host<G: HypervisorGateway>(
    gateway: &G,
    host: Host,
    predicate: &CapacityPredicate,
    timeout: Duration,
) -> ProbeOutcome {
    match tokio::time::timeout(timeout, check_host(gateway, &host, predicate)).await {
        Ok(Ok(eligible)) => ProbeOutcome::checked(host, eligible),
        Ok(Err(e)) => {
            warn!(
                host_id = host.id,
                address = %host.gateway_address,
                error = %e,
                "capacity probe failed"
            );
            ProbeOutcome::failed(host, e.into())
        }
        Err(_) => {
            warn!(
                host_id = host.id,
                address = %host.gateway_address,
                ?timeout,
                "capacity probe timed out"
            );
            ProbeOutcome::failed(host, ProbeError::Timeout(timeout))
        }
    }
}

async fn check_host<G: HypervisorGateway>(
    gateway: &G,
    host: &Host,
    predicate: &CapacityPredicate,
) -> GatewayResult<bool> {
    let mut conn = gateway.connect(host).await?;

    match predicate {
        CapacityPredicate::Domain {
            memory_bytes,
            vcpu_count,
        } => {
            let capacity = conn.node_capacity().await?;
            // A failed listing is a failed probe, not "nothing running".
            let workloads = conn.active_workloads().await?;
            let free = free_capacity(capacity, &workloads);
            let eligible = free.satisfies(*memory_bytes, *vcpu_count);
            debug!(
                host_id = host.id,
                free_memory = free.memory_bytes,
                free_vcpus = free.vcpus,
                domains = workloads.len(),
                eligible,
                "domain capacity probed"
            );
            Ok(eligible)
        }
        CapacityPredicate::Pool {
            pool_name,
            size_bytes,
        } => {
            let free = conn.pool_free_bytes(pool_name).await?;
            let eligible = free >= *size_bytes;
            debug!(
                host_id = host.id,
                pool = %pool_name,
                free_bytes = free,
                eligible,
                "pool capacity probed"
            );
            Ok(eligible)
        }
    }
}
