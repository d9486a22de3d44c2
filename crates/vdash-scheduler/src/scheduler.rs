//! Placement scheduler — candidate selection and host choice.
//!
//! Each call runs gather → probe → select and keeps nothing afterwards.
//! Selection is a linear scan over the candidates in inventory order:
//! the first host whose probe came back eligible wins, no matter which
//! probe finished first.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use vdash_gateway::HypervisorGateway;
use vdash_state::{Host, HostId};

use crate::config::SchedulerConfig;
use crate::engine::CapacityProbeEngine;
use crate::error::SchedulerResult;
use crate::inventory::HostInventory;
use crate::probe::{CapacityPredicate, ProbeOutcome};
use crate::request::{PlacementDecision, ResourcePlacementRequest, VolumePlacementRequest};

pub struct PlacementScheduler<I, G> {
    inventory: I,
    engine: CapacityProbeEngine<G>,
}

impl<I: HostInventory, G: HypervisorGateway> PlacementScheduler<I, G> {
    pub fn new(inventory: I, gateway: Arc<G>, config: &SchedulerConfig) -> Self {
        Self {
            inventory,
            engine: CapacityProbeEngine::new(gateway, config),
        }
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    pub fn engine(&self) -> &CapacityProbeEngine<G> {
        &self.engine
    }

    /// Choose a host for a new compute domain.
    ///
    /// With `requires_public_ip`, only hosts that currently hold an
    /// available public IP are candidates.
    pub async fn place_domain(
        &self,
        request: &ResourcePlacementRequest,
    ) -> SchedulerResult<PlacementDecision> {
        let candidates = if request.requires_public_ip {
            let ids = self.inventory.host_ids_with_available_public_ip()?;
            if ids.is_empty() {
                info!("no host holds an available public IP");
                return Ok(PlacementDecision::no_eligible_host());
            }
            self.inventory.list_hosts_by_id(&ids)?
        } else {
            self.inventory.list_hosts()?
        };

        debug!(
            memory_bytes = request.memory_bytes,
            vcpus = request.vcpu_count,
            public_ip = request.requires_public_ip,
            candidates = candidates.len(),
            "placing domain"
        );
        let decision = self
            .decide(&candidates, &CapacityPredicate::from(request))
            .await;
        info!(host_id = ?decision.host_id(), "domain placement decided");
        Ok(decision)
    }

    /// Choose a host whose named pool can hold a new volume.
    pub async fn place_volume(
        &self,
        request: &VolumePlacementRequest,
    ) -> SchedulerResult<PlacementDecision> {
        let candidates = self.inventory.list_hosts()?;

        debug!(
            pool = %request.pool_name,
            size_bytes = request.size_bytes,
            candidates = candidates.len(),
            "placing volume"
        );
        let decision = self
            .decide(&candidates, &CapacityPredicate::from(request))
            .await;
        info!(pool = %request.pool_name, host_id = ?decision.host_id(), "volume placement decided");
        Ok(decision)
    }

    async fn decide(
        &self,
        candidates: &[Host],
        predicate: &CapacityPredicate,
    ) -> PlacementDecision {
        if candidates.is_empty() {
            return PlacementDecision::no_eligible_host();
        }
        let outcomes = self.engine.probe_all(candidates, predicate).await;
        select_first_eligible(candidates, &outcomes)
    }
}

/// First candidate, in the given order, with an eligible outcome.
pub fn select_first_eligible(candidates: &[Host], outcomes: &[ProbeOutcome]) -> PlacementDecision {
    let eligible: HashSet<HostId> = outcomes
        .iter()
        .filter(|o| o.is_eligible())
        .map(|o| o.host_id())
        .collect();

    candidates
        .iter()
        .find(|h| eligible.contains(&h.id))
        .map(|h| PlacementDecision::placed(h.id))
        .unwrap_or_default()
}
