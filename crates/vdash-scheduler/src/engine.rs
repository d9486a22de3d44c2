//! Capacity probe engine — fans a check out across many hosts.
//!
//! One task is spawned per host, all at once, and the engine waits for
//! every one of them before returning. A semaphore caps how many probes
//! hold a host connection at the same time; tasks beyond the cap queue on
//! it instead of being dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use vdash_gateway::HypervisorGateway;
use vdash_state::Host;

use crate::config::SchedulerConfig;
use crate::error::ProbeError;
use crate::probe::{CapacityPredicate, ProbeOutcome, probe_host};

pub struct CapacityProbeEngine<G> {
    gateway: Arc<G>,
    probe_timeout: Duration,
    /// `None` when the fan-out is uncapped.
    limiter: Option<Arc<Semaphore>>,
}

impl<G: HypervisorGateway> CapacityProbeEngine<G> {
    pub fn new(gateway: Arc<G>, config: &SchedulerConfig) -> Self {
        let limiter = (config.max_concurrent_probes > 0)
            .then(|| Arc::new(Semaphore::new(config.max_concurrent_probes)));
        Self {
            gateway,
            probe_timeout: config.probe_timeout,
            limiter,
        }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Probe every host and return one outcome per host, in input order.
    ///
    /// Never fails: unreachable or broken hosts come back as failed
    /// outcomes, and an empty host list yields an empty result.
    pub async fn probe_all(
        &self,
        hosts: &[Host],
        predicate: &CapacityPredicate,
    ) -> Vec<ProbeOutcome> {
        if hosts.is_empty() {
            return Vec::new();
        }

        let predicate = Arc::new(predicate.clone());
        let mut tasks = JoinSet::new();

        for (index, host) in hosts.iter().cloned().enumerate() {
            let gateway = Arc::clone(&self.gateway);
            let predicate = Arc::clone(&predicate);
            let limiter = self.limiter.clone();
            let timeout = self.probe_timeout;

            tasks.spawn(async move {
                // The permit is held for the whole probe and dropped with the task.
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                (index, probe_host(gateway.as_ref(), host, &predicate, timeout).await)
            });
        }

        let mut slots: Vec<Option<ProbeOutcome>> = hosts.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => warn!(error = %e, "capacity probe task ended abnormally"),
            }
        }

        let outcomes: Vec<ProbeOutcome> = slots
            .into_iter()
            .zip(hosts)
            .map(|(slot, host)| {
                slot.unwrap_or_else(|| {
                    ProbeOutcome::failed(
                        host.clone(),
                        ProbeError::Aborted("probe task did not report".to_string()),
                    )
                })
            })
            .collect();

        debug!(
            hosts = outcomes.len(),
            eligible = outcomes.iter().filter(|o| o.is_eligible()).count(),
            failed = outcomes.iter().filter(|o| o.failure().is_some()).count(),
            "capacity probe round complete"
        );
        outcomes
    }
}
