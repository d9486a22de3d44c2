//! In-memory gateway — a simulated fleet for tests.
//!
//! Each simulated host carries its capacity, domains, pools,
//! an optional injected fault, and an artificial connect latency.
//! [`ConnectionStats`] counts connections so callers can verify that
//! every connection is released and that fan-out stays within bounds.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use vdash_state::{Host, HostId};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{GatewayConnection, HypervisorGateway};
use crate::types::{DomainInfo, NodeCapacity, PoolInfo, WorkloadUsage};

/// Failure injected into a simulated host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedFault {
    /// Connecting fails (after the configured latency).
    Unreachable,
    /// `node_capacity` fails.
    CapacityQuery,
    /// `active_workloads` and `list_domains` fail.
    WorkloadQuery,
    /// `pool_free_bytes` and `list_pools` fail.
    PoolQuery,
}

/// Behaviour of one simulated host.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHost {
    pub capacity: NodeCapacity,
    pub domains: Vec<DomainInfo>,
    pub pools: BTreeMap<String, PoolInfo>,
    pub fault: Option<SimulatedFault>,
    /// Delay before the connection is established.
    pub latency: Duration,
}

impl SimulatedHost {
    pub fn with_capacity(memory_bytes: u64, vcpus: u32) -> Self {
        Self {
            capacity: NodeCapacity { memory_bytes, vcpus },
            ..Self::default()
        }
    }

    /// Add a running domain with a generated name.
    pub fn workload(self, memory_bytes: u64, vcpus: u32) -> Self {
        let name = format!("domain-{}", self.domains.len());
        self.domain(&name, memory_bytes, vcpus, true)
    }

    pub fn domain(mut self, name: &str, memory_bytes: u64, vcpus: u32, active: bool) -> Self {
        self.domains.push(DomainInfo {
            name: name.to_string(),
            memory_bytes,
            vcpus,
            active,
        });
        self
    }

    /// Add an empty pool with `free_bytes` available.
    pub fn pool(mut self, name: &str, free_bytes: u64) -> Self {
        self.pools.insert(
            name.to_string(),
            PoolInfo {
                name: name.to_string(),
                capacity_bytes: free_bytes,
                allocation_bytes: 0,
                available_bytes: free_bytes,
            },
        );
        self
    }

    pub fn fault(mut self, fault: SimulatedFault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

/// Connection counters shared by a gateway and its connections.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    opened: AtomicUsize,
    open: AtomicUsize,
    peak: AtomicUsize,
}

impl ConnectionStats {
    /// Connections ever attempted.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Connections currently held (including ones still connecting).
    pub fn open(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Highest number of connections held at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn acquire(&self) {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn release(&self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Gateway over a simulated fleet keyed by host id.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    hosts: HashMap<HostId, SimulatedHost>,
    stats: Arc<ConnectionStats>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, id: HostId, host: SimulatedHost) -> Self {
        self.insert_host(id, host);
        self
    }

    pub fn insert_host(&mut self, id: HostId, host: SimulatedHost) {
        self.hosts.insert(id, host);
    }

    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }
}

impl HypervisorGateway for InMemoryGateway {
    type Connection = SimulatedConnection;

    async fn connect(&self, host: &Host) -> GatewayResult<SimulatedConnection> {
        let Some(sim) = self.hosts.get(&host.id).cloned() else {
            return Err(GatewayError::Connect {
                address: host.gateway_address.clone(),
                reason: "host is not part of the simulated fleet".to_string(),
            });
        };

        // Held while connecting so the latency window counts as open.
        let conn = SimulatedConnection::new(sim, Arc::clone(&self.stats));
        if !conn.host.latency.is_zero() {
            tokio::time::sleep(conn.host.latency).await;
        }
        if conn.host.fault == Some(SimulatedFault::Unreachable) {
            return Err(GatewayError::Connect {
                address: host.gateway_address.clone(),
                reason: "simulated host unreachable".to_string(),
            });
        }
        Ok(conn)
    }
}

/// Connection to a simulated host. Released on drop.
#[derive(Debug)]
pub struct SimulatedConnection {
    host: SimulatedHost,
    stats: Arc<ConnectionStats>,
}

impl SimulatedConnection {
    fn new(host: SimulatedHost, stats: Arc<ConnectionStats>) -> Self {
        stats.acquire();
        Self { host, stats }
    }

    fn check(&self, fault: SimulatedFault, what: &str) -> GatewayResult<()> {
        if self.host.fault == Some(fault) {
            Err(GatewayError::Query(format!("simulated {what} failure")))
        } else {
            Ok(())
        }
    }
}

impl Drop for SimulatedConnection {
    fn drop(&mut self) {
        self.stats.release();
    }
}

impl GatewayConnection for SimulatedConnection {
    async fn node_capacity(&mut self) -> GatewayResult<NodeCapacity> {
        self.check(SimulatedFault::CapacityQuery, "node capacity")?;
        Ok(self.host.capacity)
    }

    async fn active_workloads(&mut self) -> GatewayResult<Vec<WorkloadUsage>> {
        self.check(SimulatedFault::WorkloadQuery, "workload listing")?;
        Ok(self
            .host
            .domains
            .iter()
            .filter(|d| d.active)
            .map(DomainInfo::usage)
            .collect())
    }

    async fn pool_free_bytes(&mut self, pool: &str) -> GatewayResult<u64> {
        self.check(SimulatedFault::PoolQuery, "pool lookup")?;
        self.host
            .pools
            .get(pool)
            .map(|p| p.available_bytes)
            .ok_or_else(|| GatewayError::PoolNotFound(pool.to_string()))
    }

    async fn list_domains(&mut self) -> GatewayResult<Vec<DomainInfo>> {
        self.check(SimulatedFault::WorkloadQuery, "domain listing")?;
        Ok(self.host.domains.clone())
    }

    async fn list_pools(&mut self) -> GatewayResult<Vec<PoolInfo>> {
        self.check(SimulatedFault::PoolQuery, "pool listing")?;
        Ok(self.host.pools.values().cloned().collect())
    }
}
