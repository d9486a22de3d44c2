//! Gateway traits — injected into the scheduler for testability.

use std::future::Future;

use vdash_state::Host;

use crate::error::GatewayResult;
use crate::types::{DomainInfo, NodeCapacity, PoolInfo, WorkloadUsage};

/// Opens control-plane connections to hosts.
pub trait HypervisorGateway: Send + Sync + 'static {
    type Connection: GatewayConnection;

    /// Establish a connection to one host. Dropping it releases the host.
    fn connect(&self, host: &Host)
    -> impl Future<Output = GatewayResult<Self::Connection>> + Send;
}

/// An open connection to a single host's control plane.
pub trait GatewayConnection: Send {
    /// Total memory and vCPUs of the node.
    fn node_capacity(&mut self) -> impl Future<Output = GatewayResult<NodeCapacity>> + Send;

    /// Usage of every active domain on the node.
    fn active_workloads(&mut self)
    -> impl Future<Output = GatewayResult<Vec<WorkloadUsage>>> + Send;

    /// Free bytes of the named storage pool.
    ///
    /// A host without the pool answers `GatewayError::PoolNotFound`.
    fn pool_free_bytes(&mut self, pool: &str) -> impl Future<Output = GatewayResult<u64>> + Send;

    /// Every domain defined on the node, inactive ones included.
    fn list_domains(&mut self) -> impl Future<Output = GatewayResult<Vec<DomainInfo>>> + Send;

    /// Every storage pool on the node, sorted by name.
    fn list_pools(&mut self) -> impl Future<Output = GatewayResult<Vec<PoolInfo>>> + Send;
}
