//! vdash-gateway — control-plane access to individual hypervisor hosts.
//!
//! The scheduler never talks to a host directly. It goes through a
//! [`HypervisorGateway`], which opens one scoped [`GatewayConnection`] per
//! host and answers three capacity questions on it:
//!
//! - total node capacity (memory bytes, vCPUs)
//! - resource usage of every active domain
//! - free bytes of a named storage pool
//!
//! It also lists every domain and pool on a host for read-only views.
//!
//! # Implementations
//!
//! ```text
//! HypervisorGateway
//!   ├── HttpGateway      one HTTP/1.1 connection to the host agent per probe
//!   └── InMemoryGateway  simulated fleet with injectable faults and latency
//! ```
//!
//! A connection is released when it is dropped. Callers that wrap queries
//! in a timeout get release on cancellation for free.

pub mod agent;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod types;

pub use agent::{DEFAULT_CONNECT_TIMEOUT, HttpConnection, HttpGateway};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{GatewayConnection, HypervisorGateway};
pub use memory::{
    ConnectionStats, InMemoryGateway, SimulatedConnection, SimulatedFault, SimulatedHost,
};
pub use types::{DomainInfo, NodeCapacity, PoolInfo, WorkloadUsage};
