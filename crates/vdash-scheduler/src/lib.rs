//! vdash-scheduler — places domains and volumes on hypervisor hosts.
//!
//! Every decision is an independent pipeline with no memory of earlier
//! calls: gather candidate hosts from the inventory, probe each one's
//! live free capacity concurrently, then pick the first eligible host in
//! inventory order.
//!
//! # Architecture
//!
//! ```text
//! PlacementScheduler
//!   ├── HostInventory (candidate hosts, public-IP filter)
//!   └── CapacityProbeEngine
//!       └── one probe task per host (semaphore-gated)
//!           └── probe_host() → HypervisorGateway → ProbeOutcome
//! ```
//!
//! # Failure model
//!
//! Only an unreadable inventory fails a call ([`SchedulerError`]). A host
//! that cannot be reached, lacks the pool, or times out yields an
//! ineligible [`ProbeOutcome`] carrying a [`ProbeError`], and the decision
//! goes on without it. "No eligible host" is a normal decision.

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod probe;
pub mod request;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use convert::{domain_request_from_kib, gib_to_bytes, kib_to_bytes, volume_request_from_gib};
pub use engine::CapacityProbeEngine;
pub use error::{ProbeError, SchedulerError, SchedulerResult};
pub use inventory::HostInventory;
pub use probe::{CapacityPredicate, FreeCapacity, ProbeOutcome, free_capacity, probe_host};
pub use request::{PlacementDecision, ResourcePlacementRequest, VolumePlacementRequest};
pub use scheduler::{PlacementScheduler, select_first_eligible};
