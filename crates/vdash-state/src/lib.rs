//! vdash-state — host inventory for vdash.
//!
//! Backed by [redb](https://docs.rs/redb), holds the hypervisor hosts the
//! scheduler may place workloads on and the public IPs assigned to them.
//!
//! # Architecture
//!
//! Values are JSON-serialized into redb's `&[u8]` value columns. Hosts are
//! keyed by their numeric id, so iteration order is ascending id and is the
//! "inventory order" the scheduler breaks ties with. Public IPs are keyed
//! by their address.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
