//! Read access to the host inventory, as the scheduler needs it.

use vdash_state::{Host, HostId, StateResult, StateStore};

/// The inventory queries a placement decision depends on.
///
/// Implementations return hosts in a stable inventory order; the
/// scheduler breaks ties by that order.
pub trait HostInventory: Send + Sync {
    fn list_hosts(&self) -> StateResult<Vec<Host>>;

    fn list_hosts_by_id(&self, ids: &[HostId]) -> StateResult<Vec<Host>>;

    fn host_ids_with_available_public_ip(&self) -> StateResult<Vec<HostId>>;
}

impl HostInventory for StateStore {
    fn list_hosts(&self) -> StateResult<Vec<Host>> {
        StateStore::list_hosts(self)
    }

    fn list_hosts_by_id(&self, ids: &[HostId]) -> StateResult<Vec<Host>> {
        StateStore::list_hosts_by_id(self, ids)
    }

    fn host_ids_with_available_public_ip(&self) -> StateResult<Vec<HostId>> {
        StateStore::host_ids_with_available_public_ip(self)
    }
}
