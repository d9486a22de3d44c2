//! StateStore — redb-backed host inventory.
//!
//! Typed CRUD over hosts and public IPs. The store supports both on-disk
//! and in-memory backends (the latter for testing).

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StateResult<T> {
    serde_json::from_slice(bytes).map_err(map_err!(Decode))
}

/// Thread-safe inventory store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent inventory at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "inventory opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory inventory.
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory inventory opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(HOSTS).map_err(map_err!(Table))?;
        txn.open_table(PUBLIC_IPS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Hosts ──────────────────────────────────────────────────────

    /// Insert or update a host.
    pub fn put_host(&self, host: &Host) -> StateResult<()> {
        let value = serde_json::to_vec(host).map_err(map_err!(Encode))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(HOSTS).map_err(map_err!(Table))?;
            table
                .insert(host.id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(host_id = host.id, address = %host.gateway_address, "host stored");
        Ok(())
    }

    /// Get a host by id.
    pub fn get_host(&self, id: HostId) -> StateResult<Option<Host>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HOSTS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    /// List every host in inventory order (ascending id).
    pub fn list_hosts(&self) -> StateResult<Vec<Host>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HOSTS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            results.push(decode(value.value())?);
        }
        Ok(results)
    }

    /// List the hosts whose id is in `ids`, in inventory order.
    ///
    /// Unknown ids are skipped and duplicates collapse to one entry.
    pub fn list_hosts_by_id(&self, ids: &[HostId]) -> StateResult<Vec<Host>> {
        let wanted: BTreeSet<HostId> = ids.iter().copied().collect();
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HOSTS).map_err(map_err!(Table))?;
        let mut results = Vec::with_capacity(wanted.len());
        for id in wanted {
            if let Some(guard) = table.get(id).map_err(map_err!(Read))? {
                results.push(decode(guard.value())?);
            }
        }
        Ok(results)
    }

    /// Number of hosts in the inventory.
    pub fn count_hosts(&self) -> StateResult<u64> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HOSTS).map_err(map_err!(Table))?;
        table.len().map_err(map_err!(Read))
    }

    /// Delete a host by id. Returns true if it existed.
    pub fn delete_host(&self, id: HostId) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(HOSTS).map_err(map_err!(Table))?;
            existed = table.remove(id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(host_id = id, existed, "host deleted");
        Ok(existed)
    }

    // ── Public IPs ─────────────────────────────────────────────────

    /// Insert or update a public IP record.
    pub fn put_public_ip(&self, record: &PublicIp) -> StateResult<()> {
        let value = serde_json::to_vec(record).map_err(map_err!(Encode))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(PUBLIC_IPS).map_err(map_err!(Table))?;
            table
                .insert(record.ip.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            ip = %record.ip,
            host_id = record.host_id,
            available = record.available,
            "public ip stored"
        );
        Ok(())
    }

    /// Get a public IP record by address.
    pub fn get_public_ip(&self, ip: &str) -> StateResult<Option<PublicIp>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PUBLIC_IPS).map_err(map_err!(Table))?;
        match table.get(ip).map_err(map_err!(Read))? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    /// List every public IP record.
    pub fn list_public_ips(&self) -> StateResult<Vec<PublicIp>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PUBLIC_IPS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            results.push(decode(value.value())?);
        }
        Ok(results)
    }

    /// List public IPs not yet handed to a domain.
    pub fn list_available_public_ips(&self) -> StateResult<Vec<PublicIp>> {
        Ok(self
            .list_public_ips()?
            .into_iter()
            .filter(|r| r.available)
            .collect())
    }

    /// Ids of hosts holding at least one available public IP, ascending.
    pub fn host_ids_with_available_public_ip(&self) -> StateResult<Vec<HostId>> {
        let ids: BTreeSet<HostId> = self
            .list_available_public_ips()?
            .into_iter()
            .map(|r| r.host_id)
            .collect();
        Ok(ids.into_iter().collect())
    }

    /// First available public IP routed to `host_id`, if any.
    pub fn available_public_ip_for_host(&self, host_id: HostId) -> StateResult<Option<PublicIp>> {
        Ok(self
            .list_available_public_ips()?
            .into_iter()
            .find(|r| r.host_id == host_id))
    }

    /// Reassign an existing public IP. Returns false if the address is unknown.
    pub fn update_public_ip(
        &self,
        ip: &str,
        host_id: HostId,
        available: bool,
    ) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let updated;
        {
            let mut table = txn.open_table(PUBLIC_IPS).map_err(map_err!(Table))?;
            let current: Option<PublicIp> = match table.get(ip).map_err(map_err!(Read))? {
                Some(guard) => Some(decode(guard.value())?),
                None => None,
            };
            updated = match current {
                Some(mut record) => {
                    record.host_id = host_id;
                    record.available = available;
                    let value = serde_json::to_vec(&record).map_err(map_err!(Encode))?;
                    table
                        .insert(ip, value.as_slice())
                        .map_err(map_err!(Write))?;
                    true
                }
                None => false,
            };
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%ip, host_id, available, updated, "public ip updated");
        Ok(updated)
    }

    /// Delete a public IP by address. Returns true if it existed.
    pub fn delete_public_ip(&self, ip: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(PUBLIC_IPS).map_err(map_err!(Table))?;
            existed = table.remove(ip).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_host(id: HostId) -> Host {
        Host {
            id,
            hostname: format!("hv-{id}"),
            gateway_address: format!("10.0.0.{id}:7201"),
            public_ip: Some(format!("51.15.0.{id}")),
        }
    }

    fn test_ip(ip: &str, host_id: HostId, available: bool) -> PublicIp {
        PublicIp {
            ip: ip.to_string(),
            host_id,
            available,
        }
    }

    // ── Host CRUD ──────────────────────────────────────────────────

    #[test]
    fn host_put_and_get() {
        let store = StateStore::open_in_memory().unwrap();
        let host = test_host(1);

        store.put_host(&host).unwrap();
        assert_eq!(store.get_host(1).unwrap(), Some(host));
        assert!(store.get_host(2).unwrap().is_none());
    }

    #[test]
    fn hosts_list_in_ascending_id_order() {
        let store = StateStore::open_in_memory().unwrap();
        // Inserted out of order, and 10 would sort before 2 as a string.
        for id in [10, 2, 7, 1] {
            store.put_host(&test_host(id)).unwrap();
        }

        let ids: Vec<HostId> = store.list_hosts().unwrap().iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1, 2, 7, 10]);
        assert_eq!(store.count_hosts().unwrap(), 4);
    }

    #[test]
    fn hosts_by_id_keeps_inventory_order_and_skips_unknown() {
        let store = StateStore::open_in_memory().unwrap();
        for id in 1..=5 {
            store.put_host(&test_host(id)).unwrap();
        }

        let hosts = store.list_hosts_by_id(&[4, 2, 99, 4]).unwrap();
        let ids: Vec<HostId> = hosts.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn hosts_by_empty_id_set_is_empty() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_host(&test_host(1)).unwrap();
        assert!(store.list_hosts_by_id(&[]).unwrap().is_empty());
    }

    #[test]
    fn host_update_in_place() {
        let store = StateStore::open_in_memory().unwrap();
        let mut host = test_host(3);
        store.put_host(&host).unwrap();

        host.gateway_address = "10.1.1.1:7201".to_string();
        store.put_host(&host).unwrap();

        let stored = store.get_host(3).unwrap().unwrap();
        assert_eq!(stored.gateway_address, "10.1.1.1:7201");
        assert_eq!(store.count_hosts().unwrap(), 1);
    }

    #[test]
    fn host_delete() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_host(&test_host(1)).unwrap();

        assert!(store.delete_host(1).unwrap());
        assert!(!store.delete_host(1).unwrap());
        assert!(store.get_host(1).unwrap().is_none());
    }

    // ── Public IPs ─────────────────────────────────────────────────

    #[test]
    fn available_ips_filter_out_assigned() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_public_ip(&test_ip("51.0.0.1", 1, true)).unwrap();
        store.put_public_ip(&test_ip("51.0.0.2", 2, false)).unwrap();
        store.put_public_ip(&test_ip("51.0.0.3", 3, true)).unwrap();

        let available = store.list_available_public_ips().unwrap();
        assert_eq!(available.len(), 2);
        assert!(available.iter().all(|r| r.available));
        assert_eq!(store.list_public_ips().unwrap().len(), 3);
    }

    #[test]
    fn host_ids_with_available_ip_are_deduped() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_public_ip(&test_ip("51.0.0.1", 3, true)).unwrap();
        store.put_public_ip(&test_ip("51.0.0.2", 3, true)).unwrap();
        store.put_public_ip(&test_ip("51.0.0.3", 1, true)).unwrap();
        store.put_public_ip(&test_ip("51.0.0.4", 2, false)).unwrap();

        assert_eq!(store.host_ids_with_available_public_ip().unwrap(), vec![1, 3]);
    }

    #[test]
    fn available_ip_for_host() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_public_ip(&test_ip("51.0.0.1", 1, false)).unwrap();
        store.put_public_ip(&test_ip("51.0.0.2", 1, true)).unwrap();

        let ip = store.available_public_ip_for_host(1).unwrap().unwrap();
        assert_eq!(ip.ip, "51.0.0.2");
        assert!(store.available_public_ip_for_host(2).unwrap().is_none());
    }

    #[test]
    fn update_public_ip_reassigns() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_public_ip(&test_ip("51.0.0.1", 1, true)).unwrap();

        assert!(store.update_public_ip("51.0.0.1", 4, false).unwrap());
        let record = store.get_public_ip("51.0.0.1").unwrap().unwrap();
        assert_eq!(record.host_id, 4);
        assert!(!record.available);

        assert!(!store.update_public_ip("51.0.0.9", 4, true).unwrap());
        assert!(store.get_public_ip("51.0.0.9").unwrap().is_none());
    }

    #[test]
    fn delete_public_ip() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_public_ip(&test_ip("51.0.0.1", 1, true)).unwrap();

        assert!(store.delete_public_ip("51.0.0.1").unwrap());
        assert!(!store.delete_public_ip("51.0.0.1").unwrap());
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("inventory.redb");

        {
            let store = StateStore::open(&db_path).unwrap();
            store.put_host(&test_host(1)).unwrap();
            store.put_public_ip(&test_ip("51.0.0.1", 1, true)).unwrap();
        }

        let store = StateStore::open(&db_path).unwrap();
        assert_eq!(store.get_host(1).unwrap(), Some(test_host(1)));
        assert_eq!(store.host_ids_with_available_public_ip().unwrap(), vec![1]);
    }

    #[test]
    fn empty_store_operations() {
        let store = StateStore::open_in_memory().unwrap();

        assert!(store.list_hosts().unwrap().is_empty());
        assert!(store.list_public_ips().unwrap().is_empty());
        assert!(store.host_ids_with_available_public_ip().unwrap().is_empty());
        assert_eq!(store.count_hosts().unwrap(), 0);
        assert!(!store.delete_host(1).unwrap());
        assert!(!store.delete_public_ip("nope").unwrap());
    }

    #[test]
    fn host_json_uses_camel_case() {
        let json = serde_json::to_value(test_host(1)).unwrap();
        assert_eq!(json["gatewayAddress"], "10.0.0.1:7201");
        assert_eq!(json["publicIp"], "51.15.0.1");

        let host: Host = serde_json::from_str(r#"{"id":9,"gatewayAddress":"h:1"}"#).unwrap();
        assert_eq!(host, Host::new(9, "h:1"));
    }
}
