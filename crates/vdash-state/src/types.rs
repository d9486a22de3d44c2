//! Inventory records.

use serde::{Deserialize, Serialize};

/// Numeric identifier of a hypervisor host.
pub type HostId = u64;

// ── Host ──────────────────────────────────────────────────────────

/// A hypervisor-managed machine that can run domains and owns storage pools.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    pub id: HostId,
    #[serde(default)]
    pub hostname: String,
    /// Control-plane address of the host agent (`host:port`).
    pub gateway_address: String,
    /// Primary public IP of the machine itself, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
}

impl Host {
    pub fn new(id: HostId, gateway_address: impl Into<String>) -> Self {
        Self {
            id,
            hostname: String::new(),
            gateway_address: gateway_address.into(),
            public_ip: None,
        }
    }
}

// ── Public IP ─────────────────────────────────────────────────────

/// A public IP routed to a host, assignable to one domain on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicIp {
    pub ip: String,
    pub host_id: HostId,
    /// Whether the address is still free for a new domain.
    pub available: bool,
}
