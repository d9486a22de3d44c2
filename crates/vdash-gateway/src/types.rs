//! Capacity figures reported by a host.

use serde::{Deserialize, Serialize};

/// Total capacity of a hypervisor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeCapacity {
    pub memory_bytes: u64,
    pub vcpus: u32,
}

/// Resources held by one active domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkloadUsage {
    pub memory_bytes: u64,
    pub vcpus: u32,
}

/// One domain defined on a host, running or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainInfo {
    pub name: String,
    pub memory_bytes: u64,
    pub vcpus: u32,
    pub active: bool,
}

impl DomainInfo {
    pub fn usage(&self) -> WorkloadUsage {
        WorkloadUsage {
            memory_bytes: self.memory_bytes,
            vcpus: self.vcpus,
        }
    }
}

/// Storage pool figures, in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolInfo {
    pub name: String,
    pub capacity_bytes: u64,
    pub allocation_bytes: u64,
    pub available_bytes: u64,
}
