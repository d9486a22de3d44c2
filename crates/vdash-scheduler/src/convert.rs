//! Unit conversions from API quantities to byte counts.
//!
//! Domain memory arrives in KiB, volume sizes in whole GiB. Conversions
//! saturate: an absurd request becomes one no host can satisfy.

use crate::request::{ResourcePlacementRequest, VolumePlacementRequest};

const KIB: u64 = 1024;
const GIB: u64 = 1024 * 1024 * 1024;

pub fn kib_to_bytes(kib: u64) -> u64 {
    kib.saturating_mul(KIB)
}

pub fn gib_to_bytes(gib: u64) -> u64 {
    gib.saturating_mul(GIB)
}

/// Build a domain request from the API's KiB memory figure.
pub fn domain_request_from_kib(
    memory_kib: u64,
    vcpu_count: u32,
    requires_public_ip: bool,
) -> ResourcePlacementRequest {
    ResourcePlacementRequest {
        memory_bytes: kib_to_bytes(memory_kib),
        vcpu_count,
        requires_public_ip,
    }
}

/// Build a volume request from the API's GiB size figure.
pub fn volume_request_from_gib(pool_name: &str, size_gib: u64) -> VolumePlacementRequest {
    VolumePlacementRequest {
        pool_name: pool_name.to_string(),
        size_bytes: gib_to_bytes(size_gib),
    }
}
