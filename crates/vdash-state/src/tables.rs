//! redb table definitions for the host inventory.

use redb::TableDefinition;

/// Hosts keyed by numeric host id. Key order is inventory order.
pub const HOSTS: TableDefinition<u64, &[u8]> = TableDefinition::new("hosts");

/// Public IP assignments keyed by address.
pub const PUBLIC_IPS: TableDefinition<&str, &[u8]> = TableDefinition::new("public_ips");
