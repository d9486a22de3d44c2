//! Scheduler tuning.

use std::time::Duration;

/// Default bound on one host's connect-and-query round.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of hosts probed at the same time.
pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Upper bound for connecting to one host and answering the capacity check.
    pub probe_timeout: Duration,
    /// Probes allowed to hold a host connection at once. `0` lifts the cap.
    pub max_concurrent_probes: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            max_concurrent_probes: DEFAULT_MAX_CONCURRENT_PROBES,
        }
    }
}
