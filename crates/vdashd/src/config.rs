//! Daemon configuration (`vdashd.toml`).
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [state]
//! data_dir = "/var/lib/vdash"
//!
//! [scheduler]
//! probe_timeout = "5s"
//! max_concurrent_probes = 32
//!
//! [gateway]
//! connect_timeout = "2s"
//! ```
//!
//! Every section and key is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use vdash_gateway::{DEFAULT_CONNECT_TIMEOUT, HttpGateway};
use vdash_scheduler::SchedulerConfig;
use vdash_scheduler::config::{DEFAULT_MAX_CONCURRENT_PROBES, DEFAULT_PROBE_TIMEOUT};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VdashConfig {
    pub server: ServerConfig,
    pub state: StateConfig,
    pub scheduler: SchedulerSection,
    pub gateway: GatewaySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub data_dir: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/vdash"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub probe_timeout: String,
    /// 0 lifts the cap.
    pub max_concurrent_probes: usize,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            probe_timeout: format_duration(DEFAULT_PROBE_TIMEOUT),
            max_concurrent_probes: DEFAULT_MAX_CONCURRENT_PROBES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    pub connect_timeout: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            connect_timeout: format_duration(DEFAULT_CONNECT_TIMEOUT),
        }
    }
}

impl VdashConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: VdashConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise start from defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Command-line flags win over the file.
    pub fn apply_overrides(&mut self, port: Option<u16>, data_dir: Option<PathBuf>) {
        if let Some(port) = port {
            self.server.port = port;
        }
        if let Some(data_dir) = data_dir {
            self.state.data_dir = data_dir;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.scheduler_config()?;
        self.gateway()?;
        Ok(())
    }

    pub fn scheduler_config(&self) -> anyhow::Result<SchedulerConfig> {
        let probe_timeout =
            positive_duration("scheduler.probe_timeout", &self.scheduler.probe_timeout)?;
        Ok(SchedulerConfig {
            probe_timeout,
            max_concurrent_probes: self.scheduler.max_concurrent_probes,
        })
    }

    pub fn gateway(&self) -> anyhow::Result<HttpGateway> {
        let connect_timeout =
            positive_duration("gateway.connect_timeout", &self.gateway.connect_timeout)?;
        Ok(HttpGateway::new(connect_timeout))
    }

    pub fn db_path(&self) -> PathBuf {
        self.state.data_dir.join("vdash.redb")
    }
}

fn positive_duration(key: &str, value: &str) -> anyhow::Result<Duration> {
    match parse_duration(value) {
        Some(d) if !d.is_zero() => Ok(d),
        Some(_) => bail!("{key} must be greater than zero"),
        None => bail!(
            "{key}: invalid duration {value:?} (expected e.g. \"500ms\", \"5s\", \"2m\")"
        ),
    }
}

/// Inverse of [`parse_duration`] for whole-millisecond durations.
fn format_duration(d: Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

/// Parse a duration string like "5s", "500ms", "2m", or a bare number of seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
