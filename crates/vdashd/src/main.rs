//! vdashd — the vdash daemon.
//!
//! Single binary that assembles:
//! - Host inventory (redb)
//! - Hypervisor gateway (HTTP agent per host)
//! - Placement scheduler
//! - REST API
//!
//! # Usage
//!
//! ```text
//! vdashd serve --config /etc/vdash/vdashd.toml --port 8080
//! vdashd check-config --config /etc/vdash/vdashd.toml
//! ```

mod config;
mod server;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::VdashConfig;

#[derive(Parser)]
#[command(name = "vdashd", about = "vdash placement daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the REST API.
    Serve {
        /// Path to vdashd.toml. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides `[server] port`).
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for persistent state (overrides `[state] data_dir`).
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Parse and validate a config file, then exit.
    CheckConfig {
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,vdashd=debug,vdash=debug")
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            port,
            data_dir,
        } => {
            let mut config = VdashConfig::load(config.as_deref())?;
            config.apply_overrides(port, data_dir);
            server::run(config).await
        }
        Command::CheckConfig { config: path } => {
            let config = VdashConfig::from_file(&path)?;
            let scheduler = config.scheduler_config()?;
            info!(
                path = %path.display(),
                port = config.server.port,
                data_dir = %config.state.data_dir.display(),
                probe_timeout = ?scheduler.probe_timeout,
                max_concurrent_probes = scheduler.max_concurrent_probes,
                "config ok"
            );
            Ok(())
        }
    }
}
