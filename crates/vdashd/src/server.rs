//! `vdashd serve` — wires the store, gateway, and scheduler into the API.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use vdash_api::{ApiState, build_router};
use vdash_state::StateStore;

use crate::config::VdashConfig;

pub async fn run(config: VdashConfig) -> anyhow::Result<()> {
    info!("vdash daemon starting");

    let scheduler_config = config.scheduler_config()?;
    let gateway = config.gateway()?;

    // ── State store ────────────────────────────────────────────

    std::fs::create_dir_all(&config.state.data_dir)?;
    let db_path = config.db_path();
    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, hosts = store.count_hosts()?, "state store opened");

    // ── Scheduler ──────────────────────────────────────────────

    info!(
        connect_timeout = ?gateway.connect_timeout(),
        probe_timeout = ?scheduler_config.probe_timeout,
        max_concurrent_probes = scheduler_config.max_concurrent_probes,
        "placement scheduler initialized"
    );
    let state = ApiState::new(store, Arc::new(gateway), &scheduler_config);

    // ── API server ─────────────────────────────────────────────

    let router = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("vdash daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => warn!(error = %e, "failed to listen for ctrl-c, shutting down"),
    }
}
