//! Read-only views of the domains and pools on one host.
//!
//! Each request opens its own gateway connection under the scheduler's
//! probe timeout and drops it before responding.

use std::future::Future;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use vdash_gateway::{DomainInfo, GatewayConnection, GatewayResult, HypervisorGateway, PoolInfo};
use vdash_scheduler::HostInventory;
use vdash_state::{Host, HostId, StateStore};

use crate::ApiState;
use crate::handlers::{ApiResponse, error_response, internal_error};

/// GET /api/v1/hosts/{id}/domains
pub async fn list_domains<I: HostInventory, G: HypervisorGateway>(
    State(state): State<ApiState<I, G>>,
    Path(id): Path<HostId>,
) -> impl IntoResponse {
    let host = match find_host(&state.store, id) {
        Ok(host) => host,
        Err(resp) => return resp,
    };
    let engine = state.scheduler.engine();
    let query = fetch_domains(engine.gateway().as_ref(), &host);
    answer(&host, engine.probe_timeout(), query).await
}

/// GET /api/v1/hosts/{id}/pools
pub async fn list_pools<I: HostInventory, G: HypervisorGateway>(
    State(state): State<ApiState<I, G>>,
    Path(id): Path<HostId>,
) -> impl IntoResponse {
    let host = match find_host(&state.store, id) {
        Ok(host) => host,
        Err(resp) => return resp,
    };
    let engine = state.scheduler.engine();
    let query = fetch_pools(engine.gateway().as_ref(), &host);
    answer(&host, engine.probe_timeout(), query).await
}

fn find_host(store: &StateStore, id: HostId) -> Result<Host, Response> {
    match store.get_host(id) {
        Ok(Some(host)) => Ok(host),
        Ok(None) => Err(error_response("host not found", StatusCode::NOT_FOUND).into_response()),
        Err(e) => Err(internal_error(e)),
    }
}

async fn fetch_domains<G: HypervisorGateway>(
    gateway: &G,
    host: &Host,
) -> GatewayResult<Vec<DomainInfo>> {
    let mut conn = gateway.connect(host).await?;
    conn.list_domains().await
}

async fn fetch_pools<G: HypervisorGateway>(
    gateway: &G,
    host: &Host,
) -> GatewayResult<Vec<PoolInfo>> {
    let mut conn = gateway.connect(host).await?;
    conn.list_pools().await
}

/// 502 when the host answers with an error, 504 when it does not answer in time.
async fn answer<T, F>(host: &Host, timeout: std::time::Duration, query: F) -> Response
where
    T: serde::Serialize,
    F: Future<Output = GatewayResult<T>>,
{
    match tokio::time::timeout(timeout, query).await {
        Ok(Ok(items)) => ApiResponse::ok(items).into_response(),
        Ok(Err(e)) => {
            warn!(
                host_id = host.id,
                address = %host.gateway_address,
                error = %e,
                "host query failed"
            );
            error_response(&e.to_string(), StatusCode::BAD_GATEWAY).into_response()
        }
        Err(_) => {
            warn!(
                host_id = host.id,
                address = %host.gateway_address,
                ?timeout,
                "host query timed out"
            );
            let msg = format!("host {} did not answer within {timeout:?}", host.id);
            error_response(&msg, StatusCode::GATEWAY_TIMEOUT).into_response()
        }
    }
}
