//! Placement handlers.
//!
//! Both endpoints return 200 whether or not a host was found; `found`
//! tells the two apart. Only an unreadable inventory is a 500.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use vdash_gateway::HypervisorGateway;
use vdash_scheduler::{
    HostInventory, PlacementDecision, SchedulerError, domain_request_from_kib,
    volume_request_from_gib,
};
use vdash_state::HostId;

use crate::ApiState;
use crate::handlers::{ApiResponse, error_response, internal_error};

/// Domain placement request body. `memory` is in KiB.
#[derive(Debug, Deserialize)]
pub struct DomainPlacementRequest {
    pub memory: u64,
    pub vcpu: u32,
    #[serde(rename = "publicIP", default)]
    pub public_ip: bool,
}

/// Volume placement request body. `size` is in GiB.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumePlacementRequest {
    pub pool_name: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementResponse {
    /// Zero when no host was found.
    pub host_id: HostId,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
}

impl From<PlacementDecision> for PlacementResponse {
    fn from(decision: PlacementDecision) -> Self {
        Self {
            host_id: decision.host_id().unwrap_or_default(),
            found: decision.is_found(),
            public_ip: None,
        }
    }
}

fn scheduler_error(e: SchedulerError) -> axum::response::Response {
    error!(error = %e, "placement failed");
    error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
}

/// POST /api/v1/placements/domain
pub async fn place_domain<I: HostInventory, G: HypervisorGateway>(
    State(state): State<ApiState<I, G>>,
    Json(req): Json<DomainPlacementRequest>,
) -> impl IntoResponse {
    if req.memory == 0 || req.vcpu == 0 {
        return error_response("memory and vcpu must be positive", StatusCode::BAD_REQUEST)
            .into_response();
    }

    let request = domain_request_from_kib(req.memory, req.vcpu, req.public_ip);
    let decision = match state.scheduler.place_domain(&request).await {
        Ok(decision) => decision,
        Err(e) => return scheduler_error(e),
    };

    let mut response = PlacementResponse::from(decision);
    if let (true, Some(host_id)) = (req.public_ip, decision.host_id()) {
        // Report the address the domain can take; claiming it is the caller's job.
        match state.store.available_public_ip_for_host(host_id) {
            Ok(record) => response.public_ip = record.map(|r| r.ip),
            Err(e) => return internal_error(e),
        }
    }

    info!(
        memory_kib = req.memory,
        vcpu = req.vcpu,
        public_ip = req.public_ip,
        host_id = response.host_id,
        found = response.found,
        "domain placement served"
    );
    ApiResponse::ok(response).into_response()
}

/// POST /api/v1/placements/volume
pub async fn place_volume<I: HostInventory, G: HypervisorGateway>(
    State(state): State<ApiState<I, G>>,
    Json(req): Json<VolumePlacementRequest>,
) -> impl IntoResponse {
    if req.pool_name.trim().is_empty() {
        return error_response("pool name is required", StatusCode::BAD_REQUEST).into_response();
    }
    if req.size == 0 {
        return error_response("size must be positive", StatusCode::BAD_REQUEST).into_response();
    }

    let request = volume_request_from_gib(&req.pool_name, req.size);
    match state.scheduler.place_volume(&request).await {
        Ok(decision) => {
            let response = PlacementResponse::from(decision);
            info!(
                pool = %req.pool_name,
                size_gib = req.size,
                host_id = response.host_id,
                found = response.found,
                "volume placement served"
            );
            ApiResponse::ok(response).into_response()
        }
        Err(e) => scheduler_error(e),
    }
}
