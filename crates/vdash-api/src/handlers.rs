//! REST API handlers for the inventory.
//!
//! Each handler reads/writes via `StateStore` and returns JSON responses.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::info;

use vdash_state::*;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
pub(crate) struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub(crate) fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

pub(crate) fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

pub(crate) fn internal_error(e: StateError) -> Response {
    error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
}

// ── Hosts ──────────────────────────────────────────────────────

/// GET /api/v1/hosts
pub async fn list_hosts(State(store): State<StateStore>) -> impl IntoResponse {
    match store.list_hosts() {
        Ok(hosts) => ApiResponse::ok(hosts).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/v1/hosts/{id}
pub async fn get_host(
    State(store): State<StateStore>,
    Path(id): Path<HostId>,
) -> impl IntoResponse {
    match store.get_host(id) {
        Ok(Some(host)) => ApiResponse::ok(host).into_response(),
        Ok(None) => error_response("host not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => internal_error(e),
    }
}

/// POST /api/v1/hosts
pub async fn create_host(
    State(store): State<StateStore>,
    Json(host): Json<Host>,
) -> impl IntoResponse {
    // Zero is reserved for "no host" in placement results.
    if host.id == 0 {
        return error_response("host id must be positive", StatusCode::BAD_REQUEST).into_response();
    }
    if host.gateway_address.trim().is_empty() {
        return error_response("gateway address is required", StatusCode::BAD_REQUEST)
            .into_response();
    }

    match store.put_host(&host) {
        Ok(()) => {
            info!(host_id = host.id, address = %host.gateway_address, "host registered");
            (StatusCode::CREATED, ApiResponse::ok(host)).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// DELETE /api/v1/hosts/{id}
pub async fn delete_host(
    State(store): State<StateStore>,
    Path(id): Path<HostId>,
) -> impl IntoResponse {
    match store.delete_host(id) {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => error_response("host not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => internal_error(e),
    }
}

// ── Public IPs ─────────────────────────────────────────────────

/// Body for adding or updating a public IP.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpRequest {
    pub ip: String,
    pub host_id: HostId,
    #[serde(default)]
    pub available: bool,
}

impl PublicIpRequest {
    fn validate(&self) -> Result<(), &'static str> {
        if self.ip.trim().is_empty() {
            return Err("public IP address is required");
        }
        if self.host_id == 0 {
            return Err("host id must be positive");
        }
        Ok(())
    }
}

/// A public IP may only point at a registered host.
fn require_host(store: &StateStore, host_id: HostId) -> Result<(), Response> {
    match store.get_host(host_id) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(error_response("host not found", StatusCode::NOT_FOUND).into_response()),
        Err(e) => Err(internal_error(e)),
    }
}

/// GET /api/v1/public-ips
pub async fn list_available_public_ips(State(store): State<StateStore>) -> impl IntoResponse {
    match store.list_available_public_ips() {
        Ok(ips) => ApiResponse::ok(ips).into_response(),
        Err(e) => internal_error(e),
    }
}

/// POST /api/v1/public-ips
pub async fn add_public_ip(
    State(store): State<StateStore>,
    Json(req): Json<PublicIpRequest>,
) -> impl IntoResponse {
    if let Err(msg) = req.validate() {
        return error_response(msg, StatusCode::BAD_REQUEST).into_response();
    }
    if let Err(resp) = require_host(&store, req.host_id) {
        return resp;
    }

    let record = PublicIp {
        ip: req.ip,
        host_id: req.host_id,
        available: req.available,
    };
    match store.put_public_ip(&record) {
        Ok(()) => {
            info!(
                ip = %record.ip,
                host_id = record.host_id,
                available = record.available,
                "public ip added"
            );
            (StatusCode::CREATED, ApiResponse::ok(record)).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// PUT /api/v1/public-ips
pub async fn update_public_ip(
    State(store): State<StateStore>,
    Json(req): Json<PublicIpRequest>,
) -> impl IntoResponse {
    if let Err(msg) = req.validate() {
        return error_response(msg, StatusCode::BAD_REQUEST).into_response();
    }
    if let Err(resp) = require_host(&store, req.host_id) {
        return resp;
    }

    match store.update_public_ip(&req.ip, req.host_id, req.available) {
        Ok(true) => ApiResponse::ok(PublicIp {
            ip: req.ip,
            host_id: req.host_id,
            available: req.available,
        })
        .into_response(),
        Ok(false) => error_response("public IP not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => internal_error(e),
    }
}

/// DELETE /api/v1/public-ips/{ip}
pub async fn delete_public_ip(
    State(store): State<StateStore>,
    Path(ip): Path<String>,
) -> impl IntoResponse {
    match store.delete_public_ip(&ip) {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => error_response("public IP not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => internal_error(e),
    }
}
