//! Router-level tests: requests go through `build_router` exactly as
//! the daemon serves them.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use vdash_api::{ApiState, build_router};
use vdash_gateway::{InMemoryGateway, SimulatedFault, SimulatedHost};
use vdash_scheduler::{HostInventory, PlacementScheduler, SchedulerConfig};
use vdash_state::{Host, HostId, PublicIp, StateError, StateResult, StateStore};

const GIB: u64 = 1024 * 1024 * 1024;

fn test_config() -> SchedulerConfig {
    SchedulerConfig {
        probe_timeout: Duration::from_millis(500),
        max_concurrent_probes: 4,
    }
}

fn test_store(ids: &[u64]) -> StateStore {
    let store = StateStore::open_in_memory().unwrap();
    for &id in ids {
        store.put_host(&Host::new(id, format!("10.0.0.{id}:7201"))).unwrap();
    }
    store
}

fn router(store: StateStore, gateway: InMemoryGateway) -> Router {
    build_router(ApiState::new(store, Arc::new(gateway), &test_config()))
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn host_lifecycle() {
    let router = router(test_store(&[]), InMemoryGateway::new());

    let (status, _) = send(
        &router,
        "POST",
        "/api/v1/hosts",
        Some(json!({"id": 2, "hostname": "hv-2", "gatewayAddress": "10.0.0.2:7201"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&router, "GET", "/api/v1/hosts/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["hostname"], "hv-2");

    let (status, _) = send(&router, "DELETE", "/api/v1/hosts/2", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&router, "GET", "/api/v1/hosts/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "host not found");
}

#[tokio::test]
async fn hosts_list_in_inventory_order() {
    let router = router(test_store(&[30, 4, 12]), InMemoryGateway::new());

    let (status, body) = send(&router, "GET", "/api/v1/hosts", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![4, 12, 30]);
}

#[tokio::test]
async fn public_ip_listing_shows_only_available() {
    let router = router(test_store(&[1]), InMemoryGateway::new());

    for (ip, available) in [("51.0.0.1", true), ("51.0.0.2", false)] {
        let (status, _) = send(
            &router,
            "POST",
            "/api/v1/public-ips",
            Some(json!({"ip": ip, "hostId": 1, "available": available})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(&router, "GET", "/api/v1/public-ips", None).await;
    assert_eq!(body["data"], json!([{"ip": "51.0.0.1", "hostId": 1, "available": true}]));

    let (status, _) = send(
        &router,
        "PUT",
        "/api/v1/public-ips",
        Some(json!({"ip": "51.0.0.1", "hostId": 1, "available": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&router, "GET", "/api/v1/public-ips", None).await;
    assert_eq!(body["data"], json!([]));

    let (status, _) = send(&router, "DELETE", "/api/v1/public-ips/51.0.0.2", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn domain_placement_picks_first_fitting_host() {
    let gateway = InMemoryGateway::new()
        .with_host(1, SimulatedHost::with_capacity(GIB, 8))
        .with_host(2, SimulatedHost::with_capacity(8 * GIB, 8))
        .with_host(3, SimulatedHost::with_capacity(16 * GIB, 8));
    let router = router(test_store(&[1, 2, 3]), gateway);

    // 4 GiB expressed in KiB.
    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/placements/domain",
        Some(json!({"memory": 4 * 1024 * 1024, "vcpu": 2, "publicIP": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"hostId": 2, "found": true}));
}

#[tokio::test]
async fn domain_placement_reports_public_ip() {
    let gateway = InMemoryGateway::new()
        .with_host(1, SimulatedHost::with_capacity(64 * GIB, 32))
        .with_host(2, SimulatedHost::with_capacity(8 * GIB, 8));
    let store = test_store(&[1, 2]);
    store
        .put_public_ip(&PublicIp {
            ip: "51.0.0.2".to_string(),
            host_id: 2,
            available: true,
        })
        .unwrap();
    let router = router(store, gateway);

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/placements/domain",
        Some(json!({"memory": 1024 * 1024, "vcpu": 1, "publicIP": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"hostId": 2, "found": true, "publicIp": "51.0.0.2"}));
}

#[tokio::test]
async fn no_capacity_is_not_an_error() {
    let gateway = InMemoryGateway::new()
        .with_host(1, SimulatedHost::default().fault(SimulatedFault::Unreachable))
        .with_host(2, SimulatedHost::default().fault(SimulatedFault::Unreachable));
    let router = router(test_store(&[1, 2]), gateway);

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/placements/domain",
        Some(json!({"memory": 1024, "vcpu": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!({"hostId": 0, "found": false}));
}

#[tokio::test]
async fn domain_placement_validates_body() {
    let router = router(test_store(&[1]), InMemoryGateway::new());

    let (status, _) = send(
        &router,
        "POST",
        "/api/v1/placements/domain",
        Some(json!({"memory": 0, "vcpu": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        "POST",
        "/api/v1/placements/domain",
        Some(json!({"memory": 1024, "vcpu": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn volume_placement_checks_pool_in_gib() {
    let gateway = InMemoryGateway::new()
        .with_host(1, SimulatedHost::default().pool("default", 5 * GIB - 1))
        .with_host(2, SimulatedHost::default().pool("default", 5 * GIB));
    let router = router(test_store(&[1, 2]), gateway);

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/placements/volume",
        Some(json!({"poolName": "default", "size": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"hostId": 2, "found": true}));
}

#[tokio::test]
async fn volume_placement_validates_body() {
    let router = router(test_store(&[1]), InMemoryGateway::new());

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/placements/volume",
        Some(json!({"poolName": "", "size": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "pool name is required");

    let (status, _) = send(
        &router,
        "POST",
        "/api/v1/placements/volume",
        Some(json!({"poolName": "default", "size": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn host_views_list_domains_and_pools() {
    let gateway = InMemoryGateway::new().with_host(
        1,
        SimulatedHost::with_capacity(16 * GIB, 8)
            .domain("web", 2 * GIB, 2, true)
            .domain("batch", 4 * GIB, 4, false)
            .pool("default", 20 * GIB),
    );
    let router = router(test_store(&[1]), gateway);

    let (status, body) = send(&router, "GET", "/api/v1/hosts/1/domains", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!([
            {"name": "web", "memoryBytes": 2 * GIB, "vcpus": 2, "active": true},
            {"name": "batch", "memoryBytes": 4 * GIB, "vcpus": 4, "active": false},
        ])
    );

    let (status, body) = send(&router, "GET", "/api/v1/hosts/1/pools", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "default");
    assert_eq!(body["data"][0]["availableBytes"], 20 * GIB);
}

#[tokio::test]
async fn host_views_for_unknown_host() {
    let router = router(test_store(&[]), InMemoryGateway::new());

    let (status, body) = send(&router, "GET", "/api/v1/hosts/5/domains", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "host not found");
}

#[tokio::test]
async fn host_views_report_unreachable_host() {
    let gateway = InMemoryGateway::new()
        .with_host(1, SimulatedHost::default().fault(SimulatedFault::Unreachable))
        .with_host(2, SimulatedHost::default().latency(Duration::from_secs(30)));
    let stats = gateway.stats();
    let router = router(test_store(&[1, 2]), gateway);

    let (status, body) = send(&router, "GET", "/api/v1/hosts/1/pools", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);

    let (status, _) = send(&router, "GET", "/api/v1/hosts/2/domains", None).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(stats.open(), 0);
}

/// Inventory whose every read fails.
struct BrokenInventory;

impl HostInventory for BrokenInventory {
    fn list_hosts(&self) -> StateResult<Vec<Host>> {
        Err(StateError::Read("disk unplugged".to_string()))
    }

    fn list_hosts_by_id(&self, _ids: &[HostId]) -> StateResult<Vec<Host>> {
        Err(StateError::Read("disk unplugged".to_string()))
    }

    fn host_ids_with_available_public_ip(&self) -> StateResult<Vec<HostId>> {
        Err(StateError::Read("disk unplugged".to_string()))
    }
}

#[tokio::test]
async fn unreadable_inventory_is_a_server_error() {
    let gateway = Arc::new(
        InMemoryGateway::new().with_host(1, SimulatedHost::with_capacity(64 * GIB, 32)),
    );
    let scheduler = PlacementScheduler::new(BrokenInventory, gateway, &test_config());
    let router = build_router(ApiState::with_scheduler(test_store(&[1]), scheduler));

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/placements/domain",
        Some(json!({"memory": 1024, "vcpu": 1, "publicIP": false})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());
    assert!(body["error"].as_str().unwrap().contains("host inventory unavailable"));

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/placements/volume",
        Some(json!({"poolName": "default", "size": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
}
