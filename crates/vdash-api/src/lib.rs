//! vdash-api — REST API for vdash.
//!
//! Provides axum route handlers for the host inventory, the public IP
//! pool, read-only views of each host's domains and pools, and placement
//! decisions.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/hosts` | List hosts in inventory order |
//! | POST | `/api/v1/hosts` | Register a host |
//! | GET | `/api/v1/hosts/{id}` | Get host details |
//! | DELETE | `/api/v1/hosts/{id}` | Remove a host |
//! | GET | `/api/v1/hosts/{id}/domains` | List domains defined on a host |
//! | GET | `/api/v1/hosts/{id}/pools` | List storage pools on a host |
//! | GET | `/api/v1/public-ips` | List available public IPs |
//! | POST | `/api/v1/public-ips` | Add a public IP |
//! | PUT | `/api/v1/public-ips` | Update a public IP |
//! | DELETE | `/api/v1/public-ips/{ip}` | Remove a public IP |
//! | POST | `/api/v1/placements/domain` | Choose a host for a domain |
//! | POST | `/api/v1/placements/volume` | Choose a host for a volume |

pub mod handlers;
pub mod placement_handlers;
pub mod resource_handlers;

use std::sync::Arc;

use axum::Router;
use axum::extract::FromRef;
use axum::routing::{delete, get, post};
use vdash_gateway::HypervisorGateway;
use vdash_scheduler::{HostInventory, PlacementScheduler, SchedulerConfig};
use vdash_state::StateStore;

/// Shared state for API handlers.
///
/// Inventory handlers write to `store`; the scheduler reads hosts through
/// its own `HostInventory`, which is normally the same store.
pub struct ApiState<I, G> {
    pub store: StateStore,
    pub scheduler: Arc<PlacementScheduler<I, G>>,
}

impl<G: HypervisorGateway> ApiState<StateStore, G> {
    pub fn new(store: StateStore, gateway: Arc<G>, config: &SchedulerConfig) -> Self {
        let scheduler = PlacementScheduler::new(store.clone(), gateway, config);
        Self::with_scheduler(store, scheduler)
    }
}

impl<I, G> ApiState<I, G> {
    pub fn with_scheduler(store: StateStore, scheduler: PlacementScheduler<I, G>) -> Self {
        Self {
            store,
            scheduler: Arc::new(scheduler),
        }
    }
}

impl<I, G> Clone for ApiState<I, G> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

impl<I, G> FromRef<ApiState<I, G>> for StateStore {
    fn from_ref(state: &ApiState<I, G>) -> Self {
        state.store.clone()
    }
}

/// Build the complete API router.
pub fn build_router<I, G>(state: ApiState<I, G>) -> Router
where
    I: HostInventory + 'static,
    G: HypervisorGateway,
{
    let api_routes = Router::new()
        .route("/hosts", get(handlers::list_hosts).post(handlers::create_host))
        .route("/hosts/{id}", get(handlers::get_host).delete(handlers::delete_host))
        .route("/hosts/{id}/domains", get(resource_handlers::list_domains::<I, G>))
        .route("/hosts/{id}/pools", get(resource_handlers::list_pools::<I, G>))
        .route(
            "/public-ips",
            get(handlers::list_available_public_ips)
                .post(handlers::add_public_ip)
                .put(handlers::update_public_ip),
        )
        .route("/public-ips/{ip}", delete(handlers::delete_public_ip))
        .route("/placements/domain", post(placement_handlers::place_domain::<I, G>))
        .route("/placements/volume", post(placement_handlers::place_volume::<I, G>))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}
