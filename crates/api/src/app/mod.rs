//! HTTP API application wiring (Axum router over a shared runtime).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use coursegate_infra::{AppConfig, EntitlementRuntime};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
///
/// Every route except `/health` runs behind the identity middleware. Store
/// webhooks, the link listing and the `/host` seeding routes additionally
/// require the service token; `/host` is only mounted when `dev_routes` is set.
pub fn build_app(runtime: Arc<EntitlementRuntime>, config: &AppConfig) -> Router {
    let identity = middleware::IdentityState::new(config.service_token.as_deref());

    if config.service_token.is_none() {
        tracing::warn!("SERVICE_TOKEN not set; webhooks and link editing will reject every caller");
    }

    let mut trusted = routes::trusted_router();
    if config.dev_routes {
        trusted = trusted.nest("/host", routes::host::router());
    }
    let trusted = trusted.route_layer(axum::middleware::from_fn(middleware::require_trusted));

    let api = routes::router()
        .merge(trusted)
        .layer(Extension(runtime))
        .layer(axum::middleware::from_fn_with_state(
            identity,
            middleware::identity_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(api)
        .layer(ServiceBuilder::new())
}
