use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use coursegate_catalog::{CommerceEvent, PurchaseRecord};
use coursegate_core::{DomainError, DomainResult};
use coursegate_events::EventBus;
use coursegate_infra::EntitlementRuntime;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/orders/completed", post(order_completed))
        .route("/subscriptions/activated", post(subscription_activated))
}

/// Inbound webhook from the store: an order reached "completed".
///
/// Granting happens on the worker, so the response is 202.
pub async fn order_completed(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Json(body): Json<dto::OrderCompletedRequest>,
) -> axum::response::Response {
    let event = body.into_event();
    let order_id = event.order_id;
    match accept(&runtime, CommerceEvent::OrderCompleted(event)) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "order_id": order_id })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn subscription_activated(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Json(body): Json<dto::SubscriptionActivatedRequest>,
) -> axum::response::Response {
    let event = body.into_event();
    let subscription_id = event.subscription_id;
    match accept(&runtime, CommerceEvent::SubscriptionActivated(event)) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "subscription_id": subscription_id })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Mirror the purchase into the host's purchase history, then hand the event
/// to the grant worker.
fn accept(runtime: &EntitlementRuntime, event: CommerceEvent) -> DomainResult<()> {
    if let Some(user_id) = event.user_id() {
        for item in event.line_items() {
            runtime.host.record_purchase(user_id, item.product_id)?;
        }
    }

    runtime
        .commerce_bus
        .publish(event)
        .map_err(|e| DomainError::publish(e.to_string()))
}
