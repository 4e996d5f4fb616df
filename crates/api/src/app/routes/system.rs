use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use coursegate_entitlements::EntitlementStore;
use coursegate_infra::EntitlementRuntime;

use crate::app::errors;
use crate::context::Viewer;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(viewer): Extension<Viewer>) -> impl IntoResponse {
    Json(serde_json::json!({
        "user_id": viewer.user_id(),
        "authenticated": viewer.user_id().is_some(),
        "trusted": viewer.is_trusted(),
    }))
}

pub async fn links(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
) -> axum::response::Response {
    match runtime.store.list_links() {
        Ok(links) => (StatusCode::OK, Json(links)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
