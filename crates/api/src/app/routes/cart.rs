use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use coursegate_infra::EntitlementRuntime;

use crate::app::{dto, errors};
use crate::context::Viewer;

pub fn router() -> Router {
    Router::new().route("/validate", post(validate_purchase))
}

/// `POST /cart/validate`: would adding this product to the cart be allowed?
///
/// A denial is a normal answer (200), not an error.
pub async fn validate_purchase(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Extension(viewer): Extension<Viewer>,
    Json(body): Json<dto::ValidatePurchaseRequest>,
) -> axum::response::Response {
    match runtime
        .validator
        .validate_purchase(viewer.user_id(), body.product_id)
    {
        Ok(verdict) => (
            StatusCode::OK,
            Json(dto::PurchaseVerdictResponse::from_verdict(body.product_id, verdict)),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
