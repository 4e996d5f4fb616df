use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use coursegate_core::ProductId;
use coursegate_entitlements::EntitlementStore;
use coursegate_infra::EntitlementRuntime;

use crate::app::{dto, errors};
use crate::context::Viewer;

pub fn router() -> Router {
    Router::new().route("/:id/module", get(get_product_module).put(set_product_module))
}

pub async fn get_product_module(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match runtime.store.get_product_module(product_id) {
        Ok(module_id) => (
            StatusCode::OK,
            Json(dto::ProductModuleResponse {
                product_id,
                module_id,
            }),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// `PUT /products/:id/module`: product-side link editing. Trusted callers only.
pub async fn set_product_module(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetProductModuleRequest>,
) -> axum::response::Response {
    if !viewer.is_trusted() {
        return errors::service_token_required();
    }
    let product_id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let module_id = dto::link_target(body.module_id);

    if let Err(e) = runtime.store.set_product_module(product_id, module_id) {
        return errors::domain_error_to_response(e);
    }
    tracing::info!(%product_id, module_id = ?module_id, "product module link updated");

    (
        StatusCode::OK,
        Json(dto::ProductModuleResponse {
            product_id,
            module_id,
        }),
    )
        .into_response()
}
