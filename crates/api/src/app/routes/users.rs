use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use coursegate_core::UserId;
use coursegate_entitlements::EntitlementStore;
use coursegate_infra::EntitlementRuntime;

use crate::app::{dto, errors};
use crate::context::Viewer;

pub fn router() -> Router {
    Router::new().route("/:id/modules", get(granted_modules))
}

/// `GET /users/:id/modules`: the user's granted-module record.
///
/// Visible to that user and to trusted callers.
pub async fn granted_modules(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let user_id: UserId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    if !viewer.may_act_for(user_id) {
        if viewer.user_id().is_none() {
            return errors::login_required();
        }
        return errors::forbidden("granted modules are visible to their owner only");
    }

    match runtime.store.get_user_granted_modules(user_id) {
        Ok(modules) => (
            StatusCode::OK,
            Json(dto::UserModulesResponse {
                user_id,
                modules: modules.into_iter().collect(),
            }),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
