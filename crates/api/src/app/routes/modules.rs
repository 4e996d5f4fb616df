use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use coursegate_catalog::ModuleTree;
use coursegate_core::{DomainError, ModuleId};
use coursegate_entitlements::EntitlementStore;
use coursegate_infra::EntitlementRuntime;

use crate::app::{dto, errors};
use crate::context::Viewer;

pub fn router() -> Router {
    Router::new()
        .route("/:id/access", get(module_access))
        .route("/:id/content", post(module_content))
        .route("/:id/product", get(get_module_product).put(set_module_product))
}

/// `GET /modules/:id/access`: the view decision for the current viewer.
///
/// The course is always the module's parent; a `course_id` that names any
/// other course is rejected. Only trusted callers may pass `prior`, since it
/// stands for a decision the host already made.
pub async fn module_access(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
    Query(query): Query<dto::AccessQuery>,
) -> axum::response::Response {
    let module_id: ModuleId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let Some(user_id) = viewer.user_id() else {
        return errors::login_required();
    };

    if query.prior && !viewer.is_trusted() {
        return errors::forbidden("prior decisions are accepted from trusted callers only");
    }

    let course_id = match runtime.host.get_parent_course(module_id) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };
    if let Some(requested) = query.course_id {
        if Some(requested) != course_id {
            return errors::domain_error_to_response(DomainError::validation(format!(
                "course {requested} is not the parent course of module {module_id}"
            )));
        }
    }

    match runtime
        .evaluator
        .explain_access(module_id, course_id, user_id, query.prior)
    {
        Ok(explanation) => (
            StatusCode::OK,
            Json(dto::AccessResponse {
                allowed: explanation.granted,
                explanation,
            }),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// `POST /modules/:id/content`: the body if visible, otherwise a notice.
pub async fn module_content(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
    Json(body): Json<dto::ContentRequest>,
) -> axum::response::Response {
    let module_id: ModuleId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let module = match runtime.host.get_module(module_id) {
        Ok(Some(m)) => m,
        Ok(None) => {
            return errors::domain_error_to_response(DomainError::not_found(format!("module {module_id}")));
        }
        Err(e) => return errors::domain_error_to_response(e),
    };

    match runtime
        .evaluator
        .restrict_content(&body.content, &module, viewer.user_id())
    {
        Ok(content) => (StatusCode::OK, Json(dto::ContentResponse { content })).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_module_product(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let module_id: ModuleId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match runtime.evaluator.get_module_product_id(module_id) {
        Ok(product_id) => (
            StatusCode::OK,
            Json(dto::ModuleProductResponse {
                module_id,
                product_id,
            }),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// `PUT /modules/:id/product`: module-side link editing. Trusted callers only.
pub async fn set_module_product(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetModuleProductRequest>,
) -> axum::response::Response {
    if !viewer.is_trusted() {
        return errors::service_token_required();
    }
    let module_id: ModuleId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let product_id = dto::link_target(body.product_id);

    if let Err(e) = runtime.store.set_module_product(module_id, product_id) {
        return errors::domain_error_to_response(e);
    }
    tracing::info!(%module_id, product_id = ?product_id, "module product link updated");

    (
        StatusCode::OK,
        Json(dto::ModuleProductResponse {
            module_id,
            product_id,
        }),
    )
        .into_response()
}
