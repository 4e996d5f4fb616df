//! Dev-mode seeding of the in-memory host platform.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
    Json, Router,
};

use coursegate_catalog::{Course, Module, Product};
use coursegate_core::{CourseId, ModuleId, ProductId, UserId};
use coursegate_infra::EntitlementRuntime;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/courses/:id", put(upsert_course))
        .route("/courses/:id/students/:user_id", post(enroll))
        .route("/modules/:id", put(upsert_module))
        .route("/products/:id", put(upsert_product))
        .route("/purchases", post(record_purchase))
}

pub async fn upsert_course(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpsertCourseRequest>,
) -> axum::response::Response {
    let course_id: CourseId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match runtime.host.upsert_course(Course::new(course_id, body.title)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn upsert_module(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpsertModuleRequest>,
) -> axum::response::Response {
    let module_id: ModuleId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match runtime
        .host
        .upsert_module(Module::new(module_id, body.name), body.course_id)
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn upsert_product(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpsertProductRequest>,
) -> axum::response::Response {
    let product_id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let product = Product::new(product_id, body.name, body.permalink).with_pricing(body.pricing);
    match runtime.host.upsert_product(product) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn enroll(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Path((course_id, user_id)): Path<(String, String)>,
) -> axum::response::Response {
    let course_id: CourseId = match errors::parse_id(&course_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let user_id: UserId = match errors::parse_id(&user_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match runtime.host.enroll(course_id, user_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Purchase history only; no grant is recorded and no event is published.
pub async fn record_purchase(
    Extension(runtime): Extension<Arc<EntitlementRuntime>>,
    Json(body): Json<dto::RecordPurchaseRequest>,
) -> axum::response::Response {
    match runtime.host.record_purchase(body.user_id, body.product_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
