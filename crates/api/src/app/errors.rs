use core::str::FromStr;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use coursegate_core::DomainError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound(what) => json_error(StatusCode::NOT_FOUND, "not_found", what),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
        }
        DomainError::Publish(msg) => {
            tracing::error!(error = %msg, "publish failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "publish_error", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path segment into a typed id, or a 400 response.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(domain_error_to_response)
}

pub fn login_required() -> axum::response::Response {
    json_error(StatusCode::UNAUTHORIZED, "login_required", "a logged-in user is required")
}

pub fn service_token_required() -> axum::response::Response {
    json_error(
        StatusCode::UNAUTHORIZED,
        "service_token_required",
        "this endpoint requires the service token",
    )
}

pub fn forbidden(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", message)
}
