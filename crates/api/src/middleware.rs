use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use coursegate_core::UserId;

use crate::app::errors;
use crate::context::Viewer;

/// Header carrying the authenticated user id, set by the fronting host.
pub const USER_HEADER: &str = "x-user-id";

/// Header carrying the shared service token.
pub const SERVICE_TOKEN_HEADER: &str = "x-service-token";

#[derive(Clone, Default)]
pub struct IdentityState {
    pub service_token: Option<Arc<str>>,
}

impl IdentityState {
    pub fn new(service_token: Option<&str>) -> Self {
        Self {
            service_token: service_token.map(Arc::from),
        }
    }
}

/// Attach a [`Viewer`] to every request.
///
/// A malformed user id is a 400; a service token that does not match is a 401.
pub async fn identity_middleware(
    State(state): State<IdentityState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let viewer = extract_viewer(req.headers(), state.service_token.as_deref())?;
    req.extensions_mut().insert(viewer);
    Ok(next.run(req).await)
}

/// Reject callers that did not present the service token.
pub async fn require_trusted(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let trusted = req
        .extensions()
        .get::<Viewer>()
        .is_some_and(Viewer::is_trusted);
    if !trusted {
        return errors::service_token_required();
    }
    next.run(req).await
}

fn extract_viewer(headers: &HeaderMap, service_token: Option<&str>) -> Result<Viewer, StatusCode> {
    let viewer = match header_value(headers, USER_HEADER)? {
        None => Viewer::anonymous(),
        Some(raw) => {
            let user_id: UserId = raw.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
            Viewer::user(user_id)
        }
    };

    let Some(presented) = header_value(headers, SERVICE_TOKEN_HEADER)? else {
        return Ok(viewer);
    };
    match service_token {
        Some(expected) if tokens_match(presented, expected) => Ok(viewer.trusted()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, StatusCode> {
    let Some(header) = headers.get(name) else {
        return Ok(None);
    };
    let raw = header.to_str().map_err(|_| StatusCode::BAD_REQUEST)?.trim();
    Ok((!raw.is_empty()).then_some(raw))
}

/// Compare without exiting early on the first differing byte.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
