use axum::{routing::get, Router};

pub mod cart;
pub mod commerce;
pub mod host;
pub mod modules;
pub mod products;
pub mod system;
pub mod users;

/// Endpoints open to any identified or anonymous viewer.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/modules", modules::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/users", users::router())
}

/// Endpoints that require the service token.
pub fn trusted_router() -> Router {
    Router::new()
        .route("/links", get(system::links))
        .nest("/commerce", commerce::router())
}
