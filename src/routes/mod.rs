//! Route definitions for the MediWallet auth API

mod auth;

pub use auth::auth_routes;

use axum::{http::Uri, routing::get, Router};

use crate::error::ApiError;
use crate::handlers;
use crate::state::AppState;

/// Assemble the full API router
///
/// Shared by the binary and the integration tests so both exercise the
/// same surface.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .merge(auth_routes())
        .fallback(fallback)
}

async fn fallback(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
