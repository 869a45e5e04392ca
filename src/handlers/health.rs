//! Health check handler

use axum::{extract::State, Json};

use crate::state::AppState;

/// Health check response
///
/// The counts are store occupancy gauges. Consumed and revoked records
/// linger until the next sweep, so they read slightly high between sweeps.
#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_challenges: usize,
    pub active_sessions: usize,
}

/// GET /health - Service health and store occupancy
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_challenges: state.auth_service.challenge_count(),
        active_sessions: state.auth_service.session_count(),
    })
}

/// GET / - Service banner
pub async fn root() -> &'static str {
    "MyMediWallet Auth API"
}
