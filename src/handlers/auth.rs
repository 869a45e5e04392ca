//! Authentication HTTP handlers
//!
//! Endpoints for wallet-based challenge/response authentication.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthenticatedWallet;
use crate::models::{
    ChallengeRequest, ChallengeResponse, SessionInfoResponse, VerifyRequest, VerifyResponse,
};
use crate::state::AppState;

/// POST /auth/challenge - Request a signing challenge for a wallet
pub async fn request_challenge(
    State(state): State<AppState>,
    Json(req): Json<ChallengeRequest>,
) -> ApiResult<Json<ChallengeResponse>> {
    let challenge = state.auth_service.issue_challenge(&req.wallet_address)?;

    Ok(Json(challenge.into()))
}

/// POST /auth/verify - Verify a signed challenge and issue a session token
pub async fn verify_signature(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<Json<VerifyResponse>> {
    let minted = state
        .auth_service
        .authenticate(&req.wallet_address, &req.message, &req.signature)?;

    Ok(Json(VerifyResponse {
        session_token: minted.token,
        token_type: "Bearer".to_string(),
        expires_at: minted.session.expires_at,
    }))
}

/// GET /auth/session - Inspect the current session
pub async fn get_session(
    State(state): State<AppState>,
    wallet: AuthenticatedWallet,
) -> ApiResult<Json<SessionInfoResponse>> {
    let session = state.auth_service.session_for_token(&wallet.token)?;

    Ok(Json(session.into()))
}

/// POST /auth/logout - Revoke the presented session token
///
/// Always 204 once a token is presented. Revoking a token that no longer
/// resolves is a no-op, so retried logouts cannot fail.
pub async fn logout(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> ApiResult<StatusCode> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::MissingToken)?;

    state.auth_service.revoke_session(bearer.token());

    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/logout-all - Revoke every live session for the current wallet
pub async fn logout_all(
    State(state): State<AppState>,
    wallet: AuthenticatedWallet,
) -> ApiResult<Json<LogoutAllResponse>> {
    let revoked_count = state
        .auth_service
        .revoke_all_sessions(&wallet.wallet_address);

    Ok(Json(LogoutAllResponse {
        revoked_sessions: revoked_count,
    }))
}

#[derive(Debug, serde::Serialize)]
pub struct LogoutAllResponse {
    pub revoked_sessions: usize,
}
