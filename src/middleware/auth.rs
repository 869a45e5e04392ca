//! Authentication middleware
//!
//! Bearer-token extraction and session resolution for protected routes.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthService;
use crate::error::ApiError;

/// Authenticated wallet extracted from a bearer session token
///
/// Resolving the token also proves the session is live. Absent, expired,
/// and revoked tokens are all rejected with the same code, so a response
/// never confirms why a token stopped working.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(wallet: AuthenticatedWallet) -> impl IntoResponse {
///     format!("Hello, {}", wallet.wallet_address)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedWallet {
    pub wallet_address: String,
    pub session_id: Uuid,
    pub token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedWallet
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::MissingToken)?;

        let auth_service = Arc::<AuthService>::from_ref(state);
        let session = auth_service.session_for_token(bearer.token())?;

        Ok(AuthenticatedWallet {
            wallet_address: session.wallet_address,
            session_id: session.id,
            token: bearer.token().to_string(),
        })
    }
}
