//! Authentication models for MyMediWallet

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Single-use signing challenge bound to a wallet address.
///
/// At most one live challenge exists per wallet; issuing a new one replaces
/// the prior. `consumed` flips to true exactly once, on the successful
/// verification that references the challenge, and the record then lingers
/// until the expiry sweep so replays are answered as already-consumed.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub id: Uuid,
    pub wallet_address: String,
    pub nonce: String,
    pub message: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl Challenge {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Authenticated session minted after a successful verification.
///
/// The bearer token itself is never stored; records are keyed by its
/// SHA-256 digest and carry this metadata. `id` is a correlation id for
/// logs, safe to print where the token is not.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub wallet_address: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// A session authenticates its bearer only while unrevoked and unexpired.
    pub fn is_live(&self) -> bool {
        !self.revoked && !self.is_expired()
    }
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Request for an authentication challenge
///
/// Fields default to empty so a missing field surfaces as the service's
/// own malformed-input rejection rather than a deserializer error.
#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    #[serde(default)]
    pub wallet_address: String,
}

/// Response containing the authentication challenge
#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub nonce: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

impl From<Challenge> for ChallengeResponse {
    fn from(challenge: Challenge) -> Self {
        Self {
            nonce: challenge.nonce,
            message: challenge.message,
            expires_at: challenge.expires_at,
        }
    }
}

/// Request to verify a signed challenge
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub wallet_address: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub signature: String, // Base64-encoded detached signature
}

/// Bearer session response
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub session_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

/// Session introspection response (sanitized for API)
#[derive(Debug, Serialize)]
pub struct SessionInfoResponse {
    pub wallet_address: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for SessionInfoResponse {
    fn from(session: Session) -> Self {
        Self {
            wallet_address: session.wallet_address,
            issued_at: session.issued_at,
            expires_at: session.expires_at,
        }
    }
}
