//! Authentication service
//!
//! Core business logic for wallet-based authentication: challenge issuance,
//! signed-challenge verification, and session lifecycle.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;

use crate::models::{Challenge, Session};

use super::challenge::ChallengeStore;
use super::crypto::{self, CryptoError, SIGNATURE_LENGTH};
use super::session::{NewSession, SessionStore};

/// Auth failure taxonomy. Every variant is terminal for the attempt that
/// produced it; recovery is always the client requesting a fresh challenge.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Malformed request: {0}")]
    MalformedInput(String),

    #[error("Unrecognized public key encoding")]
    UnknownPublicKeyEncoding,

    #[error("No challenge found for this wallet")]
    ChallengeNotFound,

    #[error("Challenge has expired")]
    ChallengeExpired,

    #[error("Challenge already consumed")]
    ChallengeAlreadyConsumed,

    #[error("Challenge message mismatch")]
    ChallengeMismatch,

    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("Session not found")]
    SessionNotFound,
}

impl AuthError {
    /// Stable machine-readable kind, used as the wire-level error code.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MalformedInput(_) => "MALFORMED_INPUT",
            AuthError::UnknownPublicKeyEncoding => "UNKNOWN_PUBLIC_KEY_ENCODING",
            AuthError::ChallengeNotFound => "CHALLENGE_NOT_FOUND",
            AuthError::ChallengeExpired => "CHALLENGE_EXPIRED",
            AuthError::ChallengeAlreadyConsumed => "CHALLENGE_ALREADY_CONSUMED",
            AuthError::ChallengeMismatch => "CHALLENGE_MISMATCH",
            AuthError::SignatureInvalid => "SIGNATURE_INVALID",
            AuthError::SessionNotFound => "SESSION_NOT_FOUND",
        }
    }
}

impl From<CryptoError> for AuthError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidAddressEncoding(_) | CryptoError::InvalidPublicKey(_) => {
                AuthError::UnknownPublicKeyEncoding
            }
            CryptoError::InvalidSignatureFormat(detail) => {
                AuthError::MalformedInput(format!("signature: {}", detail))
            }
            CryptoError::VerificationFailed => AuthError::SignatureInvalid,
        }
    }
}

/// Authentication service
///
/// Owns the challenge and session stores (injected so tests can pick their
/// own TTLs) and drives each authentication attempt in a fixed order:
/// shape checks, challenge consumption, signature verification over the
/// stored message, session mint.
pub struct AuthService {
    challenges: ChallengeStore,
    sessions: SessionStore,
}

impl AuthService {
    pub fn new(challenges: ChallengeStore, sessions: SessionStore) -> Self {
        Self {
            challenges,
            sessions,
        }
    }

    /// Issue a signing challenge for a wallet, replacing any prior one.
    pub fn issue_challenge(&self, wallet_address: &str) -> Result<Challenge, AuthError> {
        if wallet_address.is_empty() {
            return Err(AuthError::MalformedInput(
                "wallet_address is required".to_string(),
            ));
        }
        crypto::decode_wallet_address(wallet_address)?;

        Ok(self.challenges.issue(wallet_address))
    }

    /// Verify a signed challenge and mint a session.
    ///
    /// Ordering matters here. Shape checks run before any store or curve
    /// work, so garbage requests cannot burn a live challenge. The challenge
    /// is consumed before the signature is checked, so a consumed challenge
    /// never gets a second verification attempt regardless of how the
    /// signature turns out. Verification runs over the stored message, not
    /// the client's copy.
    pub fn authenticate(
        &self,
        wallet_address: &str,
        message: &str,
        signature: &str,
    ) -> Result<NewSession, AuthError> {
        if wallet_address.is_empty() {
            return Err(AuthError::MalformedInput(
                "wallet_address is required".to_string(),
            ));
        }
        if message.is_empty() {
            return Err(AuthError::MalformedInput("message is required".to_string()));
        }
        if signature.is_empty() {
            return Err(AuthError::MalformedInput(
                "signature is required".to_string(),
            ));
        }
        crypto::decode_wallet_address(wallet_address)?;

        let signature_bytes = BASE64.decode(signature).map_err(|_| {
            AuthError::MalformedInput("signature is not valid base64".to_string())
        })?;
        if signature_bytes.len() != SIGNATURE_LENGTH {
            return Err(AuthError::MalformedInput(format!(
                "signature must decode to {} bytes",
                SIGNATURE_LENGTH
            )));
        }

        let challenge = self
            .challenges
            .validate_and_consume(wallet_address, message)?;

        crypto::verify_wallet_signature(wallet_address, &challenge.message, &signature_bytes)?;

        let minted = self.sessions.create(wallet_address);

        tracing::info!(
            wallet_address = %wallet_address,
            challenge_id = %challenge.id,
            session_id = %minted.session.id,
            "Wallet authenticated"
        );

        Ok(minted)
    }

    /// Resolve a bearer token to its live session.
    pub fn session_for_token(&self, token: &str) -> Result<Session, AuthError> {
        self.sessions.lookup(token)
    }

    /// Revoke the session behind a bearer token (logout). Idempotent.
    pub fn revoke_session(&self, token: &str) -> bool {
        self.sessions.revoke(token)
    }

    /// Revoke every live session for a wallet. Returns the number revoked.
    pub fn revoke_all_sessions(&self, wallet_address: &str) -> usize {
        self.sessions.revoke_all_for(wallet_address)
    }

    /// Drop expired challenge and session records.
    pub fn sweep_expired(&self) -> SweepCounts {
        SweepCounts {
            challenges_removed: self.challenges.sweep_expired(),
            sessions_removed: self.sessions.sweep_expired(),
        }
    }

    /// Stored challenge records, consumed tombstones included.
    pub fn challenge_count(&self) -> usize {
        self.challenges.len()
    }

    /// Stored session records, revoked tombstones included.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Counts from one maintenance sweep.
#[derive(Debug, Clone, Copy)]
pub struct SweepCounts {
    pub challenges_removed: usize,
    pub sessions_removed: usize,
}
