//! Session storage
//!
//! Opaque bearer sessions held in memory, keyed at rest by the SHA-256
//! digest of the token so the credential itself never sits in the store.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::Session;

use super::service::AuthError;

/// Session token length in raw bytes before base64url encoding (256 bits).
const SESSION_TOKEN_LENGTH: usize = 32;

/// A freshly minted session together with its plaintext bearer token.
///
/// The token leaves the process exactly once, in the verify response;
/// afterwards only its digest exists server-side.
#[derive(Debug)]
pub struct NewSession {
    pub token: String,
    pub session: Session,
}

/// In-memory session store.
///
/// Lookups for absent, expired, and revoked sessions are deliberately
/// indistinguishable: all return `SessionNotFound`, so a presented token
/// confirms nothing about why it stopped working.
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl_seconds: i64,
}

impl SessionStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_seconds,
        }
    }

    /// Mint a session for a wallet and return it with its bearer token.
    ///
    /// The entry API makes the insert atomic: the token is re-rolled in the
    /// (cosmically unlikely) case its digest already keys a record, so a
    /// returned token never aliases another live session.
    pub fn create(&self, wallet_address: &str) -> NewSession {
        let issued_at = Utc::now();
        let expires_at = issued_at + Duration::seconds(self.ttl_seconds);

        loop {
            let token = generate_session_token();
            match self.sessions.entry(hash_token(&token)) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let session = Session {
                        id: Uuid::new_v4(),
                        wallet_address: wallet_address.to_string(),
                        issued_at,
                        expires_at,
                        revoked: false,
                        revoked_at: None,
                    };
                    slot.insert(session.clone());

                    tracing::debug!(
                        session_id = %session.id,
                        wallet_address = %wallet_address,
                        expires_at = %expires_at,
                        "Created session"
                    );

                    return NewSession { token, session };
                }
            }
        }
    }

    /// Resolve a presented bearer token to its live session.
    pub fn lookup(&self, token: &str) -> Result<Session, AuthError> {
        let session = self
            .sessions
            .get(&hash_token(token))
            .ok_or(AuthError::SessionNotFound)?;

        if !session.is_live() {
            return Err(AuthError::SessionNotFound);
        }

        Ok(session.clone())
    }

    /// Revoke the session behind a token. Idempotent: revoking an absent or
    /// already-revoked session is a no-op. Returns whether a live session
    /// was actually revoked, for logging.
    pub fn revoke(&self, token: &str) -> bool {
        match self.sessions.get_mut(&hash_token(token)) {
            Some(mut session) if !session.revoked => {
                session.revoked = true;
                session.revoked_at = Some(Utc::now());
                tracing::debug!(session_id = %session.id, "Revoked session");
                true
            }
            _ => false,
        }
    }

    /// Revoke every live session for a wallet. Returns the number revoked.
    pub fn revoke_all_for(&self, wallet_address: &str) -> usize {
        let now = Utc::now();
        let mut revoked = 0;

        for mut entry in self.sessions.iter_mut() {
            if entry.wallet_address == wallet_address && entry.is_live() {
                entry.revoked = true;
                entry.revoked_at = Some(now);
                revoked += 1;
            }
        }

        if revoked > 0 {
            tracing::info!(
                wallet_address = %wallet_address,
                revoked_sessions = revoked,
                "Revoked all sessions for wallet"
            );
        }

        revoked
    }

    /// Remove sessions past their expiry, revoked tombstones included.
    ///
    /// Snapshot-then-delete, same discipline as the challenge sweep: keys
    /// are collected first and each removal re-checks expiry under the
    /// shard lock, so a concurrent lookup never observes a half-deleted
    /// record.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| now > entry.expires_at)
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in expired {
            if self
                .sessions
                .remove_if(&key, |_, session| session.is_expired())
                .is_some()
            {
                removed += 1;
            }
        }

        removed
    }

    /// Number of stored session records, revoked tombstones included.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Generate an unguessable session token from the OS RNG.
fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
