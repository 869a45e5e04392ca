//! Challenge issuance and consumption
//!
//! One live challenge per wallet address. Consuming is atomic per wallet,
//! which is what makes a captured signature single-use.

use chrono::{Duration, Utc};
use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::models::Challenge;

use super::service::AuthError;

/// Domain-separation prefix. Every challenge message starts with this line,
/// so a signature produced for this service cannot be replayed against
/// another protocol that signs with the same key.
pub const DOMAIN_PREFIX: &str = "Sign this message to authenticate with MyMediWallet.";

/// Nonce length in raw bytes before hex encoding.
const NONCE_LENGTH: usize = 32;

/// In-memory challenge store, keyed by wallet address.
///
/// The map key doubles as the one-live-challenge-per-wallet invariant:
/// issuing simply overwrites the slot. Consumed records are kept (flagged)
/// until the expiry sweep so replays are answered as already consumed
/// rather than unknown.
pub struct ChallengeStore {
    challenges: DashMap<String, Challenge>,
    ttl_seconds: i64,
}

impl ChallengeStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            challenges: DashMap::new(),
            ttl_seconds,
        }
    }

    /// Issue a fresh challenge for a wallet, replacing any prior one.
    pub fn issue(&self, wallet_address: &str) -> Challenge {
        let nonce = generate_secure_nonce();
        let issued_at = Utc::now();
        let expires_at = issued_at + Duration::seconds(self.ttl_seconds);

        let message = format!(
            "{}\n\nWallet: {}\nNonce: {}\nIssued At: {}\nExpires At: {}",
            DOMAIN_PREFIX,
            wallet_address,
            nonce,
            issued_at.format("%Y-%m-%d %H:%M:%S UTC"),
            expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
        );

        let challenge = Challenge {
            id: Uuid::new_v4(),
            wallet_address: wallet_address.to_string(),
            nonce,
            message,
            issued_at,
            expires_at,
            consumed: false,
            consumed_at: None,
        };

        self.challenges
            .insert(wallet_address.to_string(), challenge.clone());

        tracing::debug!(
            challenge_id = %challenge.id,
            wallet_address = %wallet_address,
            expires_at = %expires_at,
            "Issued authentication challenge"
        );

        challenge
    }

    /// Validate a presented message against the stored challenge and mark it
    /// consumed.
    ///
    /// `get_mut` holds the shard lock for the wallet's entry, so concurrent
    /// calls for the same wallet serialize here and only the first observes
    /// `consumed == false`. A mismatched message does not consume; only the
    /// successful path flips the flag.
    pub fn validate_and_consume(
        &self,
        wallet_address: &str,
        presented_message: &str,
    ) -> Result<Challenge, AuthError> {
        let mut entry = self
            .challenges
            .get_mut(wallet_address)
            .ok_or(AuthError::ChallengeNotFound)?;

        if entry.is_expired() {
            return Err(AuthError::ChallengeExpired);
        }

        if entry.consumed {
            return Err(AuthError::ChallengeAlreadyConsumed);
        }

        if entry.message != presented_message {
            return Err(AuthError::ChallengeMismatch);
        }

        entry.consumed = true;
        entry.consumed_at = Some(Utc::now());

        Ok(entry.clone())
    }

    /// Remove challenges past their expiry, consumed or not.
    ///
    /// Snapshot-then-delete: expired keys are collected first, then each is
    /// removed under its shard lock with the expiry re-checked, so a wallet
    /// that re-issued in between keeps its fresh challenge.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let expired: Vec<String> = self
            .challenges
            .iter()
            .filter(|entry| now > entry.expires_at)
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for wallet_address in expired {
            if self
                .challenges
                .remove_if(&wallet_address, |_, challenge| challenge.is_expired())
                .is_some()
            {
                removed += 1;
            }
        }

        removed
    }

    /// Number of stored challenge records, consumed tombstones included.
    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}

/// Generate a cryptographically secure nonce from the OS RNG.
fn generate_secure_nonce() -> String {
    let mut bytes = [0u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "7fUAJdStEuGbc3sM84yKvQqSn1UVZzVZyQ11a9GdNUSM";

    #[test]
    fn test_issue_builds_domain_separated_message() {
        let store = ChallengeStore::new(300);
        let challenge = store.issue(WALLET);

        assert!(challenge.message.starts_with(DOMAIN_PREFIX));
        assert!(challenge.message.contains(&challenge.nonce));
        assert!(challenge.message.contains(WALLET));
        assert_eq!(challenge.nonce.len(), NONCE_LENGTH * 2);
        assert!(challenge.expires_at > Utc::now());
        assert!(!challenge.consumed);
    }

    #[test]
    fn test_nonces_are_unique() {
        let store = ChallengeStore::new(300);
        let first = store.issue(WALLET);
        let second = store.issue(WALLET);
        assert_ne!(first.nonce, second.nonce);
    }

    #[test]
    fn test_consume_happy_path() {
        let store = ChallengeStore::new(300);
        let challenge = store.issue(WALLET);

        let consumed = store
            .validate_and_consume(WALLET, &challenge.message)
            .unwrap();
        assert!(consumed.consumed);
        assert!(consumed.consumed_at.is_some());
        assert_eq!(consumed.id, challenge.id);
    }

    #[test]
    fn test_second_consume_is_rejected() {
        let store = ChallengeStore::new(300);
        let challenge = store.issue(WALLET);

        store
            .validate_and_consume(WALLET, &challenge.message)
            .unwrap();
        let replay = store.validate_and_consume(WALLET, &challenge.message);
        assert!(matches!(replay, Err(AuthError::ChallengeAlreadyConsumed)));
    }

    #[test]
    fn test_unknown_wallet_is_not_found() {
        let store = ChallengeStore::new(300);
        let result = store.validate_and_consume(WALLET, "anything");
        assert!(matches!(result, Err(AuthError::ChallengeNotFound)));
    }

    #[test]
    fn test_mismatched_message_does_not_consume() {
        let store = ChallengeStore::new(300);
        let challenge = store.issue(WALLET);

        let result = store.validate_and_consume(WALLET, "tampered message");
        assert!(matches!(result, Err(AuthError::ChallengeMismatch)));

        // The real message must still work after a mismatch.
        let consumed = store.validate_and_consume(WALLET, &challenge.message);
        assert!(consumed.is_ok());
    }

    #[test]
    fn test_reissue_replaces_prior_challenge() {
        let store = ChallengeStore::new(300);
        let first = store.issue(WALLET);
        let second = store.issue(WALLET);

        assert_eq!(store.len(), 1);

        let stale = store.validate_and_consume(WALLET, &first.message);
        assert!(matches!(stale, Err(AuthError::ChallengeMismatch)));

        let fresh = store.validate_and_consume(WALLET, &second.message);
        assert!(fresh.is_ok());
    }

    #[test]
    fn test_expired_challenge_is_rejected() {
        let store = ChallengeStore::new(0);
        let challenge = store.issue(WALLET);

        std::thread::sleep(std::time::Duration::from_millis(20));

        let result = store.validate_and_consume(WALLET, &challenge.message);
        assert!(matches!(result, Err(AuthError::ChallengeExpired)));
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let expiring = ChallengeStore::new(0);
        expiring.issue("wallet-a");
        expiring.issue("wallet-b");
        std::thread::sleep(std::time::Duration::from_millis(20));

        assert_eq!(expiring.sweep_expired(), 2);
        assert!(expiring.is_empty());

        let live = ChallengeStore::new(300);
        live.issue(WALLET);
        assert_eq!(live.sweep_expired(), 0);
        assert_eq!(live.len(), 1);
    }

    #[test]
    fn test_consumed_challenge_survives_until_sweep() {
        let store = ChallengeStore::new(300);
        let challenge = store.issue(WALLET);
        store
            .validate_and_consume(WALLET, &challenge.message)
            .unwrap();

        assert_eq!(store.sweep_expired(), 0);
        assert_eq!(store.len(), 1);

        let replay = store.validate_and_consume(WALLET, &challenge.message);
        assert!(matches!(replay, Err(AuthError::ChallengeAlreadyConsumed)));
    }
}
