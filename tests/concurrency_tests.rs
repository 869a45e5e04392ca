//! Concurrency tests for the challenge and session stores
//!
//! The stores promise per-wallet atomicity: a challenge is consumed by
//! exactly one racer, sweeps count each record once, and wallets never
//! contend with each other.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use std::sync::Arc;
use std::thread;

use mediwallet_auth::auth::{AuthError, AuthService, ChallengeStore, SessionStore};

fn test_service() -> Arc<AuthService> {
    Arc::new(AuthService::new(
        ChallengeStore::new(300),
        SessionStore::new(3600),
    ))
}

fn test_wallet() -> (SigningKey, String) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let address = bs58::encode(signing_key.verifying_key().as_bytes()).into_string();
    (signing_key, address)
}

fn sign_base64(key: &SigningKey, message: &str) -> String {
    BASE64.encode(key.sign(message.as_bytes()).to_bytes())
}

#[test]
fn test_racing_verifications_mint_exactly_one_session() {
    let service = test_service();
    let (key, address) = test_wallet();

    let challenge = service.issue_challenge(&address).unwrap();
    let signature = sign_base64(&key, &challenge.message);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = Arc::clone(&service);
            let address = address.clone();
            let message = challenge.message.clone();
            let signature = signature.clone();
            thread::spawn(move || service.authenticate(&address, &message, &signature))
        })
        .collect();

    let mut sessions = 0;
    let mut already_consumed = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => sessions += 1,
            Err(AuthError::ChallengeAlreadyConsumed) => already_consumed += 1,
            Err(e) => panic!("unexpected outcome: {}", e),
        }
    }

    assert_eq!(sessions, 1, "exactly one racer should win the challenge");
    assert_eq!(
        already_consumed, 1,
        "the loser should observe the challenge as consumed"
    );
    assert_eq!(
        service.session_count(),
        1,
        "a single challenge should never mint two sessions"
    );
}

#[test]
fn test_concurrent_issuance_keeps_one_challenge_per_wallet() {
    let service = test_service();
    let (_, address) = test_wallet();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let address = address.clone();
            thread::spawn(move || service.issue_challenge(&address).unwrap())
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        service.challenge_count(),
        1,
        "reissues should replace, not accumulate"
    );
}

#[test]
fn test_wallets_authenticate_independently_in_parallel() {
    let service = test_service();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let (key, address) = test_wallet();
                let challenge = service.issue_challenge(&address).unwrap();
                let signature = sign_base64(&key, &challenge.message);
                service
                    .authenticate(&address, &challenge.message, &signature)
                    .map(|minted| minted.session.wallet_address == address)
            })
        })
        .collect();

    for handle in handles {
        assert!(
            handle.join().unwrap().unwrap(),
            "each wallet should authenticate against its own challenge"
        );
    }

    assert_eq!(service.session_count(), 8);
}

#[test]
fn test_racing_sweeps_count_each_record_once() {
    let service = Arc::new(AuthService::new(
        ChallengeStore::new(0),
        SessionStore::new(0),
    ));

    for _ in 0..8 {
        let (_, address) = test_wallet();
        service.issue_challenge(&address).unwrap();
    }
    thread::sleep(std::time::Duration::from_millis(20));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || service.sweep_expired())
        })
        .collect();

    let total: usize = handles
        .into_iter()
        .map(|h| h.join().unwrap().challenges_removed)
        .sum();

    assert_eq!(total, 8, "each expired challenge is removed exactly once");
    assert_eq!(service.challenge_count(), 0);
}

#[test]
fn test_concurrent_revocations_report_one_hit() {
    let service = test_service();
    let (key, address) = test_wallet();

    let challenge = service.issue_challenge(&address).unwrap();
    let signature = sign_base64(&key, &challenge.message);
    let minted = service
        .authenticate(&address, &challenge.message, &signature)
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            let token = minted.token.clone();
            thread::spawn(move || service.revoke_session(&token))
        })
        .collect();

    let hits = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|revoked| *revoked)
        .count();

    assert_eq!(hits, 1, "only the first revocation flips the session");
    assert!(service.session_for_token(&minted.token).is_err());
}
