//! Authentication module for MyMediWallet
//!
//! Wallet-based challenge/response authentication:
//! - ed25519 signature verification over base58 wallet addresses
//! - Single-use, time-bounded signing challenges (replay prevention)
//! - Opaque bearer sessions with revocation and expiry sweeping

mod challenge;
mod crypto;
mod service;
mod session;

pub use challenge::{ChallengeStore, DOMAIN_PREFIX};
pub use crypto::{decode_wallet_address, verify_wallet_signature, CryptoError};
pub use service::{AuthError, AuthService, SweepCounts};
pub use session::{NewSession, SessionStore};
