//! Wallet signature verification
//!
//! Verifies ed25519 detached signatures from Solana-compatible wallets.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

/// Raw ed25519 public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Detached ed25519 signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Errors that can occur during signature verification
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid wallet address encoding: {0}")]
    InvalidAddressEncoding(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("Signature verification failed")]
    VerificationFailed,
}

/// Verify a wallet signature over a message
///
/// # Arguments
/// * `wallet_address` - Base58-encoded ed25519 public key (Solana convention)
/// * `message` - The exact message that was signed
/// * `signature` - Raw 64-byte detached signature
///
/// # Returns
/// * `Ok(())` if the signature is valid
/// * `Err(CryptoError)` for malformed input or a failed verification
///
/// Verification itself is constant-time inside ed25519-dalek; the length and
/// encoding guards here reject malformed input before any curve work.
pub fn verify_wallet_signature(
    wallet_address: &str,
    message: &str,
    signature: &[u8],
) -> Result<(), CryptoError> {
    let public_key_bytes = decode_wallet_address(wallet_address)?;

    if signature.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::InvalidSignatureFormat(format!(
            "expected {} bytes, got {}",
            SIGNATURE_LENGTH,
            signature.len()
        )));
    }

    let signature = Signature::from_slice(signature)
        .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?;

    let verifying_key = VerifyingKey::from_bytes(&public_key_bytes)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;

    verifying_key
        .verify(message.as_bytes(), &signature)
        .map_err(|_| CryptoError::VerificationFailed)
}

/// Decode a base58 wallet address into raw ed25519 public key bytes.
///
/// Accepts the standard Solana wallet address form: base58 (Bitcoin
/// alphabet) over exactly 32 key bytes. Does not check that the bytes form
/// a valid curve point; `VerifyingKey::from_bytes` does that.
pub fn decode_wallet_address(address: &str) -> Result<[u8; PUBLIC_KEY_LENGTH], CryptoError> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| CryptoError::InvalidAddressEncoding(e.to_string()))?;

    if decoded.len() != PUBLIC_KEY_LENGTH {
        return Err(CryptoError::InvalidAddressEncoding(format!(
            "expected {} bytes, got {}",
            PUBLIC_KEY_LENGTH,
            decoded.len()
        )));
    }

    let mut public_key = [0u8; PUBLIC_KEY_LENGTH];
    public_key.copy_from_slice(&decoded);

    Ok(public_key)
}
