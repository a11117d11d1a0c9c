//! # PoP Crypto
//!
//! Ed25519 signatures and SHA-256 content hashing behind the
//! [`CryptoProvider`](pop_types::CryptoProvider) trait, plus the helper that
//! turns a payload into a signed, content-addressed message.
//!
//! ## Security Properties
//!
//! - Deterministic Ed25519 nonces (no RNG at signing time)
//! - Malformed keys and signatures verify as `false`, never panic
//! - Secret key material zeroized on drop

pub mod hashing;
pub mod signatures;

pub use hashing::{hash_parts, sha256_parts};
pub use signatures::KeyPair;

use pop_types::{Base64Data, CryptoProvider, Data, DataError, PublicKey, Signature, SignedMessage};
use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid signature encoding")]
    InvalidSignatureEncoding,

    #[error("Signature verification failed")]
    SignatureVerificationFailed,
}

/// The production [`CryptoProvider`]: Ed25519 verification, SHA-256 hashing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Provider;

impl CryptoProvider for Ed25519Provider {
    fn verify(&self, public_key: &PublicKey, signature: &Signature, payload: &[u8]) -> bool {
        signatures::verify(public_key, signature, payload).is_ok()
    }

    fn hash(&self, parts: &[&str]) -> String {
        hash_parts(parts)
    }
}

/// Encode, sign and content-address a payload.
pub fn sign_message(keys: &KeyPair, data: &Data) -> Result<SignedMessage, DataError> {
    let bytes = data.to_json()?;
    let signature = keys.sign(&bytes);
    let data = Base64Data::from_bytes(&bytes);
    let message_id = SignedMessage::expected_id(&data, &signature, &Ed25519Provider);

    Ok(SignedMessage {
        message_id,
        sender: keys.public_key(),
        signature,
        data,
        witness_signatures: Vec::new(),
    })
}
