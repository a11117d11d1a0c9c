//! # Crypto Provider
//!
//! Signature verification and hashing are supplied by the host. The sync
//! engine only ever talks to this trait.

use crate::ids::{PublicKey, Signature};

/// Signature verification and content hashing.
pub trait CryptoProvider: Send + Sync {
    /// Verify `signature` by `public_key` over `payload`.
    ///
    /// Malformed keys or signatures verify as `false`.
    fn verify(&self, public_key: &PublicKey, signature: &Signature, payload: &[u8]) -> bool;

    /// Hash a sequence of strings into a base64url identifier.
    fn hash(&self, parts: &[&str]) -> String;
}
