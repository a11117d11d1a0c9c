//! # Ed25519 Signatures
//!
//! Keys and signatures cross the wire as base64url strings; this module is the
//! only place they are turned back into curve points.

use crate::CryptoError;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use pop_types::{PublicKey, Signature};
use zeroize::Zeroize;

fn verifying_key(public_key: &PublicKey) -> Result<VerifyingKey, CryptoError> {
    let bytes: [u8; 32] = public_key
        .decode()
        .map_err(|_| CryptoError::InvalidPublicKey)?
        .try_into()
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)
}

fn signature_bytes(signature: &Signature) -> Result<[u8; 64], CryptoError> {
    signature
        .decode()
        .map_err(|_| CryptoError::InvalidSignatureEncoding)?
        .try_into()
        .map_err(|_| CryptoError::InvalidSignatureEncoding)
}

/// Verify `signature` by `public_key` over `message`.
pub fn verify(public_key: &PublicKey, signature: &Signature, message: &[u8]) -> Result<(), CryptoError> {
    let key = verifying_key(public_key)?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature_bytes(signature)?);
    key.verify(message, &sig)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

/// Ed25519 keypair of a node.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret seed (32 bytes).
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_bytes(self.signing_key.verifying_key().as_bytes())
    }

    /// Sign a message (deterministic).
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from_bytes(&self.signing_key.sign(message).to_bytes())
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}
