//! # Content Hashing
//!
//! Every identifier in the protocol (LAO ids, roll call ids, election ids,
//! consensus instance ids, message ids) is a SHA-256 over a list of strings.
//! Each part is prefixed by the decimal length of its UTF-8 bytes so that
//! `["ab", "c"]` and `["a", "bc"]` never collide.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use sha2::{Digest, Sha256};

/// SHA-256 digest (256-bit).
pub type Digest256 = [u8; 32];

/// Length-prefixed SHA-256 over `parts`.
pub fn sha256_parts(parts: &[&str]) -> Digest256 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.len().to_string().as_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.finalize().into()
}

/// Length-prefixed SHA-256 over `parts`, base64url encoded.
pub fn hash_parts(parts: &[&str]) -> String {
    URL_SAFE.encode(sha256_parts(parts))
}
