//! # Base64 Identifiers
//!
//! Keys, signatures and message ids travel as base64url strings. The newtypes
//! keep them apart at compile time while staying cheap to hash and compare.

use crate::errors::DataError;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! base64_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an already encoded base64url string.
            pub fn new(encoded: impl Into<String>) -> Self {
                Self(encoded.into())
            }

            /// Encode raw bytes.
            pub fn from_bytes(bytes: &[u8]) -> Self {
                Self(URL_SAFE.encode(bytes))
            }

            /// Decode back to raw bytes.
            pub fn decode(&self) -> Result<Vec<u8>, DataError> {
                URL_SAFE
                    .decode(self.0.as_bytes())
                    .map_err(|e| DataError::InvalidBase64(e.to_string()))
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

base64_newtype!(
    /// Content hash naming one signed message.
    MessageId
);

base64_newtype!(
    /// Ed25519 public key of a node, organizer, witness or attendee.
    PublicKey
);

base64_newtype!(
    /// Detached signature.
    Signature
);

base64_newtype!(
    /// Base64url encoded payload bytes.
    Base64Data
);
