//! # Error Types
//!
//! Decoding and envelope authentication errors.

use crate::ids::PublicKey;
use thiserror::Error;

/// Errors raised while decoding a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    /// Payload is not valid base64url.
    #[error("Invalid base64: {0}")]
    InvalidBase64(String),

    /// Payload is not valid JSON or does not match the expected shape.
    #[error("Invalid payload: {0}")]
    InvalidJson(String),

    /// No handler exists for this `(object, action)` pair.
    #[error("Unhandled data type: object={object}, action={action}")]
    UnhandledDataType { object: String, action: String },
}

/// Errors raised while authenticating a [`SignedMessage`](crate::SignedMessage).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Sender signature does not verify over the payload.
    #[error("Invalid sender signature")]
    InvalidSignature,

    /// Message id is not the hash of payload and signature.
    #[error("Message id does not match its content")]
    MessageIdMismatch,

    /// An attached witness signature does not verify over the message id.
    #[error("Invalid witness signature from {0}")]
    InvalidWitnessSignature(PublicKey),
}
