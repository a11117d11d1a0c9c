//! # PoP Types Crate
//!
//! This crate contains the identifiers, channels, the signed message envelope
//! and the message payloads exchanged between PoP nodes.
//!
//! ## Design Principles
//!
//! - **Closed Payload Union**: every `(object, action)` pair a node understands
//!   is a variant of [`Data`]. Anything else fails to decode with
//!   [`DataError::UnhandledDataType`].
//! - **Envelope Identity**: the `sender` of a [`SignedMessage`] is the sole
//!   authority on who produced the payload.
//! - **Crypto at the Edge**: hashing and signature checks go through the
//!   [`CryptoProvider`] trait, implemented outside this crate.

pub mod channel;
pub mod data;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod security;

pub use channel::Channel;
pub use data::Data;
pub use envelope::{SignedMessage, WitnessSignature};
pub use errors::{DataError, EnvelopeError};
pub use ids::{Base64Data, MessageId, PublicKey, Signature};
pub use security::CryptoProvider;

/// Unix timestamp in seconds, as carried by every payload.
pub type Timestamp = i64;
