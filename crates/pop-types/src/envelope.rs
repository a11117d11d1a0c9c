//! # Signed Message Envelope
//!
//! The universal wrapper for every message exchanged on a channel.
//!
//! ## Security Properties
//!
//! - **Content Addressing**: `message_id = hash(data, signature)`.
//! - **Sender Authority**: `signature` is the sender's signature over the raw
//!   payload bytes. The sender field is the only source of identity.
//! - **Witnessing**: witnesses co-sign the message id; their signatures are the
//!   only part of a stored envelope that may grow.

use crate::data::Data;
use crate::errors::{DataError, EnvelopeError};
use crate::ids::{Base64Data, MessageId, PublicKey, Signature};
use crate::security::CryptoProvider;
use serde::{Deserialize, Serialize};

/// A witness co-signature over a message id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WitnessSignature {
    pub witness: PublicKey,
    pub signature: Signature,
}

impl WitnessSignature {
    pub fn new(witness: PublicKey, signature: Signature) -> Self {
        Self { witness, signature }
    }
}

/// A signed message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    pub message_id: MessageId,
    pub sender: PublicKey,
    pub signature: Signature,
    pub data: Base64Data,
    #[serde(default)]
    pub witness_signatures: Vec<WitnessSignature>,
}

impl SignedMessage {
    /// Decode the payload.
    pub fn decode_data(&self) -> Result<Data, DataError> {
        Data::from_json(&self.data.decode()?)
    }

    /// The id this envelope must carry for the given payload and signature.
    pub fn expected_id(data: &Base64Data, signature: &Signature, crypto: &dyn CryptoProvider) -> MessageId {
        MessageId::new(crypto.hash(&[data.as_str(), signature.as_str()]))
    }

    /// Check sender signature, content id and every attached witness signature.
    pub fn verify(&self, crypto: &dyn CryptoProvider) -> Result<(), EnvelopeError> {
        let payload = self.data.decode().map_err(|_| EnvelopeError::InvalidSignature)?;
        if !crypto.verify(&self.sender, &self.signature, &payload) {
            return Err(EnvelopeError::InvalidSignature);
        }

        if Self::expected_id(&self.data, &self.signature, crypto) != self.message_id {
            return Err(EnvelopeError::MessageIdMismatch);
        }

        let signed = witness_payload(&self.message_id);
        for pair in &self.witness_signatures {
            if !crypto.verify(&pair.witness, &pair.signature, &signed) {
                return Err(EnvelopeError::InvalidWitnessSignature(pair.witness.clone()));
            }
        }
        Ok(())
    }

    /// Append a witness signature unless that witness already signed.
    ///
    /// Returns `true` if the envelope changed.
    pub fn add_witness_signature(&mut self, pair: WitnessSignature) -> bool {
        if self.witness_signatures.iter().any(|p| p.witness == pair.witness) {
            return false;
        }
        self.witness_signatures.push(pair);
        true
    }
}

/// Bytes a witness signs for a given message id.
#[must_use]
pub fn witness_payload(message_id: &MessageId) -> Vec<u8> {
    message_id
        .decode()
        .unwrap_or_else(|_| message_id.as_str().as_bytes().to_vec())
}
