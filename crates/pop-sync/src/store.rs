//! # Message Store
//!
//! Content-addressed map from message id to the full signed envelope. The
//! payload of a stored envelope never changes; only witness signatures are
//! appended.

use parking_lot::RwLock;
use pop_types::{MessageId, SignedMessage, WitnessSignature};
use std::collections::HashMap;

#[derive(Default)]
pub struct MessageStore {
    messages: RwLock<HashMap<MessageId, SignedMessage>>,
}

impl MessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `message` under its id.
    ///
    /// # Returns
    ///
    /// `false` if the id was already stored; the stored envelope is kept.
    pub fn put(&self, message: SignedMessage) -> bool {
        let mut messages = self.messages.write();
        if messages.contains_key(&message.message_id) {
            return false;
        }
        messages.insert(message.message_id.clone(), message);
        true
    }

    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<SignedMessage> {
        self.messages.read().get(id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.read().contains_key(id)
    }

    /// Append a witness signature to a stored envelope.
    ///
    /// # Returns
    ///
    /// `true` if appended; `false` if the id is unknown or that witness
    /// already signed.
    pub fn add_witness_signature(&self, id: &MessageId, pair: WitnessSignature) -> bool {
        self.messages
            .write()
            .get_mut(id)
            .is_some_and(|message| message.add_witness_signature(pair))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}
