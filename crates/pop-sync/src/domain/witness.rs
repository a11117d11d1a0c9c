//! Signing requests addressed to the witnesses of a LAO.

use pop_types::{MessageId, PublicKey};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WitnessMessage {
    pub message_id: MessageId,
    pub title: String,
    pub description: String,
    /// Keys that have signed so far
    pub witnesses: BTreeSet<PublicKey>,
    /// Set once the action gated by this message has run
    pub fired: bool,
}

impl WitnessMessage {
    pub fn new(message_id: MessageId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            message_id,
            title: title.into(),
            description: description.into(),
            witnesses: BTreeSet::new(),
            fired: false,
        }
    }

    /// Whether every key in `required` has signed. Vacuously true when empty.
    pub fn signed_by_all<'a>(&self, required: impl IntoIterator<Item = &'a PublicKey>) -> bool {
        required.into_iter().all(|key| self.witnesses.contains(key))
    }
}
