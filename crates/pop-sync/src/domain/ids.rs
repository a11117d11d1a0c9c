//! Identifier derivations.
//!
//! Every id is a content hash over a fixed list of fields, so any node can
//! recompute and check it.

use pop_types::data::ConsensusKey;
use pop_types::{CryptoProvider, PublicKey, Timestamp};

const ROLL_CALL_PREFIX: &str = "R";
const ELECTION_PREFIX: &str = "Election";
const CONSENSUS_PREFIX: &str = "consensus";

/// `hash(organizer, creation, name)`
pub fn lao_id(crypto: &dyn CryptoProvider, organizer: &PublicKey, creation: Timestamp, name: &str) -> String {
    crypto.hash(&[organizer.as_str(), &creation.to_string(), name])
}

/// `hash("R", lao, creation, name)`
pub fn create_roll_call_id(crypto: &dyn CryptoProvider, lao_id: &str, creation: Timestamp, name: &str) -> String {
    crypto.hash(&[ROLL_CALL_PREFIX, lao_id, &creation.to_string(), name])
}

/// `hash("R", lao, previous id, time)`; used for open, reopen and close.
pub fn update_roll_call_id(crypto: &dyn CryptoProvider, lao_id: &str, previous_id: &str, at: Timestamp) -> String {
    crypto.hash(&[ROLL_CALL_PREFIX, lao_id, previous_id, &at.to_string()])
}

/// `hash("Election", lao, created_at, name)`
pub fn election_id(crypto: &dyn CryptoProvider, lao_id: &str, created_at: Timestamp, name: &str) -> String {
    crypto.hash(&[ELECTION_PREFIX, lao_id, &created_at.to_string(), name])
}

/// `hash("consensus", type, id, property)`
pub fn instance_id(crypto: &dyn CryptoProvider, key: &ConsensusKey) -> String {
    crypto.hash(&[CONSENSUS_PREFIX, &key.kind, &key.id, &key.property])
}
