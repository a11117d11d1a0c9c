//! Consensus payloads.
//!
//! Nodes run Elect / Elect-Accept / Learn. Prepare, Promise, Propose and Accept
//! are exchanged between backends only and carry nothing a client acts on.

use crate::envelope::WitnessSignature;
use crate::ids::MessageId;
use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// What a consensus instance decides about: `property` of object `id` of kind
/// `type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsensusKey {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub property: String,
}

/// `consensus/elect`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusElect {
    pub created_at: Timestamp,
    pub key: ConsensusKey,
    pub value: String,
}

/// `consensus/elect_accept`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusElectAccept {
    pub instance_id: String,
    pub message_id: MessageId,
    pub accept: bool,
}

/// Value decided by a learn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnValue {
    pub decision: bool,
}

/// `consensus/learn`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusLearn {
    pub instance_id: String,
    pub message_id: MessageId,
    pub created_at: Timestamp,
    pub value: LearnValue,
    #[serde(default)]
    pub acceptor_signatures: Vec<WitnessSignature>,
}

/// `consensus/failure`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusFailure {
    pub instance_id: String,
    pub message_id: MessageId,
    pub created_at: Timestamp,
}

/// `consensus/prepare|promise|propose|accept`: backend rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusPhase {
    pub instance_id: String,
    pub message_id: MessageId,
    #[serde(default)]
    pub created_at: Timestamp,
}
