//! LAO lifecycle payloads.

use crate::envelope::WitnessSignature;
use crate::ids::{MessageId, PublicKey};
use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// `lao/create`: founds a LAO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLao {
    pub id: String,
    pub name: String,
    pub creation: Timestamp,
    pub organizer: PublicKey,
    pub witnesses: Vec<PublicKey>,
}

/// `lao/update_properties`: proposes a new name or witness set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLao {
    pub id: String,
    pub name: String,
    pub last_modified: Timestamp,
    pub witnesses: Vec<PublicKey>,
}

/// `lao/state`: the consolidated state once an update is witnessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateLao {
    pub id: String,
    pub name: String,
    pub creation: Timestamp,
    pub last_modified: Timestamp,
    pub organizer: PublicKey,
    pub witnesses: Vec<PublicKey>,
    pub modification_id: MessageId,
    pub modification_signatures: Vec<WitnessSignature>,
}

/// Address of a backend peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerAddress {
    pub address: String,
}

/// `lao/greet`: a backend announcing itself and its peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetLao {
    pub lao: String,
    pub frontend: PublicKey,
    pub address: String,
    pub peers: Vec<PeerAddress>,
}
