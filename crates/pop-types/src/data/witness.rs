//! Witnessing payloads.

use crate::ids::{MessageId, Signature};
use serde::{Deserialize, Serialize};

/// `message/witness`: a witness co-signing `message_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessMessageSignature {
    pub message_id: MessageId,
    pub signature: Signature,
}
