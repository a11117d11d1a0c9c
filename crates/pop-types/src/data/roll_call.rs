//! Roll call payloads.

use crate::ids::PublicKey;
use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// `roll_call/create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRollCall {
    pub id: String,
    pub name: String,
    pub creation: Timestamp,
    pub proposed_start: Timestamp,
    pub proposed_end: Timestamp,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `roll_call/open` and `roll_call/reopen`
///
/// `opens` names the roll call being opened; `update_id` is its new id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRollCall {
    pub update_id: String,
    pub opens: String,
    pub opened_at: Timestamp,
}

/// `roll_call/close`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseRollCall {
    pub update_id: String,
    pub closes: String,
    pub closed_at: Timestamp,
    pub attendees: Vec<PublicKey>,
}
