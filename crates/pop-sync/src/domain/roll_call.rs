//! Roll calls: attendance events.
//!
//! A roll call is re-identified on every transition; `persistent_id` is the
//! id of the create message and never changes.

use crate::error::{SyncError, SyncResult};
use pop_types::data::{CloseRollCall, CreateRollCall, OpenRollCall};
use pop_types::{PublicKey, Timestamp};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RollCallState {
    Created,
    Opened,
    Closed,
}

impl fmt::Display for RollCallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "CREATED",
            Self::Opened => "OPENED",
            Self::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollCall {
    pub id: String,
    pub persistent_id: String,
    pub name: String,
    pub creation: Timestamp,
    pub start: Timestamp,
    pub end: Timestamp,
    pub location: String,
    pub description: Option<String>,
    pub state: RollCallState,
    pub attendees: BTreeSet<PublicKey>,
}

impl RollCall {
    pub fn from_create(create: &CreateRollCall) -> Self {
        Self {
            id: create.id.clone(),
            persistent_id: create.id.clone(),
            name: create.name.clone(),
            creation: create.creation,
            start: create.proposed_start,
            end: create.proposed_end,
            location: create.location.clone(),
            description: create.description.clone(),
            state: RollCallState::Created,
            attendees: BTreeSet::new(),
        }
    }

    /// Next version after an open (`reopen == false`) or a reopen.
    ///
    /// Open is only valid from CREATED, reopen only from CLOSED.
    pub fn opened(&self, open: &OpenRollCall, reopen: bool) -> SyncResult<Self> {
        let required = if reopen {
            RollCallState::Closed
        } else {
            RollCallState::Created
        };
        if self.state != required {
            return Err(SyncError::DataHandling(format!(
                "cannot {} roll call {} in state {}",
                if reopen { "reopen" } else { "open" },
                self.id,
                self.state
            )));
        }
        Ok(Self {
            id: open.update_id.clone(),
            start: open.opened_at,
            state: RollCallState::Opened,
            ..self.clone()
        })
    }

    /// Next version after a close. Attendees accumulate across reopen cycles.
    pub fn closed(&self, close: &CloseRollCall) -> SyncResult<Self> {
        if self.state != RollCallState::Opened {
            return Err(SyncError::DataHandling(format!(
                "cannot close roll call {} in state {}",
                self.id, self.state
            )));
        }
        let mut attendees = self.attendees.clone();
        attendees.extend(close.attendees.iter().filter(|k| !k.is_empty()).cloned());
        Ok(Self {
            id: close.update_id.clone(),
            end: close.closed_at,
            state: RollCallState::Closed,
            attendees,
            ..self.clone()
        })
    }
}
