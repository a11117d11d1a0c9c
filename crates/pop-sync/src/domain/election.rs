//! Elections.
//!
//! State only moves forward: CREATED → OPENED → CLOSED → RESULTS_READY.
//! Votes are kept per sender; a sender's newer vote replaces the older one.

use crate::error::{SyncError, SyncResult};
use pop_types::data::{
    CastVote, ElectionQuestion, ElectionResult, ElectionSetup, ElectionVersion, QuestionResult, Vote,
};
use pop_types::{Channel, MessageId, PublicKey, Timestamp};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElectionState {
    Created,
    Opened,
    Closed,
    ResultsReady,
}

impl fmt::Display for ElectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "CREATED",
            Self::Opened => "OPENED",
            Self::Closed => "CLOSED",
            Self::ResultsReady => "RESULTS_READY",
        };
        f.write_str(name)
    }
}

/// Last accepted vote of one sender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteRecord {
    pub message_id: MessageId,
    pub created_at: Timestamp,
    pub votes: Vec<Vote>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Election {
    pub id: String,
    pub channel: Channel,
    pub name: String,
    pub creation: Timestamp,
    pub start: Timestamp,
    pub end: Timestamp,
    pub version: ElectionVersion,
    pub state: ElectionState,
    pub questions: Vec<ElectionQuestion>,
    pub votes: BTreeMap<PublicKey, VoteRecord>,
    /// Question id → tally
    pub results: BTreeMap<String, Vec<QuestionResult>>,
    pub election_key: Option<String>,
}

impl Election {
    pub fn from_setup(setup: &ElectionSetup, lao_channel: &Channel) -> Self {
        Self {
            id: setup.id.clone(),
            channel: lao_channel.sub_channel(&setup.id),
            name: setup.name.clone(),
            creation: setup.created_at,
            start: setup.start_time,
            end: setup.end_time,
            version: setup.version,
            state: ElectionState::Created,
            questions: setup.questions.clone(),
            votes: BTreeMap::new(),
            results: BTreeMap::new(),
            election_key: None,
        }
    }

    pub fn open(&mut self, opened_at: Timestamp) -> SyncResult<()> {
        if self.state != ElectionState::Created {
            return Err(self.bad_transition("open"));
        }
        self.state = ElectionState::Opened;
        self.start = opened_at;
        Ok(())
    }

    /// Record `cast` as `sender`'s vote.
    ///
    /// # Returns
    ///
    /// `false` when an already recorded vote of the sender is newer.
    pub fn cast_vote(&mut self, sender: &PublicKey, message_id: &MessageId, cast: &CastVote) -> SyncResult<bool> {
        if cast.created_at < self.creation {
            return Err(SyncError::DataHandling(format!(
                "vote created at {} before election {} was set up at {}",
                cast.created_at, self.id, self.creation
            )));
        }
        let closed = self.state >= ElectionState::Closed;
        if closed && cast.created_at > self.end {
            return Err(SyncError::DataHandling(format!(
                "vote created at {} after end of election {}",
                cast.created_at, self.id
            )));
        }

        if let Some(previous) = self.votes.get(sender) {
            if previous.created_at > cast.created_at {
                return Ok(false);
            }
        }
        self.votes.insert(
            sender.clone(),
            VoteRecord {
                message_id: message_id.clone(),
                created_at: cast.created_at,
                votes: cast.votes.clone(),
            },
        );
        Ok(true)
    }

    pub fn end(&mut self) -> SyncResult<()> {
        match self.state {
            ElectionState::ResultsReady => Err(self.bad_transition("end")),
            _ => {
                self.state = ElectionState::Closed;
                Ok(())
            }
        }
    }

    pub fn publish_results(&mut self, result: &ElectionResult) -> SyncResult<()> {
        if result.questions.is_empty() {
            return Err(SyncError::DataHandling(format!(
                "empty result for election {}",
                self.id
            )));
        }
        self.results = result
            .questions
            .iter()
            .map(|q| (q.id.clone(), q.result.clone()))
            .collect();
        self.state = ElectionState::ResultsReady;
        Ok(())
    }

    fn bad_transition(&self, action: &str) -> SyncError {
        SyncError::DataHandling(format!(
            "cannot {} election {} in state {}",
            action, self.id, self.state
        ))
    }
}
