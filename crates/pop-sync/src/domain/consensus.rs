//! Consensus instances and the per-node view of them.

use pop_types::data::ConsensusKey;
use pop_types::{Channel, MessageId, PublicKey, Timestamp};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// State of one Elect instance. ACCEPTED and FAILED are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstanceState {
    Starting,
    Accepted,
    Failed,
}

impl InstanceState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Starting)
    }
}

/// State of a node for one instance id; WAITING when it has no instance yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeState {
    Waiting,
    Starting,
    Accepted,
    Failed,
}

impl From<InstanceState> for NodeState {
    fn from(state: InstanceState) -> Self {
        match state {
            InstanceState::Starting => Self::Starting,
            InstanceState::Accepted => Self::Accepted,
            InstanceState::Failed => Self::Failed,
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Waiting => "WAITING",
            Self::Starting => "STARTING",
            Self::Accepted => "ACCEPTED",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// One run of Elect / Elect-Accept / Learn, keyed by the Elect message id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElectInstance {
    pub message_id: MessageId,
    pub channel: Channel,
    pub proposer: PublicKey,
    pub creation: Timestamp,
    pub value: String,
    pub key: ConsensusKey,
    pub instance_id: String,
    pub nodes: BTreeSet<PublicKey>,
    /// Acceptor → id of its accepting message
    pub acceptor_responses: BTreeMap<PublicKey, MessageId>,
    pub state: InstanceState,
}

impl ElectInstance {
    /// Move to a terminal state.
    ///
    /// # Returns
    ///
    /// `false` if the instance was already terminal; its state is left as is.
    pub fn decide(&mut self, state: InstanceState) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = state;
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusNode {
    pub public_key: PublicKey,
    /// Instance id → Elect message id of the latest instance this node is part of
    pub last_elect: BTreeMap<String, MessageId>,
    /// Elect message ids this node accepted
    pub accepted: BTreeSet<MessageId>,
}

impl ConsensusNode {
    pub fn new(public_key: PublicKey) -> Self {
        Self {
            public_key,
            last_elect: BTreeMap::new(),
            accepted: BTreeSet::new(),
        }
    }
}
