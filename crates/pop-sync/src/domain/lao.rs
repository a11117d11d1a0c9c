//! The LAO aggregate.
//!
//! A `Lao` value is never shared mutably: the repository clones it, applies
//! one change and swaps the new value in, so every `Arc<Lao>` handed out is a
//! consistent snapshot.

use super::consensus::{ConsensusNode, ElectInstance, NodeState};
use super::election::Election;
use super::roll_call::RollCall;
use super::witness::WitnessMessage;
use pop_types::{Channel, MessageId, PublicKey, Timestamp};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A witnessed update not yet consolidated by a state message.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PendingUpdate {
    pub modification_time: Timestamp,
    pub message_id: MessageId,
}

/// Backend server announced by a greet message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Server {
    pub address: String,
    pub backend: PublicKey,
    pub frontend: PublicKey,
    pub peers: Vec<String>,
}

/// The consolidated fields of an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaoMetadata {
    pub name: String,
    pub witnesses: BTreeSet<PublicKey>,
    pub last_modified: Timestamp,
    pub modification_id: MessageId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lao {
    pub id: String,
    pub channel: Channel,
    pub name: String,
    pub creation: Timestamp,
    pub last_modified: Timestamp,
    pub organizer: PublicKey,
    pub witnesses: BTreeSet<PublicKey>,
    pub modification_id: Option<MessageId>,
    pub pending_updates: BTreeSet<PendingUpdate>,
    pub witness_messages: HashMap<MessageId, WitnessMessage>,
    /// Keyed by the current roll call id
    pub roll_calls: HashMap<String, RollCall>,
    pub elections: HashMap<String, Election>,
    /// Keyed by the Elect message id
    pub elect_instances: HashMap<MessageId, ElectInstance>,
    pub nodes: BTreeMap<PublicKey, ConsensusNode>,
    /// Keyed by server address
    pub servers: BTreeMap<String, Server>,
}

impl Lao {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        creation: Timestamp,
        organizer: PublicKey,
        witnesses: impl IntoIterator<Item = PublicKey>,
    ) -> Self {
        let id = id.into();
        let mut lao = Self {
            channel: Channel::lao(&id),
            id,
            name: name.into(),
            creation,
            last_modified: creation,
            organizer,
            witnesses: BTreeSet::new(),
            modification_id: None,
            pending_updates: BTreeSet::new(),
            witness_messages: HashMap::new(),
            roll_calls: HashMap::new(),
            elections: HashMap::new(),
            elect_instances: HashMap::new(),
            nodes: BTreeMap::new(),
            servers: BTreeMap::new(),
        };
        lao.set_witnesses(witnesses);
        lao
    }

    /// Replace the witness set. Empty keys are dropped; every current
    /// participant gets a consensus node, earlier nodes are kept.
    pub fn set_witnesses(&mut self, witnesses: impl IntoIterator<Item = PublicKey>) {
        self.witnesses = witnesses.into_iter().filter(|w| !w.is_empty()).collect();
        for key in self.participants() {
            self.nodes
                .entry(key.clone())
                .or_insert_with(|| ConsensusNode::new(key));
        }
    }

    /// Witnesses ∪ {organizer}
    #[must_use]
    pub fn participants(&self) -> BTreeSet<PublicKey> {
        let mut keys = self.witnesses.clone();
        keys.insert(self.organizer.clone());
        keys
    }

    #[must_use]
    pub fn is_organizer(&self, key: &PublicKey) -> bool {
        &self.organizer == key
    }

    #[must_use]
    pub fn is_witness(&self, key: &PublicKey) -> bool {
        self.witnesses.contains(key)
    }

    #[must_use]
    pub fn is_participant(&self, key: &PublicKey) -> bool {
        self.is_organizer(key) || self.is_witness(key)
    }

    /// Apply consolidated metadata and drop the pending updates it covers.
    pub fn apply_metadata(&mut self, metadata: LaoMetadata) {
        self.name = metadata.name;
        self.set_witnesses(metadata.witnesses);
        self.last_modified = metadata.last_modified;
        self.modification_id = Some(metadata.modification_id);

        let cutoff = self.last_modified;
        self.pending_updates
            .retain(|pending| pending.modification_time > cutoff);
    }

    #[must_use]
    pub fn roll_call(&self, id: &str) -> Option<&RollCall> {
        self.roll_calls.get(id)
    }

    #[must_use]
    pub fn roll_call_by_persistent_id(&self, persistent_id: &str) -> Option<&RollCall> {
        self.roll_calls
            .values()
            .find(|rc| rc.persistent_id == persistent_id)
    }

    /// Insert `roll_call`, removing the version it supersedes.
    pub fn upsert_roll_call(&mut self, previous_id: Option<&str>, roll_call: RollCall) {
        if let Some(previous) = previous_id {
            self.roll_calls.remove(previous);
        }
        // any stale version under another id goes too
        self.roll_calls
            .retain(|_, rc| rc.persistent_id != roll_call.persistent_id);
        self.roll_calls.insert(roll_call.id.clone(), roll_call);
    }

    /// Store an Elect instance and make it the latest one for each of its nodes.
    pub fn start_elect(&mut self, instance: ElectInstance) {
        for key in &instance.nodes {
            let node = self
                .nodes
                .entry(key.clone())
                .or_insert_with(|| ConsensusNode::new(key.clone()));
            node.last_elect
                .insert(instance.instance_id.clone(), instance.message_id.clone());
        }
        self.elect_instances
            .insert(instance.message_id.clone(), instance);
    }

    /// Record that `acceptor` accepted the Elect `elect_id` with `accept_id`.
    ///
    /// # Returns
    ///
    /// `None` if the Elect is unknown.
    pub fn record_elect_accept(
        &mut self,
        elect_id: &MessageId,
        acceptor: &PublicKey,
        accept_id: &MessageId,
    ) -> Option<()> {
        let instance = self.elect_instances.get_mut(elect_id)?;
        instance
            .acceptor_responses
            .insert(acceptor.clone(), accept_id.clone());
        if let Some(node) = self.nodes.get_mut(acceptor) {
            node.accepted.insert(elect_id.clone());
        }
        Some(())
    }

    /// State of `key`'s latest instance for `instance_id`.
    #[must_use]
    pub fn node_state(&self, key: &PublicKey, instance_id: &str) -> NodeState {
        self.nodes
            .get(key)
            .and_then(|node| node.last_elect.get(instance_id))
            .and_then(|elect_id| self.elect_instances.get(elect_id))
            .map_or(NodeState::Waiting, |instance| instance.state.into())
    }
}
