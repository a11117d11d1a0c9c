//! # Consensus Engine
//!
//! Elect / Elect-Accept / Learn over the consensus channel of a LAO.
//!
//! ```text
//! Elect ──→ [STARTING] ──Learn(decision=true)──→ [ACCEPTED]
//!               │
//!               └──────────Failure─────────────→ [FAILED]
//! ```
//!
//! ACCEPTED and FAILED are terminal. A node's state for an instance id is
//! the state of the latest Elect it takes part in, or WAITING.

use crate::domain::ids;
use crate::domain::{ElectInstance, InstanceState, NodeState};
use crate::error::{SyncError, SyncResult};
use crate::metrics;
use crate::repository::LaoRepository;
use pop_types::data::{ConsensusElect, ConsensusElectAccept, ConsensusFailure, ConsensusLearn};
use pop_types::{Channel, CryptoProvider, MessageId, PublicKey};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ConsensusEngine {
    repository: Arc<LaoRepository>,
    crypto: Arc<dyn CryptoProvider>,
}

impl ConsensusEngine {
    pub fn new(repository: Arc<LaoRepository>, crypto: Arc<dyn CryptoProvider>) -> Self {
        Self { repository, crypto }
    }

    /// Start a new instance for `elect`; its nodes are the LAO's witnesses
    /// and organizer at this moment.
    pub fn handle_elect(
        &self,
        lao_id: &str,
        channel: &Channel,
        message_id: &MessageId,
        proposer: &PublicKey,
        elect: &ConsensusElect,
    ) -> SyncResult<ElectInstance> {
        let lao = self.repository.get_lao_view(lao_id)?;
        let instance = ElectInstance {
            message_id: message_id.clone(),
            channel: channel.clone(),
            proposer: proposer.clone(),
            creation: elect.created_at,
            value: elect.value.clone(),
            key: elect.key.clone(),
            instance_id: ids::instance_id(self.crypto.as_ref(), &elect.key),
            nodes: lao.participants(),
            acceptor_responses: BTreeMap::new(),
            state: InstanceState::Starting,
        };
        info!(
            lao_id,
            instance_id = %instance.instance_id,
            elect_id = %message_id,
            value = %elect.value,
            "Consensus instance started"
        );
        self.repository
            .update_elect_instance(lao_id, instance.clone())?;
        Ok(instance)
    }

    /// Record an acceptor's answer to an Elect.
    ///
    /// `InvalidMessageId` if the Elect is not known yet. Rejections are only
    /// logged.
    pub fn handle_elect_accept(
        &self,
        lao_id: &str,
        message_id: &MessageId,
        sender: &PublicKey,
        accept: &ConsensusElectAccept,
    ) -> SyncResult<()> {
        if !accept.accept {
            let lao = self.repository.get_lao_view(lao_id)?;
            if !lao.elect_instances.contains_key(&accept.message_id) {
                return Err(SyncError::InvalidMessageId(accept.message_id.clone()));
            }
            warn!(lao_id, elect_id = %accept.message_id, acceptor = %sender, "Elect rejected by acceptor");
            return Ok(());
        }
        self.repository
            .record_elect_accept(lao_id, &accept.message_id, sender, message_id)?;
        debug!(lao_id, elect_id = %accept.message_id, acceptor = %sender, "Elect accepted");
        Ok(())
    }

    pub fn handle_learn(&self, lao_id: &str, learn: &ConsensusLearn) -> SyncResult<InstanceState> {
        if !learn.value.decision {
            let lao = self.repository.get_lao_view(lao_id)?;
            let instance = lao
                .elect_instances
                .get(&learn.message_id)
                .ok_or_else(|| SyncError::InvalidMessageId(learn.message_id.clone()))?;
            debug!(lao_id, elect_id = %learn.message_id, "Learn without decision");
            return Ok(instance.state);
        }
        self.decide(lao_id, &learn.message_id, InstanceState::Accepted)
    }

    pub fn handle_failure(&self, lao_id: &str, failure: &ConsensusFailure) -> SyncResult<InstanceState> {
        self.decide(lao_id, &failure.message_id, InstanceState::Failed)
    }

    fn decide(&self, lao_id: &str, elect_id: &MessageId, target: InstanceState) -> SyncResult<InstanceState> {
        let (state, changed) = self
            .repository
            .decide_elect_instance(lao_id, elect_id, target)?;
        if changed {
            info!(lao_id, elect_id = %elect_id, state = ?state, "Consensus instance decided");
            metrics::record_consensus_decision(if state == InstanceState::Accepted {
                "accepted"
            } else {
                "failed"
            });
        } else {
            debug!(lao_id, elect_id = %elect_id, state = ?state, "Instance already terminal");
        }
        Ok(state)
    }

    /// State of `node` for `instance_id`.
    pub fn node_state(&self, lao_id: &str, node: &PublicKey, instance_id: &str) -> SyncResult<NodeState> {
        Ok(self.repository.get_lao_view(lao_id)?.node_state(node, instance_id))
    }
}
