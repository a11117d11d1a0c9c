//! # Witnessing Engine
//!
//! Sensitive changes are committed only once every current witness of the
//! LAO has signed the message that requested them.
//!
//! ```text
//! gated message ──register──→ [PENDING] ──signatures ⊇ witnesses──→ [FIRED]
//!                    │                                                  ↑
//!                    └──────────── no witnesses ────────────────────────┘
//! ```
//!
//! An action fires at most once per (LAO, message id). The threshold is
//! evaluated against the witness set current at each signature, so a change
//! of witnesses while a message is pending moves the goalposts.

use crate::domain::{Election, Lao, RollCall, WitnessMessage};
use crate::error::{SyncError, SyncResult};
use crate::metrics;
use crate::repository::LaoRepository;
use crate::store::MessageStore;
use parking_lot::Mutex;
use pop_types::data::UpdateLao;
use pop_types::envelope::witness_payload;
use pop_types::{CryptoProvider, MessageId, PublicKey, Signature, WitnessSignature};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A change waiting for witness signatures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WitnessedAction {
    /// Insert a roll call version, replacing `previous_id` if set
    CommitRollCall {
        lao_id: String,
        previous_id: Option<String>,
        roll_call: RollCall,
    },
    CommitElection { lao_id: String, election: Election },
    /// Apply an update once its witnesses agree
    ConsolidateUpdate {
        lao_id: String,
        message_id: MessageId,
        update: UpdateLao,
    },
}

impl WitnessedAction {
    #[must_use]
    pub fn lao_id(&self) -> &str {
        match self {
            Self::CommitRollCall { lao_id, .. }
            | Self::CommitElection { lao_id, .. }
            | Self::ConsolidateUpdate { lao_id, .. } => lao_id,
        }
    }
}

type ActionKey = (String, MessageId);

pub struct WitnessingEngine {
    repository: Arc<LaoRepository>,
    store: Arc<MessageStore>,
    crypto: Arc<dyn CryptoProvider>,
    /// Actions still waiting; fired ones are flagged on their `WitnessMessage`
    pending: Mutex<BTreeMap<ActionKey, WitnessedAction>>,
}

fn threshold_reached(lao: &Lao, message_id: &MessageId) -> bool {
    if lao.witnesses.is_empty() {
        return true;
    }
    lao.witness_messages
        .get(message_id)
        .is_some_and(|message| message.signed_by_all(&lao.witnesses))
}

fn already_fired(lao: &Lao, message_id: &MessageId) -> bool {
    lao.witness_messages
        .get(message_id)
        .is_some_and(|message| message.fired)
}

impl WitnessingEngine {
    pub fn new(
        repository: Arc<LaoRepository>,
        store: Arc<MessageStore>,
        crypto: Arc<dyn CryptoProvider>,
    ) -> Self {
        Self {
            repository,
            store,
            crypto,
            pending: Mutex::new(BTreeMap::new()),
        }
    }

    /// Register a signing request.
    pub fn add_witness_message(&self, lao_id: &str, message: WitnessMessage) -> SyncResult<()> {
        debug!(lao_id, message_id = %message.message_id, title = %message.title, "Witness message added");
        self.repository.add_witness_message(lao_id, message)
    }

    /// Register `action` to run once `message_id` is signed by every witness.
    ///
    /// # Returns
    ///
    /// The action itself when the threshold is already met (no witnesses,
    /// or every signature arrived first); the caller runs it. `None` when it
    /// is now pending, or when it already fired once.
    pub fn perform_action_when_threshold_reached(
        &self,
        lao_id: &str,
        message_id: &MessageId,
        action: WitnessedAction,
    ) -> SyncResult<Option<WitnessedAction>> {
        let key = (lao_id.to_string(), message_id.clone());
        let mut pending = self.pending.lock();
        let lao = self.repository.get_lao_view(lao_id)?;

        if already_fired(&lao, message_id) {
            debug!(lao_id, message_id = %message_id, "Witnessed action already fired");
            return Ok(None);
        }
        if threshold_reached(&lao, message_id) {
            pending.remove(&key);
            self.repository.mark_witness_fired(lao_id, message_id)?;
            metrics::record_threshold_reached();
            return Ok(Some(action));
        }
        pending.insert(key, action);
        Ok(None)
    }

    /// Count `witness`'s signature over `message_id`.
    ///
    /// # Errors
    ///
    /// - `UnknownWitnessMessage` if nobody asked to sign `message_id` (yet)
    /// - `InvalidSignature` if the signature does not verify
    /// - `NotAWitness` if the signer is neither witness nor organizer
    ///
    /// # Returns
    ///
    /// Every action of the LAO whose threshold is now met, in key order.
    pub fn handle_signature(
        &self,
        lao_id: &str,
        message_id: &MessageId,
        witness: &PublicKey,
        signature: &Signature,
    ) -> SyncResult<Vec<WitnessedAction>> {
        let lao = self.repository.get_lao_view(lao_id)?;
        if !lao.witness_messages.contains_key(message_id) {
            return Err(SyncError::UnknownWitnessMessage(message_id.clone()));
        }
        if !self
            .crypto
            .verify(witness, signature, &witness_payload(message_id))
        {
            return Err(SyncError::InvalidSignature(format!(
                "witness signature of {witness} over {message_id}"
            )));
        }
        if !lao.is_participant(witness) {
            return Err(SyncError::NotAWitness(witness.clone()));
        }

        if !self
            .repository
            .add_witness_signature(lao_id, message_id, witness)?
        {
            debug!(lao_id, message_id = %message_id, witness = %witness, "Duplicate witness signature");
            return Ok(Vec::new());
        }
        self.store.add_witness_signature(
            message_id,
            WitnessSignature::new(witness.clone(), signature.clone()),
        );
        debug!(lao_id, message_id = %message_id, witness = %witness, "Witness signature recorded");

        self.reevaluate(lao_id)
    }

    /// Fire every pending action of the LAO whose threshold is met.
    ///
    /// Needed after the witness set changes.
    pub fn reevaluate(&self, lao_id: &str) -> SyncResult<Vec<WitnessedAction>> {
        let mut pending = self.pending.lock();
        let lao = self.repository.get_lao_view(lao_id)?;

        let ready: Vec<ActionKey> = pending
            .keys()
            .filter(|(id, message_id)| id == lao_id && threshold_reached(&lao, message_id))
            .cloned()
            .collect();

        let mut fired = Vec::with_capacity(ready.len());
        for key in ready {
            if let Some(action) = pending.remove(&key) {
                info!(lao_id, message_id = %key.1, "Witness threshold reached");
                metrics::record_threshold_reached();
                self.repository.mark_witness_fired(lao_id, &key.1)?;
                fired.push(action);
            }
        }
        Ok(fired)
    }

    /// Number of actions still waiting for signatures.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}
