//! # LAO State Repository
//!
//! Authoritative copy of every LAO known to this node.
//!
//! Each LAO lives in a [`SnapshotCell`]; a mutation clones the current value,
//! applies the change and swaps the clone in under the map's write lock.
//! Readers holding an older `Arc<Lao>` keep a consistent view, and observers
//! get the new snapshot pushed to them.
//!
//! Mutations are reserved to handlers and engines of this crate; everything
//! outside sees the read surface only.

use crate::domain::{
    Election, ElectInstance, InstanceState, Lao, LaoMetadata, PendingUpdate, RollCall, Server,
    WitnessMessage,
};
use crate::error::{SyncError, SyncResult};
use crate::store::MessageStore;
use parking_lot::RwLock;
use pop_bus::{SnapshotCell, SnapshotStream};
use pop_types::data::StateLao;
use pop_types::envelope::witness_payload;
use pop_types::{Channel, CryptoProvider, MessageId, PublicKey};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Default)]
pub struct LaoRepository {
    laos: RwLock<HashMap<String, SnapshotCell<Arc<Lao>>>>,
}

impl LaoRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // READ SURFACE
    // =========================================================================

    pub fn get_lao_view(&self, lao_id: &str) -> SyncResult<Arc<Lao>> {
        self.laos
            .read()
            .get(lao_id)
            .map(SnapshotCell::get)
            .ok_or_else(|| SyncError::UnknownLao(lao_id.to_string()))
    }

    pub fn get_lao_view_by_channel(&self, channel: &Channel) -> SyncResult<Arc<Lao>> {
        let lao_id = channel
            .lao_id()
            .ok_or_else(|| SyncError::UnknownLao(channel.to_string()))?;
        self.get_lao_view(lao_id)
    }

    pub fn get_roll_call_with_id(&self, lao_id: &str, roll_call_id: &str) -> SyncResult<RollCall> {
        self.get_lao_view(lao_id)?
            .roll_call(roll_call_id)
            .cloned()
            .ok_or_else(|| SyncError::UnknownRollCall(roll_call_id.to_string()))
    }

    /// Election owning `/root/<lao>/<election>`.
    pub fn get_election_by_channel(&self, channel: &Channel) -> SyncResult<Election> {
        let lao = self.get_lao_view_by_channel(channel)?;
        let election_id = channel
            .lao_sub_segment()
            .ok_or_else(|| SyncError::UnknownElection(channel.to_string()))?;
        lao.elections
            .get(election_id)
            .cloned()
            .ok_or_else(|| SyncError::UnknownElection(election_id.to_string()))
    }

    /// Ids of every known LAO, sorted.
    #[must_use]
    pub fn lao_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.laos.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Push stream of snapshots of one LAO, starting with the current one.
    pub fn subscribe(&self, lao_id: &str) -> SyncResult<SnapshotStream<Arc<Lao>>> {
        self.laos
            .read()
            .get(lao_id)
            .map(SnapshotCell::subscribe)
            .ok_or_else(|| SyncError::UnknownLao(lao_id.to_string()))
    }

    // =========================================================================
    // MUTATION SURFACE
    // =========================================================================

    /// Clone, mutate, swap. Nothing is published if `f` fails.
    fn update<R>(&self, lao_id: &str, f: impl FnOnce(&mut Lao) -> SyncResult<R>) -> SyncResult<R> {
        let laos = self.laos.write();
        let cell = laos
            .get(lao_id)
            .ok_or_else(|| SyncError::UnknownLao(lao_id.to_string()))?;
        let mut next = Lao::clone(&cell.get());
        let out = f(&mut next)?;
        cell.set(Arc::new(next));
        Ok(out)
    }

    pub(crate) fn create_lao(&self, lao: Lao) -> SyncResult<Arc<Lao>> {
        let mut laos = self.laos.write();
        if laos.contains_key(&lao.id) {
            return Err(SyncError::DataHandling(format!("LAO {} already exists", lao.id)));
        }
        info!(lao_id = %lao.id, name = %lao.name, witnesses = lao.witnesses.len(), "LAO created");
        let snapshot = Arc::new(lao);
        laos.insert(snapshot.id.clone(), SnapshotCell::new(snapshot.clone()));
        Ok(snapshot)
    }

    pub(crate) fn update_metadata(&self, lao_id: &str, metadata: LaoMetadata) -> SyncResult<()> {
        self.update(lao_id, |lao| {
            info!(
                lao_id = %lao.id,
                name = %metadata.name,
                last_modified = metadata.last_modified,
                "LAO metadata updated"
            );
            lao.apply_metadata(metadata);
            Ok(())
        })
    }

    pub(crate) fn upsert_roll_call(
        &self,
        lao_id: &str,
        previous_id: Option<&str>,
        roll_call: RollCall,
    ) -> SyncResult<()> {
        self.update(lao_id, |lao| {
            lao.upsert_roll_call(previous_id, roll_call);
            Ok(())
        })
    }

    pub(crate) fn upsert_election(&self, lao_id: &str, election: Election) -> SyncResult<()> {
        self.update(lao_id, |lao| {
            lao.elections.insert(election.id.clone(), election);
            Ok(())
        })
    }

    /// Mutate one election in place.
    pub(crate) fn update_election<R>(
        &self,
        lao_id: &str,
        election_id: &str,
        f: impl FnOnce(&mut Election) -> SyncResult<R>,
    ) -> SyncResult<R> {
        self.update(lao_id, |lao| {
            let election = lao
                .elections
                .get_mut(election_id)
                .ok_or_else(|| SyncError::UnknownElection(election_id.to_string()))?;
            f(election)
        })
    }

    /// Register a signing request. Signatures already collected for the same
    /// message id are kept.
    pub(crate) fn add_witness_message(&self, lao_id: &str, message: WitnessMessage) -> SyncResult<()> {
        self.update(lao_id, |lao| {
            lao.witness_messages
                .entry(message.message_id.clone())
                .or_insert(message);
            Ok(())
        })
    }

    /// Record `witness` as a signer of `message_id`.
    ///
    /// # Returns
    ///
    /// `false` if that witness had already signed.
    pub(crate) fn add_witness_signature(
        &self,
        lao_id: &str,
        message_id: &MessageId,
        witness: &PublicKey,
    ) -> SyncResult<bool> {
        self.update(lao_id, |lao| {
            let message = lao
                .witness_messages
                .get_mut(message_id)
                .ok_or_else(|| SyncError::UnknownWitnessMessage(message_id.clone()))?;
            Ok(message.witnesses.insert(witness.clone()))
        })
    }

    /// Flag the action gated by `message_id` as run.
    pub(crate) fn mark_witness_fired(&self, lao_id: &str, message_id: &MessageId) -> SyncResult<()> {
        self.update(lao_id, |lao| {
            if let Some(message) = lao.witness_messages.get_mut(message_id) {
                message.fired = true;
            }
            Ok(())
        })
    }

    pub(crate) fn add_pending_update(&self, lao_id: &str, pending: PendingUpdate) -> SyncResult<()> {
        self.update(lao_id, |lao| {
            lao.pending_updates.insert(pending);
            Ok(())
        })
    }

    /// Store a new Elect instance and point its nodes at it.
    pub(crate) fn update_elect_instance(&self, lao_id: &str, instance: ElectInstance) -> SyncResult<()> {
        self.update(lao_id, |lao| {
            lao.start_elect(instance);
            Ok(())
        })
    }

    pub(crate) fn record_elect_accept(
        &self,
        lao_id: &str,
        elect_id: &MessageId,
        acceptor: &PublicKey,
        accept_id: &MessageId,
    ) -> SyncResult<()> {
        self.update(lao_id, |lao| {
            lao.record_elect_accept(elect_id, acceptor, accept_id)
                .ok_or_else(|| SyncError::InvalidMessageId(elect_id.clone()))
        })
    }

    /// Move an Elect instance to a terminal state.
    ///
    /// # Returns
    ///
    /// The instance's state afterwards and whether it changed.
    pub(crate) fn decide_elect_instance(
        &self,
        lao_id: &str,
        elect_id: &MessageId,
        state: InstanceState,
    ) -> SyncResult<(InstanceState, bool)> {
        self.update(lao_id, |lao| {
            let instance = lao
                .elect_instances
                .get_mut(elect_id)
                .ok_or_else(|| SyncError::InvalidMessageId(elect_id.clone()))?;
            let changed = instance.decide(state);
            Ok((instance.state, changed))
        })
    }

    pub(crate) fn add_server(&self, lao_id: &str, server: Server) -> SyncResult<()> {
        self.update(lao_id, |lao| {
            debug!(lao_id = %lao.id, address = %server.address, "Server greeted");
            lao.servers.insert(server.address.clone(), server);
            Ok(())
        })
    }

    /// Apply a state message.
    ///
    /// 1. The modification it consolidates must be stored, else
    ///    `InvalidMessageId` (the update has not arrived yet).
    /// 2. Every modification signature must verify over the modification id.
    /// 3. Name, witnesses, last-modified time and modification id are applied
    ///    in one swap; pending updates up to the new time are dropped.
    ///
    /// A state older than the current one is verified but not applied.
    ///
    /// # Returns
    ///
    /// Whether the state was applied.
    pub(crate) fn consolidate_state(
        &self,
        state: &StateLao,
        store: &MessageStore,
        crypto: &dyn CryptoProvider,
    ) -> SyncResult<bool> {
        if !store.contains(&state.modification_id) {
            return Err(SyncError::InvalidMessageId(state.modification_id.clone()));
        }

        let signed = witness_payload(&state.modification_id);
        for pair in &state.modification_signatures {
            if !crypto.verify(&pair.witness, &pair.signature, &signed) {
                return Err(SyncError::InvalidSignature(format!(
                    "modification signature of {} over {}",
                    pair.witness, state.modification_id
                )));
            }
        }

        self.update(&state.id, |lao| {
            if state.last_modified < lao.last_modified {
                debug!(
                    lao_id = %lao.id,
                    state_time = state.last_modified,
                    current_time = lao.last_modified,
                    "Stale state message ignored"
                );
                return Ok(false);
            }
            lao.apply_metadata(LaoMetadata {
                name: state.name.clone(),
                witnesses: state.witnesses.iter().cloned().collect(),
                last_modified: state.last_modified,
                modification_id: state.modification_id.clone(),
            });
            info!(lao_id = %lao.id, last_modified = lao.last_modified, "LAO state consolidated");
            Ok(true)
        })
    }
}
