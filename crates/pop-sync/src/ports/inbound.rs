//! Driving Ports (API - Inbound)

use crate::dispatcher::ProcessOutcome;
use crate::domain::{Election, Lao, NodeState, RollCall};
use crate::error::SyncResult;
use async_trait::async_trait;
use pop_bus::SnapshotStream;
use pop_types::{Channel, MessageId, PublicKey, SignedMessage};
use std::sync::Arc;

/// Primary sync API
///
/// Feeds envelopes from the transport into the engine and exposes the
/// resulting state.
#[async_trait]
pub trait SyncApi: Send + Sync {
    /// Handle one envelope delivered on `channel`, then replay deferred ones.
    async fn on_broadcast(&self, channel: &Channel, message: SignedMessage) -> ProcessOutcome;

    /// Join `channel` and handle its full history.
    async fn subscribe(&self, channel: &Channel) -> SyncResult<Vec<ProcessOutcome>>;

    /// Handle the full history of an already joined `channel`.
    async fn catchup(&self, channel: &Channel) -> SyncResult<Vec<ProcessOutcome>>;

    /// Sign the given message as a witness of the LAO and broadcast the signature.
    async fn witness_message(&self, lao_id: &str, message_id: &MessageId) -> SyncResult<MessageId>;

    fn get_lao_view(&self, lao_id: &str) -> SyncResult<Arc<Lao>>;

    fn get_roll_call_with_id(&self, lao_id: &str, roll_call_id: &str) -> SyncResult<RollCall>;

    fn get_election_by_channel(&self, channel: &Channel) -> SyncResult<Election>;

    /// Consensus state of `node` for `instance_id` in the LAO.
    fn node_state(&self, lao_id: &str, node: &PublicKey, instance_id: &str) -> SyncResult<NodeState>;

    /// Snapshot stream of one LAO.
    fn observe_lao(&self, lao_id: &str) -> SyncResult<SnapshotStream<Arc<Lao>>>;
}
