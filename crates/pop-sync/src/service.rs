//! # Sync Service
//!
//! One node's engine wired to a transport.
//!
//! ```text
//!  Transport deliveries ──┐
//!                         ├──→ Dispatcher (one at a time) ──→ Repository ──→ snapshot streams
//!  catchup inbox ─────────┘          │
//!         ↑                          └──→ spawned side effects (subscribe, publish)
//!         └──────────────────────────────────────┘
//! ```
//!
//! Envelopes are handled one at a time behind an async mutex; reads go
//! straight to the repository and never wait for it.

use crate::adapters::TransportSender;
use crate::config::SyncConfig;
use crate::consensus::ConsensusEngine;
use crate::dispatcher::{Dispatcher, ProcessOutcome};
use crate::domain::{Election, Lao, NodeState, RollCall};
use crate::error::{SyncError, SyncResult};
use crate::handlers::SyncContext;
use crate::ports::inbound::SyncApi;
use crate::ports::outbound::MessageSender;
use crate::repository::LaoRepository;
use async_trait::async_trait;
use pop_bus::{Delivery, SnapshotStream, Subscription, Transport};
use pop_crypto::{Ed25519Provider, KeyPair};
use pop_types::data::WitnessMessageSignature;
use pop_types::envelope::witness_payload;
use pop_types::{Channel, Data, MessageId, PublicKey, SignedMessage};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Consecutive empty polls before [`SyncService::settle`] gives up.
const SETTLE_IDLE_ROUNDS: usize = 16;

pub struct SyncService<T: Transport + 'static> {
    transport: Arc<T>,
    keys: Arc<KeyPair>,
    sender: Arc<TransportSender<T>>,
    dispatcher: Mutex<Dispatcher>,
    repository: Arc<LaoRepository>,
    consensus: Arc<ConsensusEngine>,
    inbox: Mutex<mpsc::UnboundedReceiver<Delivery>>,
}

impl<T: Transport + 'static> SyncService<T> {
    pub fn new(config: SyncConfig, keys: KeyPair, transport: Arc<T>) -> Self {
        let keys = Arc::new(keys);
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let sender = Arc::new(TransportSender::new(transport.clone(), keys.clone(), inbox_tx));
        let cx = SyncContext::new(config, keys.public_key(), Arc::new(Ed25519Provider), sender.clone());
        let repository = cx.repository().clone();
        let consensus = cx.consensus().clone();
        info!(public_key = %keys.public_key(), "Sync service created");

        Self {
            transport,
            keys,
            sender,
            dispatcher: Mutex::new(Dispatcher::new(cx)),
            repository,
            consensus,
            inbox: Mutex::new(inbox_rx),
        }
    }

    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        self.keys.public_key()
    }

    #[must_use]
    pub fn repository(&self) -> &Arc<LaoRepository> {
        &self.repository
    }

    /// Sign `data` with this node's key and broadcast it.
    pub async fn publish(&self, channel: &Channel, data: &Data) -> SyncResult<MessageId> {
        self.sender.publish(channel, data).await
    }

    /// Envelopes waiting for a missing dependency.
    pub async fn deferred_len(&self) -> usize {
        self.dispatcher.lock().await.deferred_len()
    }

    async fn process_batch(&self, channel: &Channel, messages: Vec<SignedMessage>) -> Vec<ProcessOutcome> {
        let mut dispatcher = self.dispatcher.lock().await;
        let outcomes = messages
            .into_iter()
            .map(|message| dispatcher.process(channel, message))
            .collect();
        dispatcher.replay_deferred();
        outcomes
    }

    /// Catch up on every subscribed channel after `deliveries` dropped some.
    async fn recover_lag(&self, deliveries: &mut Subscription) -> usize {
        let lagged = deliveries.take_lagged();
        if lagged == 0 {
            return 0;
        }
        let channels = self.transport.subscribed_channels();
        warn!(lagged, channels = channels.len(), "Deliveries dropped, catching up");
        let mut handled = 0;
        for channel in channels {
            match self.catchup(&channel).await {
                Ok(outcomes) => handled += outcomes.len(),
                Err(e) => warn!(channel = %channel, error = %e, "Catchup after lag failed"),
            }
        }
        handled
    }

    /// Handle everything already delivered, including history pulled in by
    /// the subscriptions handlers request, until nothing new shows up.
    ///
    /// # Returns
    ///
    /// The number of envelopes handled.
    pub async fn settle(&self, deliveries: &mut Subscription) -> usize {
        let mut handled = 0;
        let mut idle = 0;
        while idle < SETTLE_IDLE_ROUNDS {
            let mut batch = deliveries.drain();
            handled += self.recover_lag(deliveries).await;
            {
                let mut inbox = self.inbox.lock().await;
                while let Ok(delivery) = inbox.try_recv() {
                    batch.push(delivery);
                }
            }

            if batch.is_empty() {
                idle += 1;
                tokio::task::yield_now().await;
                continue;
            }
            idle = 0;
            for delivery in batch {
                self.on_broadcast(&delivery.channel, delivery.message).await;
                handled += 1;
            }
        }
        debug!(handled, "Settled");
        handled
    }

    /// Handle deliveries until the transport goes away.
    pub async fn run(self: Arc<Self>, mut deliveries: Subscription) {
        info!(public_key = %self.public_key(), "Sync service running");
        let mut inbox = self.inbox.lock().await;
        loop {
            let delivery = tokio::select! {
                delivery = deliveries.recv() => delivery,
                delivery = inbox.recv() => delivery,
            };
            let Some(delivery) = delivery else {
                break;
            };
            self.recover_lag(&mut deliveries).await;
            self.on_broadcast(&delivery.channel, delivery.message).await;
        }
        info!(public_key = %self.public_key(), "Sync service stopped");
    }
}

#[async_trait]
impl<T: Transport + 'static> SyncApi for SyncService<T> {
    async fn on_broadcast(&self, channel: &Channel, message: SignedMessage) -> ProcessOutcome {
        let mut dispatcher = self.dispatcher.lock().await;
        let outcome = dispatcher.process(channel, message);
        dispatcher.replay_deferred();
        outcome
    }

    async fn subscribe(&self, channel: &Channel) -> SyncResult<Vec<ProcessOutcome>> {
        self.transport.subscribe(channel).await?;
        self.catchup(channel).await
    }

    async fn catchup(&self, channel: &Channel) -> SyncResult<Vec<ProcessOutcome>> {
        let history = self.transport.catchup(channel).await?;
        debug!(channel = %channel, messages = history.len(), "Catching up");
        Ok(self.process_batch(channel, history).await)
    }

    async fn witness_message(&self, lao_id: &str, message_id: &MessageId) -> SyncResult<MessageId> {
        let lao = self.repository.get_lao_view(lao_id)?;
        let own_key = self.public_key();
        if !lao.is_participant(&own_key) {
            return Err(SyncError::NotAWitness(own_key));
        }
        let data = Data::WitnessMessageSignature(WitnessMessageSignature {
            message_id: message_id.clone(),
            signature: self.keys.sign(&witness_payload(message_id)),
        });
        self.publish(&lao.channel, &data).await
    }

    fn get_lao_view(&self, lao_id: &str) -> SyncResult<Arc<Lao>> {
        self.repository.get_lao_view(lao_id)
    }

    fn get_roll_call_with_id(&self, lao_id: &str, roll_call_id: &str) -> SyncResult<RollCall> {
        self.repository.get_roll_call_with_id(lao_id, roll_call_id)
    }

    fn get_election_by_channel(&self, channel: &Channel) -> SyncResult<Election> {
        self.repository.get_election_by_channel(channel)
    }

    fn node_state(&self, lao_id: &str, node: &PublicKey, instance_id: &str) -> SyncResult<NodeState> {
        self.consensus.node_state(lao_id, node, instance_id)
    }

    fn observe_lao(&self, lao_id: &str) -> SyncResult<SnapshotStream<Arc<Lao>>> {
        self.repository.subscribe(lao_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids;
    use pop_bus::InMemoryTransport;
    use pop_types::data::CreateLao;
    use std::time::Duration;
    use tokio_stream::StreamExt;

    fn node() -> (Arc<SyncService<InMemoryTransport>>, Subscription, KeyPair) {
        let transport = Arc::new(InMemoryTransport::new());
        let deliveries = transport.deliveries();
        let seed = [7u8; 32];
        let service = SyncService::new(SyncConfig::default(), KeyPair::from_seed(seed), transport);
        (Arc::new(service), deliveries, KeyPair::from_seed(seed))
    }

    fn create_lao(keys: &KeyPair) -> CreateLao {
        CreateLao {
            id: ids::lao_id(&Ed25519Provider, &keys.public_key(), 1000, "Club"),
            name: "Club".into(),
            creation: 1000,
            organizer: keys.public_key(),
            witnesses: vec![],
        }
    }

    #[tokio::test]
    async fn test_publish_then_settle_creates_lao() {
        let (service, mut deliveries, keys) = node();
        service.subscribe(&Channel::root()).await.unwrap();

        let create = create_lao(&keys);
        service
            .publish(&Channel::root(), &Data::CreateLao(create.clone()))
            .await
            .unwrap();
        service.settle(&mut deliveries).await;

        let lao = service.get_lao_view(&create.id).unwrap();
        assert_eq!(lao.name, "Club");
        assert!(lao.is_organizer(&service.public_key()));
    }

    #[tokio::test]
    async fn test_subscribe_replays_history() {
        let (service, mut deliveries, keys) = node();
        let create = create_lao(&keys);
        service
            .publish(&Channel::root(), &Data::CreateLao(create.clone()))
            .await
            .unwrap();

        let outcomes = service.subscribe(&Channel::root()).await.unwrap();
        assert_eq!(outcomes, vec![ProcessOutcome::Processed]);
        service.settle(&mut deliveries).await;
        assert!(service.get_lao_view(&create.id).is_ok());
    }

    #[tokio::test]
    async fn test_observer_sees_update() {
        let (service, mut deliveries, keys) = node();
        service.subscribe(&Channel::root()).await.unwrap();
        let create = create_lao(&keys);
        service
            .publish(&Channel::root(), &Data::CreateLao(create.clone()))
            .await
            .unwrap();
        service.settle(&mut deliveries).await;

        let mut stream = service.observe_lao(&create.id).unwrap();
        assert_eq!(stream.next().await.unwrap().name, "Club");

        let update = pop_types::data::UpdateLao {
            id: create.id.clone(),
            name: "Club 2".into(),
            last_modified: 2000,
            witnesses: vec![],
        };
        service
            .publish(&Channel::lao(&create.id), &Data::UpdateLao(update))
            .await
            .unwrap();
        service.settle(&mut deliveries).await;

        let next = tokio::time::timeout(Duration::from_millis(200), stream.next())
            .await
            .expect("timeout")
            .unwrap();
        assert_eq!(next.name, "Club 2");
    }

    #[tokio::test]
    async fn test_witness_requires_participation() {
        let (service, mut deliveries, _) = node();
        service.subscribe(&Channel::root()).await.unwrap();

        let other = KeyPair::generate();
        let create = create_lao(&other);
        let message = pop_crypto::sign_message(&other, &Data::CreateLao(create.clone())).unwrap();
        service.on_broadcast(&Channel::root(), message).await;
        service.settle(&mut deliveries).await;

        assert_eq!(
            service.witness_message(&create.id, &MessageId::new("bQ==")).await,
            Err(SyncError::NotAWitness(service.public_key()))
        );
    }

    #[tokio::test]
    async fn test_settle_recovers_dropped_deliveries() {
        let transport = Arc::new(InMemoryTransport::with_capacity(1));
        let mut deliveries = transport.deliveries();
        let service = SyncService::new(SyncConfig::default(), KeyPair::generate(), transport.clone());
        service.subscribe(&Channel::root()).await.unwrap();

        let remote = transport.peer();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let organizer = KeyPair::generate();
            let create = create_lao(&organizer);
            let message = pop_crypto::sign_message(&organizer, &Data::CreateLao(create.clone())).unwrap();
            remote.publish(&Channel::root(), message).await.unwrap();
            ids.push(create.id);
        }

        service.settle(&mut deliveries).await;
        for id in &ids {
            assert!(service.get_lao_view(id).is_ok(), "LAO {id} lost to lag");
        }
    }
}
