//! Per-(object, action) handlers.
//!
//! Handlers read and mutate the repository, possibly through the witnessing
//! or consensus engine, and never perform I/O themselves: subscriptions and
//! publications are spawned on the runtime and their failures logged.

pub mod consensus;
pub mod election;
pub mod lao;
pub mod roll_call;
pub mod witness;

use crate::config::SyncConfig;
use crate::consensus::ConsensusEngine;
use crate::domain::Lao;
use crate::error::{SyncError, SyncResult};
use crate::ports::outbound::MessageSender;
use crate::repository::LaoRepository;
use crate::store::MessageStore;
use crate::witnessing::WitnessingEngine;
use pop_types::channel::CONSENSUS;
use pop_types::{Channel, CryptoProvider, Data, MessageId, PublicKey};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::warn;

/// Everything a handler may touch.
#[derive(Clone)]
pub struct SyncContext {
    pub(crate) config: SyncConfig,
    /// Key of the node running this engine
    pub(crate) own_key: PublicKey,
    pub(crate) crypto: Arc<dyn CryptoProvider>,
    pub(crate) store: Arc<MessageStore>,
    pub(crate) repository: Arc<LaoRepository>,
    pub(crate) witnessing: Arc<WitnessingEngine>,
    pub(crate) consensus: Arc<ConsensusEngine>,
    pub(crate) sender: Arc<dyn MessageSender>,
}

impl SyncContext {
    pub fn new(
        config: SyncConfig,
        own_key: PublicKey,
        crypto: Arc<dyn CryptoProvider>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        let store = Arc::new(MessageStore::new());
        let repository = Arc::new(LaoRepository::new());
        let witnessing = Arc::new(WitnessingEngine::new(
            repository.clone(),
            store.clone(),
            crypto.clone(),
        ));
        let consensus = Arc::new(ConsensusEngine::new(repository.clone(), crypto.clone()));
        Self {
            config,
            own_key,
            crypto,
            store,
            repository,
            witnessing,
            consensus,
            sender,
        }
    }

    #[must_use]
    pub fn own_key(&self) -> &PublicKey {
        &self.own_key
    }

    #[must_use]
    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    #[must_use]
    pub fn repository(&self) -> &Arc<LaoRepository> {
        &self.repository
    }

    #[must_use]
    pub fn witnessing(&self) -> &Arc<WitnessingEngine> {
        &self.witnessing
    }

    #[must_use]
    pub fn consensus(&self) -> &Arc<ConsensusEngine> {
        &self.consensus
    }

    /// Fire-and-forget subscription.
    pub(crate) fn spawn_subscribe(&self, channel: Channel) {
        let Ok(handle) = Handle::try_current() else {
            warn!(channel = %channel, "No runtime, subscription dropped");
            return;
        };
        let sender = self.sender.clone();
        handle.spawn(async move {
            if let Err(e) = sender.subscribe(&channel).await {
                warn!(channel = %channel, error = %e, "Subscription failed");
            }
        });
    }

    /// Fire-and-forget publication.
    pub(crate) fn spawn_publish(&self, channel: Channel, data: Data) {
        let Ok(handle) = Handle::try_current() else {
            warn!(channel = %channel, object = data.object(), action = data.action(), "No runtime, publication dropped");
            return;
        };
        let sender = self.sender.clone();
        handle.spawn(async move {
            if let Err(e) = sender.publish(&channel, &data).await {
                warn!(channel = %channel, object = data.object(), action = data.action(), error = %e, "Publication failed");
            }
        });
    }

    /// Join the consensus channel of `lao` if this node takes part in it.
    pub(crate) fn join_consensus_if_participant(&self, lao: &Lao) {
        if self.config.subscribe_consensus && lao.is_participant(&self.own_key) {
            self.spawn_subscribe(lao.channel.sub_channel(CONSENSUS));
        }
    }
}

/// One envelope being handled.
#[derive(Clone, Copy, Debug)]
pub struct Incoming<'a> {
    pub channel: &'a Channel,
    pub message_id: &'a MessageId,
    pub sender: &'a PublicKey,
}

impl<'a> Incoming<'a> {
    /// LAO the channel belongs to.
    pub(crate) fn lao_id(&self) -> SyncResult<&'a str> {
        self.channel
            .lao_id()
            .ok_or_else(|| SyncError::UnknownLao(self.channel.to_string()))
    }
}

/// Reject unless `sender` organizes `lao`.
pub(crate) fn require_organizer(lao: &Lao, sender: &PublicKey) -> SyncResult<()> {
    if lao.is_organizer(sender) {
        Ok(())
    } else {
        Err(SyncError::DataHandling(format!(
            "{sender} is not the organizer of LAO {}",
            lao.id
        )))
    }
}
