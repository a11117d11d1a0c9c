//! [`MessageSender`] over a channel transport.
//!
//! Joining a channel also fetches its history; each envelope of it is pushed
//! to the engine's inbox, where it is handled like any live delivery.

use crate::error::{SyncError, SyncResult};
use crate::ports::outbound::MessageSender;
use async_trait::async_trait;
use pop_bus::{Delivery, Transport, TransportError};
use pop_crypto::{sign_message, KeyPair};
use pop_types::{Channel, Data, MessageId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

impl From<TransportError> for SyncError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err.to_string())
    }
}

pub struct TransportSender<T: Transport> {
    transport: Arc<T>,
    keys: Arc<KeyPair>,
    inbox: mpsc::UnboundedSender<Delivery>,
}

impl<T: Transport> TransportSender<T> {
    pub fn new(transport: Arc<T>, keys: Arc<KeyPair>, inbox: mpsc::UnboundedSender<Delivery>) -> Self {
        Self {
            transport,
            keys,
            inbox,
        }
    }
}

#[async_trait]
impl<T: Transport + 'static> MessageSender for TransportSender<T> {
    async fn subscribe(&self, channel: &Channel) -> SyncResult<()> {
        self.transport.subscribe(channel).await?;
        let history = self.transport.catchup(channel).await?;
        debug!(channel = %channel, messages = history.len(), "Joined channel");

        for message in history {
            let delivery = Delivery {
                channel: channel.clone(),
                message,
            };
            if self.inbox.send(delivery).is_err() {
                warn!(channel = %channel, "Engine inbox closed, catchup dropped");
                return Err(SyncError::Transport("engine inbox closed".into()));
            }
        }
        Ok(())
    }

    async fn publish(&self, channel: &Channel, data: &Data) -> SyncResult<MessageId> {
        let message = sign_message(&self.keys, data)?;
        let id = message.message_id.clone();
        let delivered = self.transport.publish(channel, message).await?;
        debug!(
            channel = %channel,
            message_id = %id,
            object = data.object(),
            action = data.action(),
            delivered,
            "Published"
        );
        Ok(id)
    }
}
