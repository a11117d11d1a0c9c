//! # Channel Transport
//!
//! The publishing side of the broadcast medium. A node subscribes to the
//! channels it cares about, publishes signed envelopes, and asks for the
//! history of a channel (catchup) when it joins late.

use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::RwLock;
use pop_types::{Channel, SignedMessage};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

/// Errors from transport operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The channel path is not usable.
    #[error("Invalid channel: {0}")]
    InvalidChannel(Channel),

    /// The underlying medium is gone.
    #[error("Transport closed")]
    Closed,
}

/// One envelope as delivered on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub channel: Channel,
    pub message: SignedMessage,
}

/// Broadcast medium seen from one node.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start receiving deliveries for `channel`.
    async fn subscribe(&self, channel: &Channel) -> Result<(), TransportError>;

    /// Broadcast `message` on `channel`.
    ///
    /// # Returns
    ///
    /// The number of endpoints the delivery was handed to.
    async fn publish(&self, channel: &Channel, message: SignedMessage) -> Result<usize, TransportError>;

    /// Every envelope ever published on `channel`, oldest first.
    async fn catchup(&self, channel: &Channel) -> Result<Vec<SignedMessage>, TransportError>;

    /// Channels this endpoint is subscribed to, sorted.
    fn subscribed_channels(&self) -> Vec<Channel>;
}

/// A delivery stamped with its position in the network's publish order.
#[derive(Debug, Clone)]
pub(crate) struct Sequenced {
    pub(crate) seq: u64,
    pub(crate) delivery: Delivery,
}

/// Subscribed channels of one endpoint, each with the last sequence number
/// published before the subscription. Older envelopes are left to catchup.
pub(crate) type SubscriptionSet = Arc<RwLock<HashMap<Channel, u64>>>;

/// State shared by every endpoint of one in-memory network.
struct Hub {
    sender: broadcast::Sender<Sequenced>,
    history: RwLock<HashMap<Channel, Vec<SignedMessage>>>,
    /// Envelopes published so far; also the sequence of the latest one
    published: AtomicU64,
}

/// In-memory implementation of the transport.
///
/// Each value is one node's endpoint onto a shared hub: [`peer`](Self::peer)
/// hands out another endpoint on the same network with its own subscription
/// set. Deliveries fan out through `tokio::sync::broadcast`; per-channel
/// history backs catchup. An endpoint only receives envelopes published
/// after it subscribed to their channel.
#[derive(Clone)]
pub struct InMemoryTransport {
    hub: Arc<Hub>,
    subscribed: SubscriptionSet,
}

impl InMemoryTransport {
    /// Create a new network with default capacity and return its first endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            hub: Arc::new(Hub {
                sender,
                history: RwLock::new(HashMap::new()),
                published: AtomicU64::new(0),
            }),
            subscribed: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Another endpoint on the same network, subscribed to nothing.
    #[must_use]
    pub fn peer(&self) -> Self {
        Self {
            hub: self.hub.clone(),
            subscribed: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Deliveries for the channels this endpoint is subscribed to.
    ///
    /// Subscriptions made after this call still apply to the returned handle,
    /// from the moment they are made.
    #[must_use]
    pub fn deliveries(&self) -> Subscription {
        Subscription::new(self.hub.sender.subscribe(), self.subscribed.clone())
    }

    #[must_use]
    pub fn is_subscribed(&self, channel: &Channel) -> bool {
        self.subscribed.read().contains_key(channel)
    }

    /// Total envelopes published on the network.
    #[must_use]
    pub fn messages_published(&self) -> u64 {
        self.hub.published.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn subscribe(&self, channel: &Channel) -> Result<(), TransportError> {
        if channel.as_str().is_empty() {
            return Err(TransportError::InvalidChannel(channel.clone()));
        }
        // publish bumps the sequence under the history lock
        let _history = self.hub.history.read();
        let since = self.hub.published.load(Ordering::Relaxed);
        if let Entry::Vacant(entry) = self.subscribed.write().entry(channel.clone()) {
            entry.insert(since);
            debug!(channel = %channel, since, "Subscribed");
        }
        Ok(())
    }

    async fn publish(&self, channel: &Channel, message: SignedMessage) -> Result<usize, TransportError> {
        if channel.as_str().is_empty() {
            return Err(TransportError::InvalidChannel(channel.clone()));
        }

        let seq = {
            let mut history = self.hub.history.write();
            history.entry(channel.clone()).or_default().push(message.clone());
            self.hub.published.fetch_add(1, Ordering::Relaxed) + 1
        };

        let message_id = message.message_id.clone();
        let published = Sequenced {
            seq,
            delivery: Delivery {
                channel: channel.clone(),
                message,
            },
        };
        match self.hub.sender.send(published) {
            Ok(receivers) => {
                debug!(channel = %channel, message_id = %message_id, receivers, "Message published");
                Ok(receivers)
            }
            Err(_) => {
                // No live receivers; history still serves catchup
                debug!(channel = %channel, message_id = %message_id, "Message published to no receivers");
                Ok(0)
            }
        }
    }

    async fn catchup(&self, channel: &Channel) -> Result<Vec<SignedMessage>, TransportError> {
        Ok(self
            .hub
            .history
            .read()
            .get(channel)
            .cloned()
            .unwrap_or_default())
    }

    fn subscribed_channels(&self) -> Vec<Channel> {
        let mut channels: Vec<_> = self.subscribed.read().keys().cloned().collect();
        channels.sort();
        channels
    }
}
