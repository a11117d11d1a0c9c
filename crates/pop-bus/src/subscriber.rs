//! # Delivery Subscription
//!
//! The receiving side of [`InMemoryTransport`](crate::InMemoryTransport).

use crate::transport::{Delivery, Sequenced, SubscriptionSet};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Every endpoint of the network was dropped.
    #[error("Transport closed")]
    Closed,
}

/// Handle yielding deliveries on the owning endpoint's subscribed channels.
///
/// A handle that falls more than the network capacity behind loses the
/// oldest deliveries. The loss is counted; the owner recovers them with a
/// catchup of its channels (see [`take_lagged`](Self::take_lagged)).
pub struct Subscription {
    receiver: broadcast::Receiver<Sequenced>,
    subscribed: SubscriptionSet,
    lagged: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<Sequenced>, subscribed: SubscriptionSet) -> Self {
        Self {
            receiver,
            subscribed,
            lagged: 0,
        }
    }

    /// Whether the endpoint was subscribed to the channel when this was published.
    fn accepts(&self, published: &Sequenced) -> bool {
        self.subscribed
            .read()
            .get(&published.delivery.channel)
            .is_some_and(|&since| published.seq > since)
    }

    fn record_lag(&mut self, count: u64) {
        warn!(lagged = count, "Subscriber lagged, deliveries dropped until catchup");
        self.lagged += count;
    }

    /// Deliveries dropped since the last call.
    pub fn take_lagged(&mut self) -> u64 {
        std::mem::take(&mut self.lagged)
    }

    /// Receive the next delivery on a subscribed channel.
    ///
    /// # Returns
    ///
    /// - `Some(delivery)` - The next matching delivery
    /// - `None` - The network was dropped
    pub async fn recv(&mut self) -> Option<Delivery> {
        loop {
            let published = match self.receiver.recv().await {
                Ok(p) => p,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    self.record_lag(count);
                    continue;
                }
            };

            if self.accepts(&published) {
                return Some(published.delivery);
            }
        }
    }

    /// Try to receive the next delivery without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(delivery))` - A matching delivery was available
    /// - `Ok(None)` - Nothing available (would block)
    /// - `Err(SubscriptionError::Closed)` - The network was dropped
    pub fn try_recv(&mut self) -> Result<Option<Delivery>, SubscriptionError> {
        loop {
            let published = match self.receiver.try_recv() {
                Ok(p) => p,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    self.record_lag(count);
                    continue;
                }
            };

            if self.accepts(&published) {
                return Ok(Some(published.delivery));
            }
        }
    }

    /// Drain everything currently buffered.
    pub fn drain(&mut self) -> Vec<Delivery> {
        let mut out = Vec::new();
        while let Ok(Some(delivery)) = self.try_recv() {
            out.push(delivery);
        }
        out
    }
}
