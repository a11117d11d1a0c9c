//! Driven Ports (SPI - Outbound Dependencies)

use crate::error::SyncResult;
use async_trait::async_trait;
use pop_types::{Channel, Data, MessageId};

/// Side effects a handler may request.
///
/// Handlers never await these: calls are spawned and failures only logged.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Join `channel` and catch up on its history.
    async fn subscribe(&self, channel: &Channel) -> SyncResult<()>;

    /// Sign `data` with the node's key and broadcast it on `channel`.
    async fn publish(&self, channel: &Channel, data: &Data) -> SyncResult<MessageId>;
}
