//! # Snapshot Streams
//!
//! Observers of an aggregate want the current value immediately and then
//! every replacement. `tokio::sync::watch` gives exactly that: the stream
//! yields the value held at subscribe time, then each later value. Slow
//! observers skip intermediate snapshots and only ever see the newest.

use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::Stream;

/// Single-writer cell publishing immutable snapshots.
#[derive(Debug)]
pub struct SnapshotCell<T> {
    sender: watch::Sender<T>,
}

impl<T> SnapshotCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Replace the current snapshot and wake every stream.
    pub fn set(&self, value: T) {
        // send_replace stores the value even when nobody is subscribed
        self.sender.send_replace(value);
    }

    /// Copy of the current snapshot.
    #[must_use]
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Stream that replays the current snapshot, then each replacement.
    ///
    /// The stream ends only once the cell is dropped.
    #[must_use]
    pub fn subscribe(&self) -> SnapshotStream<T> {
        SnapshotStream {
            inner: WatchStream::new(self.sender.subscribe()),
        }
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Push stream of snapshots from a [`SnapshotCell`].
pub struct SnapshotStream<T> {
    inner: WatchStream<T>,
}

impl<T> Stream for SnapshotStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
