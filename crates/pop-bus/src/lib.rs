//! # PoP Bus - Channel Transport and Snapshot Streams
//!
//! Two halves of the plumbing around the sync engine:
//!
//! - [`Transport`]: subscribe / publish / catchup over named channels. The
//!   only guarantee is FIFO per channel; nothing is ordered across channels.
//! - [`SnapshotCell`]: a single-writer cell whose [`SnapshotStream`] replays
//!   the latest value on subscribe and then every replacement.
//!
//! ```text
//! ┌──────────────┐   publish()    ┌──────────────┐   deliveries()  ┌──────────────┐
//! │   Node A     │ ─────────────▶ │  Transport   │ ──────────────▶ │   Node B     │
//! └──────────────┘                │ (history per │                 └──────────────┘
//!                                 │   channel)   │ ◀── catchup() ──
//!                                 └──────────────┘
//! ```

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod snapshot;
pub mod subscriber;
pub mod transport;

pub use snapshot::{SnapshotCell, SnapshotStream};
pub use subscriber::{Subscription, SubscriptionError};
pub use transport::{Delivery, InMemoryTransport, Transport, TransportError};

/// Maximum deliveries buffered per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
