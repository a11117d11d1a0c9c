//! # Integration Tests
//!
//! Every node runs a full `SyncService` over its own endpoint of one
//! `InMemoryTransport`, so messages travel exactly as they would between
//! real nodes: signed, broadcast, caught up on join.

pub mod fixtures;

mod consensus;
mod delivery;
mod witnessing;
