//! # PoP Sync
//!
//! Message-driven state synchronization for LAOs: every signed message that
//! reaches a node is authenticated, routed to a handler, and folded into an
//! immutable per-LAO snapshot.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure state, no I/O
//!   - `Lao`: The aggregate, owning roll calls, elections, witness messages
//!     and consensus instances
//!   - `ids`: Content-hash identifiers
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `SyncApi`: Driving port (inbound API)
//!   - `MessageSender`: Driven port (subscribe / publish side effects)
//!
//! - **Engines**
//!   - `MessageStore`: Content-addressed envelopes
//!   - `LaoRepository`: Copy-on-write snapshots and their streams
//!   - `WitnessingEngine`: Unanimous witness threshold, exactly-once actions
//!   - `ConsensusEngine`: Elect / Elect-Accept / Learn
//!
//! - **Handlers** (`handlers/`) and the **Dispatcher**: One function per
//!   `(object, action)` pair behind a total routing match
//!
//! - **Service Layer** (`service.rs`): `SyncService` implements `SyncApi`
//!   over a `pop_bus::Transport`
//!
//! ## Message Outcomes
//!
//! | Outcome | When | Effect |
//! |---------|------|--------|
//! | PROCESSED | Handler succeeded, or id already stored | Envelope stored |
//! | DEFERRED | `InvalidMessageId`, `UnknownWitnessMessage` | Queued for replay |
//! | REJECTED | Anything else | Logged and dropped |
//!
//! ## Usage Example
//!
//! ```ignore
//! use pop_bus::InMemoryTransport;
//! use pop_crypto::KeyPair;
//! use pop_sync::{SyncApi, SyncConfig, SyncService};
//! use pop_types::Channel;
//! use std::sync::Arc;
//!
//! let transport = Arc::new(InMemoryTransport::new());
//! let deliveries = transport.deliveries();
//! let service = Arc::new(SyncService::new(SyncConfig::from_env(), KeyPair::generate(), transport));
//!
//! service.subscribe(&Channel::root()).await?;
//! tokio::spawn(service.clone().run(deliveries));
//! ```

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod config;
pub mod consensus;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod ports;
pub mod repository;
pub mod service;
pub mod store;
pub mod witnessing;

pub use adapters::TransportSender;
pub use config::SyncConfig;
pub use consensus::ConsensusEngine;
pub use dispatcher::{Dispatcher, ProcessOutcome};
pub use domain::{
    ConsensusNode, ElectInstance, Election, ElectionState, InstanceState, Lao, NodeState, RollCall,
    RollCallState, Server, WitnessMessage,
};
pub use error::{SyncError, SyncResult};
pub use handlers::SyncContext;
pub use ports::inbound::SyncApi;
pub use ports::outbound::MessageSender;
pub use repository::LaoRepository;
pub use service::SyncService;
pub use store::MessageStore;
pub use witnessing::{WitnessedAction, WitnessingEngine};
