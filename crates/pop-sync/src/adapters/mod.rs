//! Adapters Layer (Driven Adapters)
//!
//! Implementations of the outbound ports over a channel [`Transport`].
//!
//! ## Adapters
//!
//! - `TransportSender` - Signs and broadcasts payloads, joins channels and
//!   feeds their history back to the engine
//!
//! [`Transport`]: pop_bus::Transport

pub mod transport_sender;

pub use transport_sender::TransportSender;
