//! Hexagonal ports: what drives the engine and what the engine drives.

pub mod inbound;
pub mod outbound;
