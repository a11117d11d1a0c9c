//! # PoP Sync Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Dispatcher and crypto throughput
//! └── src/integration/  # Several nodes on one in-memory network
//!     ├── fixtures.rs   # TestNetwork / TestNode
//!     ├── witnessing.rs # Witnessed updates and roll calls
//!     ├── consensus.rs  # Elect / Elect-Accept / Learn across nodes
//!     └── delivery.rs   # Idempotence, ordering, rejection
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p pop-tests
//!
//! # By category
//! cargo test -p pop-tests integration::witnessing::
//! cargo test -p pop-tests integration::consensus::
//!
//! # With logs
//! POP_LOG_LEVEL=debug cargo test -p pop-tests -- --nocapture
//!
//! # Benchmarks
//! cargo bench -p pop-tests
//! ```

#![allow(dead_code)]

pub mod integration;
