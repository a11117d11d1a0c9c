//! # PoP Telemetry
//!
//! Logging setup shared by every PoP sync node.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pop_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `POP_SERVICE_NAME` | `pop-sync` | Service name in log lines |
//! | `POP_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `POP_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `POP_JSON_LOGS` | `false` | JSON lines instead of pretty output |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}
