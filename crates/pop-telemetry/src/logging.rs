//! Structured logging.
//!
//! Every line carries the usual `tracing` metadata plus whatever fields the
//! call site attaches. The sync engine uses a fixed vocabulary so logs can be
//! filtered per LAO or per message:
//! - `lao_id`: LAO the message belongs to
//! - `message_id`: content address of the envelope
//! - `channel`: channel the envelope arrived on
//! - `object` / `action`: payload tags

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber described by `config`.
///
/// Fails if the filter directive does not parse or a global subscriber is
/// already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;

    // JSON output for log shipping
    let json_layer = (config.console_output && config.json_logs).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });

    // Pretty output for development
    let fmt_layer = (config.console_output && !config.json_logs).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

/// Log an event about one envelope with the standard fields.
#[macro_export]
macro_rules! log_message_event {
    ($level:ident, $msg:expr, $channel:expr, $message_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            channel = %$channel,
            message_id = %$message_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log an event about one LAO with the standard fields.
#[macro_export]
macro_rules! log_lao_event {
    ($level:ident, $msg:expr, $lao_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            lao_id = %$lao_id,
            $($($field)*,)?
            $msg
        )
    };
}
