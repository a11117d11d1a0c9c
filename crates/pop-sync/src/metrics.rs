//! # Sync Metrics
//!
//! Prometheus counters for message handling.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! pop-sync = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `pop_sync_messages_processed_total` - Messages handled, by object
//! - `pop_sync_messages_deferred_total` - Messages parked, by reason
//! - `pop_sync_messages_rejected_total` - Messages dropped, by reason
//! - `pop_sync_witness_thresholds_total` - Witnessed actions fired
//! - `pop_sync_consensus_decisions_total` - Instances reaching a terminal state, by outcome

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref MESSAGES_PROCESSED: IntCounterVec = register_int_counter_vec!(
        "pop_sync_messages_processed_total",
        "Total number of messages handled",
        &["object"]
    )
    .expect("Failed to create MESSAGES_PROCESSED metric");

    pub static ref MESSAGES_DEFERRED: IntCounterVec = register_int_counter_vec!(
        "pop_sync_messages_deferred_total",
        "Total number of messages parked for replay",
        &["reason"]
    )
    .expect("Failed to create MESSAGES_DEFERRED metric");

    pub static ref MESSAGES_REJECTED: IntCounterVec = register_int_counter_vec!(
        "pop_sync_messages_rejected_total",
        "Total number of messages dropped",
        &["reason"]
    )
    .expect("Failed to create MESSAGES_REJECTED metric");

    pub static ref WITNESS_THRESHOLDS: IntCounter = register_int_counter!(
        "pop_sync_witness_thresholds_total",
        "Total number of witnessed actions fired"
    )
    .expect("Failed to create WITNESS_THRESHOLDS metric");

    pub static ref CONSENSUS_DECISIONS: IntCounterVec = register_int_counter_vec!(
        "pop_sync_consensus_decisions_total",
        "Total number of consensus instances reaching a terminal state",
        &["outcome"]
    )
    .expect("Failed to create CONSENSUS_DECISIONS metric");
}

#[cfg(feature = "metrics")]
pub fn record_processed(object: &str) {
    MESSAGES_PROCESSED.with_label_values(&[object]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_deferred(reason: &str) {
    MESSAGES_DEFERRED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_rejected(reason: &str) {
    MESSAGES_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_threshold_reached() {
    WITNESS_THRESHOLDS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_consensus_decision(outcome: &str) {
    CONSENSUS_DECISIONS.with_label_values(&[outcome]).inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_processed(_object: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_deferred(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_threshold_reached() {}

#[cfg(not(feature = "metrics"))]
pub fn record_consensus_decision(_outcome: &str) {}
