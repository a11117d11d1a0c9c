//! Sync engine configuration.

use std::env;

/// Sync engine configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Bound on the deferred queue; the oldest entry is dropped on overflow
    pub max_deferred: usize,
    /// Join the consensus channel of LAOs where this node is organizer or witness
    pub subscribe_consensus: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_deferred: 1024,
            subscribe_consensus: true,
        }
    }
}

impl SyncConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `POP_MAX_DEFERRED`: Deferred queue bound (default: 1024)
    /// - `POP_SUBSCRIBE_CONSENSUS`: Join consensus channels (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| !v.eq_ignore_ascii_case("false") && v != "0")
                .unwrap_or(default)
        };

        Self {
            max_deferred: lookup("POP_MAX_DEFERRED")
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.max_deferred),
            subscribe_consensus: flag("POP_SUBSCRIBE_CONSENSUS", defaults.subscribe_consensus),
        }
    }
}
