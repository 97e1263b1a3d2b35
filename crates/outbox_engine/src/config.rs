//! Configuration for the replay engine.

use std::time::Duration;

/// Configuration for sync passes.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum replay attempts before a mutation is terminally failed.
    pub retry_ceiling: u32,
    /// Timeout applied to each individual replay call.
    ///
    /// There is no whole-pass timeout; a pass runs to the end of its
    /// snapshot.
    pub replay_timeout: Duration,
}

impl SyncConfig {
    /// Creates a configuration with the default retry ceiling and timeout.
    pub fn new() -> Self {
        Self {
            retry_ceiling: 3,
            replay_timeout: Duration::from_secs(15),
        }
    }

    /// Sets the retry ceiling.
    pub fn with_retry_ceiling(mut self, ceiling: u32) -> Self {
        self.retry_ceiling = ceiling;
        self
    }

    /// Sets the per-replay timeout.
    pub fn with_replay_timeout(mut self, timeout: Duration) -> Self {
        self.replay_timeout = timeout;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
