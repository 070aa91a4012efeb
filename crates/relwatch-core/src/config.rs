//! Configuration types for the release watcher

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Release watcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Version of the running software
    #[serde(default = "default_current_version")]
    pub current_version: String,
    /// Seconds between registry polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Consider prereleases as update candidates
    #[serde(default)]
    pub include_prereleases: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            current_version: default_current_version(),
            poll_interval_secs: default_poll_interval_secs(),
            include_prereleases: false,
        }
    }
}

fn default_current_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_poll_interval_secs() -> u64 {
    6 * 60 * 60
}

impl WatcherConfig {
    /// Create config for a given running version with default interval
    pub fn new(current_version: impl Into<String>) -> Self {
        Self {
            current_version: current_version.into(),
            ..Self::default()
        }
    }

    /// Poll interval, clamped to at least one second
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}
