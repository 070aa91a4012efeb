//! Application state shared across HTTP handlers

use std::sync::Arc;

use relwatch_core::UpdateCoordinator;

use crate::config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Latest-release state and install workflow
    pub coordinator: UpdateCoordinator,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(coordinator: UpdateCoordinator, config: Config) -> Self {
        Self {
            coordinator,
            config: Arc::new(config),
        }
    }
}
