//! HTTP router configuration

use std::sync::Arc;

use axum::{
    Router,
    routing::{any, get},
};
use tower_http::trace::TraceLayer;

use crate::api::{release, system, update};
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // System endpoints
        .route("/health", get(system::health))
        // Release state
        .route("/api/release", get(release::latest_release))
        // Update trigger, prefix-matched
        .route("/api/update", any(update::trigger_update))
        .route("/api/update/", any(update::trigger_update))
        .route("/api/update/{*rest}", any(update::trigger_update))
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
