//! Update trigger endpoint

use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::api::error::UpdateFailure;
use crate::state::AppState;

/// Install the latest known release
///
/// Mounted on `/api/update` and every path below it. Only POST is accepted.
pub async fn trigger_update(State(state): State<Arc<AppState>>, method: Method) -> Response {
    if method != Method::POST {
        return (StatusCode::METHOD_NOT_ALLOWED, "Invalid request method").into_response();
    }

    match state.coordinator.trigger_update().await {
        Ok(artifact) => {
            info!(artifact = %artifact.name, "update triggered via API");
            (StatusCode::OK, "Update triggered successfully").into_response()
        }
        Err(e) => UpdateFailure(e).into_response(),
    }
}
