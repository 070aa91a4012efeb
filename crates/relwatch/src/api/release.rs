//! Latest release endpoint

use std::sync::Arc;

use axum::{Json, extract::State};
use relwatch_api::responses::LatestReleaseResponse;

use crate::api::error::AppError;
use crate::state::AppState;

/// Report the latest known release
///
/// # Errors
/// Returns `AppError` if the coordinator cannot be reached
pub async fn latest_release(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LatestReleaseResponse>, AppError> {
    let snapshot = state
        .coordinator
        .latest_release()
        .await
        .map_err(|e| AppError::internal(format!("failed to read latest release: {e}")))?;

    let release = snapshot.release;

    Ok(Json(LatestReleaseResponse {
        current_version: state.config.watcher.current_version.clone(),
        available: release.is_some(),
        tag: release.as_ref().map(|r| r.tag.clone()),
        name: release.as_ref().and_then(|r| r.name.clone()),
        published_at: release.as_ref().and_then(|r| r.published_at),
        observed_at: snapshot.observed_at,
        notes: release.and_then(|r| r.notes),
    }))
}
