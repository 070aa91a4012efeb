//! System endpoints

use axum::Json;
use relwatch_api::responses::HealthResponse;

/// Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
