//! Health check handler.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use zonewatch_models::DetectorMode;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
    pub detection_mode: DetectorMode,
    pub external_detector_available: bool,
}

/// Health check endpoint (liveness probe plus detector status).
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "zonewatch".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        detection_mode: state.detector.current_mode().await,
        external_detector_available: state.detector.external_available().await,
    })
}
