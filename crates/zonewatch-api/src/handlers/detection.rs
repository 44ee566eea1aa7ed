//! Detection-mode handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use zonewatch_detect::ModeInfo;
use zonewatch_models::{DetectorMode, UpdateMessage};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ModesResponse {
    pub current_mode: DetectorMode,
    pub external_detector_available: bool,
    pub modes: Vec<ModeInfo>,
}

#[derive(Serialize)]
pub struct ModeResponse {
    pub mode: DetectorMode,
}

#[derive(Deserialize)]
pub struct SetModeRequest {
    pub mode: String,
}

/// List every detector mode with active/available flags.
pub async fn list_modes(State(state): State<AppState>) -> Json<ModesResponse> {
    let modes = state.detector.modes().await;
    Json(ModesResponse {
        current_mode: state.detector.current_mode().await,
        external_detector_available: state.detector.external_available().await,
        modes,
    })
}

/// Current mode.
pub async fn get_mode(State(state): State<AppState>) -> Json<ModeResponse> {
    Json(ModeResponse {
        mode: state.detector.current_mode().await,
    })
}

/// Switch the active mode; external modes require a reachable backend.
pub async fn set_mode(
    State(state): State<AppState>,
    Json(request): Json<SetModeRequest>,
) -> ApiResult<Json<ModeResponse>> {
    let mode: DetectorMode = request
        .mode
        .parse()
        .map_err(|e: zonewatch_models::UnknownModeError| ApiError::bad_request(e.to_string()))?;

    let mode = state.detector.set_mode(mode).await?;
    state.sink.publish(UpdateMessage::mode_changed(mode));
    Ok(Json(ModeResponse { mode }))
}
