//! Round-robin scheduler handlers.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use zonewatch_engine::{SchedulerStatus, DEFAULT_INTERVAL_MS};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub cameras: Option<Vec<String>>,
    #[serde(default)]
    pub interval_ms: Option<u64>,
}

/// `POST /round-robin/start` - start or reconfigure the scheduler.
///
/// Without an explicit camera list the snapshot source is asked for one.
pub async fn start(
    State(state): State<AppState>,
    body: Option<Json<StartRequest>>,
) -> ApiResult<Json<SchedulerStatus>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let cameras = match request.cameras {
        Some(cameras) if !cameras.is_empty() => cameras,
        _ => state.snapshot.list_cameras().await?,
    };
    if cameras.is_empty() {
        return Err(ApiError::bad_request(
            "no cameras given and none discovered from the snapshot source",
        ));
    }

    let interval_ms = request.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS);
    state.scheduler.start(cameras, interval_ms);
    Ok(Json(state.scheduler.status()))
}

/// `POST /round-robin/stop`.
pub async fn stop(State(state): State<AppState>) -> Json<SchedulerStatus> {
    state.scheduler.stop();
    Json(state.scheduler.status())
}

/// `GET /round-robin/status`.
pub async fn status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status())
}
