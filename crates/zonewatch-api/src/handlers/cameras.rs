//! Camera discovery and annotated frame handlers.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use zonewatch_imaging::{render_annotated, ZoneOverlay};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CamerasResponse {
    pub cameras: Vec<String>,
}

/// `GET /cameras` - ids discovered from the snapshot source.
pub async fn list_cameras(State(state): State<AppState>) -> ApiResult<Json<CamerasResponse>> {
    let cameras = state.snapshot.list_cameras().await?;
    Ok(Json(CamerasResponse { cameras }))
}

/// `GET /frame/:camera_id` - the latest frame with zone overlays.
///
/// Zones assigned to the camera and unassigned zones are drawn; with no
/// zones at all the raw JPEG passes through untouched.
pub async fn annotated_frame(
    State(state): State<AppState>,
    Path(camera_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let jpeg = state.snapshot.fetch_frame(&camera_id).await?;

    let zones = state.store.list_zones().await?;
    let mut overlays = Vec::new();
    for zone in zones {
        let applies = match &zone.camera_id {
            Some(camera) => camera == &camera_id,
            None => true,
        };
        if !applies {
            continue;
        }
        let occupancy = state.tracker.get(&zone.id).await;
        overlays.push(ZoneOverlay::new(
            zone.name.clone(),
            zone.polygon.clone(),
            occupancy.as_ref(),
        ));
    }

    let rendered = render_annotated(&jpeg, &overlays)?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], rendered))
}
