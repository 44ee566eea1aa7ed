//! Zone CRUD handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zonewatch_models::{ParkingEvent, UpdateMessage, Zone, ZoneInput, ZonePatch};

use crate::error::ApiResult;
use crate::state::AppState;

/// Create a zone.
pub async fn create_zone(
    State(state): State<AppState>,
    Json(input): Json<ZoneInput>,
) -> ApiResult<(StatusCode, Json<Zone>)> {
    let zone = state.store.create_zone(input).await?;
    state
        .sink
        .publish(UpdateMessage::ZoneCreated { zone: zone.clone() });
    Ok((StatusCode::CREATED, Json(zone)))
}

/// All zones, newest first.
pub async fn list_zones(State(state): State<AppState>) -> ApiResult<Json<Vec<Zone>>> {
    Ok(Json(state.store.list_zones().await?))
}

/// One zone by id.
pub async fn get_zone(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Zone>> {
    Ok(Json(state.store.get_zone(&id).await?))
}

/// Partial update.
pub async fn update_zone(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ZonePatch>,
) -> ApiResult<Json<Zone>> {
    let zone = state.store.update_zone(&id, patch).await?;
    state
        .sink
        .publish(UpdateMessage::ZoneUpdated { zone: zone.clone() });
    Ok(Json(zone))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub zone_id: String,
}

/// Delete a zone; cascades its events and live occupancy state.
pub async fn delete_zone(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let removed = state.store.delete_zone(&id).await?;
    if !removed {
        return Err(crate::error::ApiError::not_found(format!("zone {id}")));
    }
    state.tracker.remove_zone(&id).await;
    state
        .sink
        .publish(UpdateMessage::ZoneDeleted { zone_id: id.clone() });
    Ok(Json(DeleteResponse {
        success: true,
        zone_id: id,
    }))
}

#[derive(Serialize)]
pub struct ZoneCountResponse {
    pub zone_id: String,
    pub zone_name: String,
    pub count: u32,
    pub alarm: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Current occupancy for one zone; zero before the first analysis.
pub async fn zone_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ZoneCountResponse>> {
    let zone = state.store.get_zone(&id).await?;
    let response = match state.tracker.get(&id).await {
        Some(occ) => ZoneCountResponse {
            zone_id: occ.zone_id,
            zone_name: occ.zone_name,
            count: occ.count,
            alarm: occ.alarm,
            last_updated: Some(occ.last_updated),
        },
        None => ZoneCountResponse {
            zone_id: zone.id,
            zone_name: zone.name,
            count: 0,
            alarm: false,
            last_updated: None,
        },
    };
    Ok(Json(response))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: u32,
}

fn default_history_limit() -> u32 {
    50
}

/// Last N events for one zone.
pub async fn zone_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<ParkingEvent>>> {
    // 404 for zones that never existed rather than an empty list.
    state.store.get_zone(&id).await?;
    Ok(Json(state.store.zone_history(&id, query.limit).await?))
}
