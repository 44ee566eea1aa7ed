//! Occupancy and event-log query handlers.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zonewatch_models::{EventFilter, EventStats, ParkingEvent, ZoneOccupancy};

use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /occupancy` - every tracked zone's current count.
pub async fn occupancy(State(state): State<AppState>) -> Json<Vec<ZoneOccupancy>> {
    Json(state.tracker.snapshot().await)
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub events: Vec<ParkingEvent>,
    pub total: u64,
}

/// `GET /events` - filtered event page plus total.
pub async fn list_events(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> ApiResult<Json<EventsResponse>> {
    let (events, total) = state.store.query_events(filter).await?;
    Ok(Json(EventsResponse { events, total }))
}

#[derive(Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
}

/// `GET /events/stats` - aggregates plus the live occupied-zone count.
pub async fn event_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<EventStats>> {
    Ok(Json(state.tracker.stats(query.since).await?))
}
