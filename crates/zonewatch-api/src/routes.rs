//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::analyze::{
    analyze, analyze_stream, capture_all_backgrounds, set_background,
};
use crate::handlers::cameras::{annotated_frame, list_cameras};
use crate::handlers::detection::{get_mode, list_modes, set_mode};
use crate::handlers::events::{event_stats, list_events, occupancy};
use crate::handlers::health::health;
use crate::handlers::scheduler;
use crate::handlers::zones::{
    create_zone, delete_zone, get_zone, list_zones, update_zone, zone_count, zone_history,
};
use crate::middleware::cors_layer;
use crate::state::AppState;
use crate::ws::live_updates;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let zone_routes = Router::new()
        .route("/zones", post(create_zone).get(list_zones))
        .route(
            "/zones/:id",
            get(get_zone).patch(update_zone).delete(delete_zone),
        )
        .route("/zones/:id/count", get(zone_count))
        .route("/zones/:id/history", get(zone_history));

    let detection_routes = Router::new()
        .route("/detection/modes", get(list_modes))
        .route("/detection/mode", get(get_mode).post(set_mode));

    let analysis_routes = Router::new()
        .route("/analyze", post(analyze))
        .route("/analyze-stream", post(analyze_stream))
        .route("/background", post(set_background))
        .route("/backgrounds/capture-all", post(capture_all_backgrounds));

    let query_routes = Router::new()
        .route("/occupancy", get(occupancy))
        .route("/events", get(list_events))
        .route("/events/stats", get(event_stats))
        .route("/cameras", get(list_cameras))
        .route("/frame/:camera_id", get(annotated_frame));

    let scheduler_routes = Router::new()
        .route("/round-robin/start", post(scheduler::start))
        .route("/round-robin/stop", post(scheduler::stop))
        .route("/round-robin/status", get(scheduler::status));

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(live_updates))
        .merge(zone_routes)
        .merge(detection_routes)
        .merge(analysis_routes)
        .merge(query_routes)
        .merge(scheduler_routes)
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
