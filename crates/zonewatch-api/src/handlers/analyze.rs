//! Ad-hoc analysis and background capture handlers.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::Json;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;
use zonewatch_imaging::{
    decode_background_png, decode_gray, encode_background_png, running_mean_update, DEFAULT_ALPHA,
};
use zonewatch_models::{Blob, DetectOptions, Zone};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// JSON body for `/analyze` and `/background`.
#[derive(Deserialize)]
pub struct ImageBody {
    pub image: String,
    #[serde(default)]
    pub camera_id: Option<String>,
    #[serde(default)]
    pub zone_ids: Option<Vec<String>>,
}

/// Query parameters used with raw image bodies.
#[derive(Default, Deserialize)]
pub struct ImageQuery {
    #[serde(default)]
    pub camera_id: Option<String>,
    /// Comma-separated zone ids.
    #[serde(default)]
    pub zone_ids: Option<String>,
}

#[derive(Serialize)]
pub struct ZoneAnalysis {
    pub zone_id: String,
    pub zone_name: String,
    pub count: u32,
    pub blobs: Vec<Blob>,
    pub alarm: bool,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub results: Vec<ZoneAnalysis>,
}

#[derive(Deserialize)]
pub struct AnalyzeStreamRequest {
    pub stream_url: String,
    #[serde(default)]
    pub camera_id: Option<String>,
    #[serde(default)]
    pub zone_ids: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct BackgroundResponse {
    pub success: bool,
    pub camera_id: String,
}

#[derive(Serialize)]
pub struct CaptureResult {
    pub camera_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct CaptureAllResponse {
    pub results: Vec<CaptureResult>,
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false)
}

fn decode_base64_image(encoded: &str) -> ApiResult<Vec<u8>> {
    // Tolerate data-URL prefixes from browser canvases.
    let encoded = encoded.rsplit(',').next().unwrap_or(encoded);
    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| ApiError::bad_request(format!("invalid base64 image: {e}")))
}

/// Extract frame bytes plus selection from either body shape.
fn parse_image_request(
    headers: &HeaderMap,
    query: ImageQuery,
    body: Bytes,
) -> ApiResult<(Vec<u8>, Option<String>, Option<Vec<String>>)> {
    if is_json(headers) {
        let parsed: ImageBody = serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))?;
        let frame = decode_base64_image(&parsed.image)?;
        Ok((frame, parsed.camera_id, parsed.zone_ids))
    } else {
        if body.is_empty() {
            return Err(ApiError::bad_request("empty image body"));
        }
        let zone_ids = query.zone_ids.map(|ids| {
            ids.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });
        Ok((body.to_vec(), query.camera_id, zone_ids))
    }
}

/// Select the zones an ad-hoc analysis applies to.
///
/// Explicit ids win; otherwise a camera id selects its zones plus the
/// unassigned ones; with neither, every zone is analyzed.
async fn select_zones(
    state: &AppState,
    zone_ids: Option<Vec<String>>,
    camera_id: Option<&str>,
) -> ApiResult<Vec<Zone>> {
    if let Some(ids) = zone_ids {
        let mut zones = Vec::with_capacity(ids.len());
        for id in ids {
            zones.push(state.store.get_zone(&id).await?);
        }
        return Ok(zones);
    }

    let all = state.store.list_zones().await?;
    Ok(match camera_id {
        Some(camera) => all
            .into_iter()
            .filter(|z| z.camera_id.is_none() || z.camera_id.as_deref() == Some(camera))
            .collect(),
        None => all,
    })
}

/// Run the active detector over the selected zones and record occupancy.
async fn analyze_frame(
    state: &AppState,
    frame: &[u8],
    zone_ids: Option<Vec<String>>,
    camera_id: Option<String>,
) -> ApiResult<Vec<ZoneAnalysis>> {
    let zones = select_zones(state, zone_ids, camera_id.as_deref()).await?;
    let background = match &camera_id {
        Some(camera) => state.store.get_background(camera).await?,
        None => None,
    };

    let mut results = Vec::with_capacity(zones.len());
    for zone in &zones {
        let options = DetectOptions::for_zone(zone);
        let result = state
            .detector
            .analyze(frame, background.as_deref(), &zone.polygon, &options)
            .await?;

        let (occ, _event) = state
            .tracker
            .record(zone, result.count as u32, result.blobs, Utc::now())
            .await?;
        results.push(ZoneAnalysis {
            zone_id: occ.zone_id,
            zone_name: occ.zone_name,
            count: occ.count,
            blobs: occ.blobs,
            alarm: occ.alarm,
        });
    }
    Ok(results)
}

/// `POST /analyze` - JSON base64 body or raw image with query params.
pub async fn analyze(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<AnalyzeResponse>> {
    let (frame, camera_id, zone_ids) = parse_image_request(&headers, query, body)?;
    let results = analyze_frame(&state, &frame, zone_ids, camera_id).await?;
    Ok(Json(AnalyzeResponse { results }))
}

/// `POST /analyze-stream` - pull one still from a URL, then analyze it.
pub async fn analyze_stream(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeStreamRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let frame = state.snapshot.fetch_url(&request.stream_url).await?;
    let results = analyze_frame(&state, &frame, request.zone_ids, request.camera_id).await?;
    Ok(Json(AnalyzeResponse { results }))
}

/// `POST /background` - update the reference frame for one camera.
///
/// With an existing background of matching dimensions the new frame is
/// folded in with the running mean; otherwise the frame replaces it
/// outright (first capture, or a camera that changed resolution).
pub async fn set_background(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<BackgroundResponse>> {
    let (frame, camera_id, _) = parse_image_request(&headers, query, body)?;
    let camera_id =
        camera_id.ok_or_else(|| ApiError::bad_request("camera_id is required"))?;

    let plane = decode_gray(&frame)?;
    let plane = match state.store.get_background(&camera_id).await? {
        Some(existing) => match decode_background_png(&existing) {
            Ok(bg) if bg.dimensions() == plane.dimensions() => {
                running_mean_update(&bg, &plane, DEFAULT_ALPHA)?
            }
            _ => plane,
        },
        None => plane,
    };
    let blob = encode_background_png(&plane)?;
    state.store.save_background(&camera_id, blob).await?;
    Ok(Json(BackgroundResponse {
        success: true,
        camera_id,
    }))
}

/// `POST /backgrounds/capture-all` - grab a reference frame per camera.
pub async fn capture_all_backgrounds(
    State(state): State<AppState>,
) -> ApiResult<Json<CaptureAllResponse>> {
    let cameras = state.snapshot.list_cameras().await?;

    let mut results = Vec::with_capacity(cameras.len());
    for camera_id in cameras {
        let outcome = capture_one(&state, &camera_id).await;
        if let Err(e) = &outcome {
            warn!(camera_id, error = %e, "background capture failed");
        }
        results.push(CaptureResult {
            camera_id,
            success: outcome.is_ok(),
            error: outcome.err().map(|e| e.to_string()),
        });
    }
    Ok(Json(CaptureAllResponse { results }))
}

async fn capture_one(state: &AppState, camera_id: &str) -> ApiResult<()> {
    let frame = state.snapshot.fetch_frame(camera_id).await?;
    let plane = decode_gray(&frame)?;
    let blob = encode_background_png(&plane)?;
    state.store.save_background(camera_id, blob).await?;
    Ok(())
}
