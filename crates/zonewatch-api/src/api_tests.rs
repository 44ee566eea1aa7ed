//! Router-level tests with an in-memory store.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder, Luma};
use serde_json::{json, Value};
use tower::ServiceExt;

use zonewatch_store::Store;

use crate::config::AppConfig;
use crate::routes::create_router;
use crate::state::AppState;

fn test_state() -> AppState {
    let config = AppConfig {
        // Nothing listens on these; tests that need live collaborators
        // point the config at a wiremock server instead.
        snapshot_base_url: "http://127.0.0.1:1".into(),
        external_detector_url: "http://127.0.0.1:1".into(),
        ..AppConfig::default()
    };
    AppState::new(config, Store::open_in_memory().unwrap())
}

fn router() -> axum::Router {
    create_router(test_state())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn zone_body(name: &str) -> Value {
    json!({
        "name": name,
        "camera_id": "cam-a",
        "polygon": [[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0]],
        "min_area": 100,
        "max_area": 10000,
        "alarm_threshold": 1
    })
}

fn frame_base64() -> String {
    let mut frame = GrayImage::from_pixel(100, 100, Luma([128u8]));
    for y in 40..60 {
        for x in 40..60 {
            frame.put_pixel(x, y, Luma([0]));
        }
    }
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(frame.as_raw(), 100, 100, ExtendedColorType::L8)
        .unwrap();
    base64::engine::general_purpose::STANDARD.encode(png)
}

#[tokio::test]
async fn test_health_shape() {
    let response = router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "zonewatch");
    assert_eq!(body["detection_mode"], "blob");
    assert_eq!(body["external_detector_available"], false);
}

#[tokio::test]
async fn test_zone_crud_over_http() {
    let app = router();

    // Invalid polygon is a 400.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/zones",
            json!({"name": "bad", "polygon": [[0, 0], [1, 1]]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Create.
    let response = app
        .clone()
        .oneshot(json_request("POST", "/zones", zone_body("bay-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let zone = body_json(response).await;
    let id = zone["id"].as_str().unwrap().to_string();
    assert_eq!(zone["min_area"], 100);

    // List.
    let response = app
        .clone()
        .oneshot(Request::get("/zones").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Patch.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/zones/{id}"),
            json!({"name": "renamed"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "renamed");

    // Count before any analysis.
    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/zones/{id}/count"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let count = body_json(response).await;
    assert_eq!(count["count"], 0);
    assert!(count.get("last_updated").is_none());

    // Delete, then 404.
    let response = app
        .clone()
        .oneshot(
            Request::delete(format!("/zones/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::get(format!("/zones/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_analyze_json_body_end_to_end() {
    let app = router();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/zones", zone_body("bay-1")))
        .await
        .unwrap();
    let zone = body_json(response).await;
    let id = zone["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/analyze",
            json!({"image": frame_base64(), "camera_id": "cam-a"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["zone_id"], id.as_str());
    // No background is stored, so the mean-luma fallback finds the square.
    assert_eq!(results[0]["count"], 1);
    assert_eq!(results[0]["alarm"], true);

    // The entry event landed in the log.
    let response = app
        .clone()
        .oneshot(Request::get("/events").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["events"][0]["event_type"], "entry");

    // Occupancy reflects the write.
    let response = app
        .clone()
        .oneshot(Request::get("/occupancy").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let occupancy = body_json(response).await;
    assert_eq!(occupancy[0]["count"], 1);

    // Stats count the live session.
    let response = app
        .oneshot(Request::get("/events/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let stats = body_json(response).await;
    assert_eq!(stats["total_entries"], 1);
    assert_eq!(stats["current_occupied"], 1);
}

#[tokio::test]
async fn test_analyze_rejects_bad_base64() {
    let response = router()
        .oneshot(json_request(
            "POST",
            "/analyze",
            json!({"image": "!!! not base64 !!!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_set_mode_validation() {
    let app = router();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/detection/mode",
            json!({"mode": "hailo-yolo"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // External mode without a reachable backend is rejected too.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/detection/mode",
            json!({"mode": "external-yolo"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request("POST", "/detection/mode", json!({"mode": "blob"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["mode"], "blob");
}

#[tokio::test]
async fn test_scheduler_status_and_stop() {
    let app = router();

    let response = app
        .clone()
        .oneshot(
            Request::get("/round-robin/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = body_json(response).await;
    assert_eq!(status["enabled"], false);

    // Start with an explicit camera list (no discovery needed).
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/round-robin/start",
            json!({"cameras": ["cam-a"], "interval_ms": 60000}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await;
    assert_eq!(status["enabled"], true);
    assert_eq!(status["interval_ms"], 60000);

    let response = app
        .oneshot(
            Request::post("/round-robin/stop")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = body_json(response).await;
    assert_eq!(status["enabled"], false);
}

#[tokio::test]
async fn test_cors_honors_configured_origins() {
    let config = AppConfig {
        snapshot_base_url: "http://127.0.0.1:1".into(),
        external_detector_url: "http://127.0.0.1:1".into(),
        cors_origins: vec!["http://dashboard.local".into()],
        ..AppConfig::default()
    };
    let app = create_router(AppState::new(config, Store::open_in_memory().unwrap()));

    let response = app
        .clone()
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "http://dashboard.local")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap()),
        Some("http://dashboard.local")
    );

    // An origin outside the configured list gets no allow header.
    let response = app
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "http://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_patch_null_camera_id_unassigns_zone() {
    let app = router();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/zones", zone_body("bay-1")))
        .await
        .unwrap();
    let zone = body_json(response).await;
    let id = zone["id"].as_str().unwrap().to_string();
    assert_eq!(zone["camera_id"], "cam-a");

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/zones/{id}"),
            json!({"camera_id": null}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let patched = body_json(response).await;
    // Unassigned cameras are omitted from the serialized zone.
    assert!(patched.get("camera_id").is_none());
}

#[tokio::test]
async fn test_background_update_uses_running_mean() {
    let state = test_state();
    let app = create_router(state.clone());

    let solid_png_base64 = |value: u8| {
        let frame = GrayImage::from_pixel(50, 50, Luma([value]));
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(frame.as_raw(), 50, 50, ExtendedColorType::L8)
            .unwrap();
        base64::engine::general_purpose::STANDARD.encode(png)
    };

    // First capture seeds the background as-is.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/background",
            json!({"image": solid_png_base64(100), "camera_id": "cam-a"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A second capture folds in at the default learning rate:
    // 0.9 * 100 + 0.1 * 200 = 110.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/background",
            json!({"image": solid_png_base64(200), "camera_id": "cam-a"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let blob = state.store.get_background("cam-a").await.unwrap().unwrap();
    let plane = zonewatch_imaging::decode_background_png(&blob).unwrap();
    assert_eq!(plane.get_pixel(10, 10)[0], 110);

    // Missing camera_id is rejected.
    let response = app
        .oneshot(json_request(
            "POST",
            "/background",
            json!({"image": solid_png_base64(100)}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cameras_and_capture_all_against_snapshot_source() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/streams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cam-a": {}, "cam-b": {}
        })))
        .mount(&server)
        .await;

    let frame_png = {
        let frame = GrayImage::from_pixel(32, 32, Luma([128u8]));
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(frame.as_raw(), 32, 32, ExtendedColorType::L8)
            .unwrap();
        png
    };
    Mock::given(method("GET"))
        .and(path("/api/frame.jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(frame_png))
        .mount(&server)
        .await;

    let config = AppConfig {
        snapshot_base_url: server.uri(),
        external_detector_url: "http://127.0.0.1:1".into(),
        ..AppConfig::default()
    };
    let app = create_router(AppState::new(config, Store::open_in_memory().unwrap()));

    let response = app
        .clone()
        .oneshot(Request::get("/cameras").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["cameras"], json!(["cam-a", "cam-b"]));

    let response = app
        .clone()
        .oneshot(
            Request::post("/backgrounds/capture-all")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r["success"] == true));

    // With no zones, the frame endpoint streams the source bytes through.
    let response = app
        .oneshot(Request::get("/frame/cam-a").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );
}

#[tokio::test]
async fn test_events_filtering_by_type() {
    let app = router();
    let response = app
        .clone()
        .oneshot(json_request("POST", "/zones", zone_body("bay-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Entry (square present), then exit (square gone -> uniform frame).
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/analyze",
            json!({"image": frame_base64(), "camera_id": "cam-a"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let uniform = {
        let frame = GrayImage::from_pixel(100, 100, Luma([128u8]));
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(frame.as_raw(), 100, 100, ExtendedColorType::L8)
            .unwrap();
        base64::engine::general_purpose::STANDARD.encode(png)
    };
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/analyze",
            json!({"image": uniform, "camera_id": "cam-a"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::get("/events?event_type=exit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["events"][0]["event_type"], "exit");
    assert!(body["events"][0]["duration_seconds"].is_number());
}
