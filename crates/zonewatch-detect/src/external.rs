//! Client for the external object-detector service.
//!
//! The service accepts a base64-encoded frame plus a model tag and responds
//! with a detection list. Responses vary between deployments: the array may
//! be called `detections` or `objects`, and bounding boxes arrive either as
//! `[x, y, w, h]` arrays or `{x, y, width, height}` objects. Everything is
//! normalized here before the post-filters run.

use std::time::{Duration, Instant};

use base64::Engine;
use serde::Deserialize;
use tracing::debug;
use zonewatch_models::{BoundingBox, Detection};

use crate::error::{DetectError, DetectResult};

/// Timeout for the availability probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Raw response body from `POST /analyze/base64`.
#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default, alias = "objects")]
    detections: Option<Vec<RawDetection>>,
    #[serde(default)]
    inference_ms: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    #[serde(alias = "class")]
    label: String,
    confidence: f64,
    bbox: RawBBox,
}

/// Bounding box in either wire shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBBox {
    Array([f64; 4]),
    Object { x: f64, y: f64, width: f64, height: f64 },
}

impl RawBBox {
    fn normalize(&self) -> BoundingBox {
        let (x, y, w, h) = match *self {
            RawBBox::Array([x, y, w, h]) => (x, y, w, h),
            RawBBox::Object { x, y, width, height } => (x, y, width, height),
        };
        BoundingBox::new(
            x.max(0.0).round() as u32,
            y.max(0.0).round() as u32,
            w.max(0.0).round() as u32,
            h.max(0.0).round() as u32,
        )
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    available: bool,
}

/// Normalized external analysis outcome.
#[derive(Debug)]
pub struct ExternalAnalysis {
    pub detections: Vec<Detection>,
    pub inference_ms: u64,
}

/// HTTP client for the external detector service.
#[derive(Debug, Clone)]
pub struct ExternalDetectorClient {
    base_url: String,
    client: reqwest::Client,
}

impl ExternalDetectorClient {
    /// Create a client with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Run one frame through the external detector.
    ///
    /// `inference_ms` is the server-reported figure when present, otherwise
    /// the measured round-trip time.
    pub async fn analyze(&self, frame: &[u8], model: &str) -> DetectResult<ExternalAnalysis> {
        let image = base64::engine::general_purpose::STANDARD.encode(frame);
        let url = format!("{}/analyze/base64", self.base_url);
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "image": image, "model": model }))
            .send()
            .await?
            .error_for_status()?;
        let body: AnalyzeResponse = response.json().await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if let Some(error) = body.error {
            return Err(DetectError::invalid_response(error));
        }
        let raw = body
            .detections
            .ok_or_else(|| DetectError::invalid_response("missing detections/objects array"))?;

        let detections = raw
            .into_iter()
            .map(|d| Detection {
                label: d.label,
                confidence: d.confidence,
                bbox: d.bbox.normalize(),
            })
            .collect::<Vec<_>>();
        debug!(
            model,
            detections = detections.len(),
            elapsed_ms,
            "external analysis complete"
        );

        Ok(ExternalAnalysis {
            detections,
            inference_ms: body.inference_ms.unwrap_or(elapsed_ms),
        })
    }

    /// Availability probe (`GET /status`), bounded to two seconds.
    ///
    /// Any transport or decode failure reads as unavailable.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/status", self.base_url);
        let request = self.client.get(&url).timeout(PROBE_TIMEOUT).send();
        match request.await {
            Ok(response) => match response.json::<StatusResponse>().await {
                Ok(status) => status.available,
                Err(_) => false,
            },
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ExternalDetectorClient {
        ExternalDetectorClient::new(server.uri(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_analyze_normalizes_array_bboxes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze/base64"))
            .and(body_partial_json(serde_json::json!({ "model": "yolo" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "detections": [
                    {"label": "car", "confidence": 0.92, "bbox": [10.4, 20.6, 30.0, 40.0]}
                ],
                "inference_ms": 17
            })))
            .mount(&server)
            .await;

        let analysis = client(&server).analyze(b"jpegbytes", "yolo").await.unwrap();
        assert_eq!(analysis.inference_ms, 17);
        assert_eq!(analysis.detections.len(), 1);
        let det = &analysis.detections[0];
        assert_eq!(det.label, "car");
        assert_eq!(det.bbox, BoundingBox::new(10, 21, 30, 40));
    }

    #[tokio::test]
    async fn test_analyze_accepts_objects_alias_and_object_bbox() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze/base64"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "objects": [
                    {"class": "person", "confidence": 0.7,
                     "bbox": {"x": 5, "y": 6, "width": 7, "height": 8}}
                ]
            })))
            .mount(&server)
            .await;

        let analysis = client(&server).analyze(b"jpegbytes", "ssd").await.unwrap();
        assert_eq!(analysis.detections[0].label, "person");
        assert_eq!(analysis.detections[0].bbox, BoundingBox::new(5, 6, 7, 8));
        // No server figure: wall clock is used instead.
        assert!(analysis.inference_ms < 5_000);
    }

    #[tokio::test]
    async fn test_analyze_propagates_service_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze/base64"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "model not loaded"
            })))
            .mount(&server)
            .await;

        let err = client(&server).analyze(b"x", "yolo").await.unwrap_err();
        assert!(matches!(err, DetectError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_analyze_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze/base64"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).analyze(b"x", "yolo").await.unwrap_err();
        assert!(matches!(err, DetectError::Http(_)));
    }

    #[tokio::test]
    async fn test_status_probe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "available": true })),
            )
            .mount(&server)
            .await;
        assert!(client(&server).is_available().await);
    }

    #[tokio::test]
    async fn test_status_probe_unreachable() {
        let client = ExternalDetectorClient::new(
            "http://127.0.0.1:1", // nothing listens here
            Duration::from_secs(5),
        );
        assert!(!client.is_available().await);
    }
}
