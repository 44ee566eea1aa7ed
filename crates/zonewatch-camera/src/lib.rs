//! Client for the external snapshot source.
//!
//! The snapshot source exposes one JPEG still per camera
//! (`GET /api/frame.jpeg?src={camera_id}`) and a stream directory
//! (`GET /api/streams`) whose object keys are the camera ids. All calls are
//! bounded by the configured timeout so a wedged source cannot stall a
//! scheduler tick.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Result type for snapshot-source operations.
pub type CameraResult<T> = Result<T, CameraError>;

/// Errors from the snapshot source.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("snapshot request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("snapshot source returned {status} for camera {camera_id}")]
    FrameUnavailable {
        camera_id: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid stream directory: {0}")]
    InvalidStreams(String),
}

/// Snapshot-source HTTP client.
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    base_url: String,
    client: reqwest::Client,
}

impl SnapshotClient {
    /// Create a client for the given base URL with a per-request timeout.
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

    /// Fetch the latest JPEG frame for one camera.
    pub async fn fetch_frame(&self, camera_id: &str) -> CameraResult<Vec<u8>> {
        let url = format!("{}/api/frame.jpeg", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("src", camera_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CameraError::FrameUnavailable {
                camera_id: camera_id.to_string(),
                status: response.status(),
            });
        }

        let bytes = response.bytes().await?;
        debug!(camera_id, bytes = bytes.len(), "fetched snapshot frame");
        Ok(bytes.to_vec())
    }

    /// Fetch an arbitrary still URL (used by `/analyze-stream`).
    pub async fn fetch_url(&self, url: &str) -> CameraResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CameraError::FrameUnavailable {
                camera_id: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Discover camera ids from the stream directory, sorted.
    pub async fn list_cameras(&self) -> CameraResult<Vec<String>> {
        let url = format!("{}/api/streams", self.base_url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: serde_json::Value = response.json().await?;

        let map = body
            .as_object()
            .ok_or_else(|| CameraError::InvalidStreams("expected a JSON object".into()))?;
        let mut cameras: Vec<String> = map.keys().cloned().collect();
        cameras.sort();
        Ok(cameras)
    }
}
