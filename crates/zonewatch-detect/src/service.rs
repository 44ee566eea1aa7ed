//! Active-detector selection and dispatch.

use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, warn};
use zonewatch_imaging::point_in_polygon;
use zonewatch_models::{DetectOptions, Detection, DetectionResult, DetectorMode, Point};

use crate::blob;
use crate::error::{DetectError, DetectResult};
use crate::external::ExternalDetectorClient;

/// Mode descriptor returned by the mode listing endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModeInfo {
    pub mode: DetectorMode,
    pub name: &'static str,
    pub description: &'static str,
    pub active: bool,
    pub available: bool,
}

/// Process-wide detector selector.
///
/// Holds the active mode and the external-service client; `analyze`
/// dispatches to the matching variant. External failures fall back to the
/// blob pipeline rather than surfacing to the caller.
pub struct DetectionService {
    mode: RwLock<DetectorMode>,
    external: ExternalDetectorClient,
}

impl DetectionService {
    pub fn new(external_base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            mode: RwLock::new(DetectorMode::default()),
            external: ExternalDetectorClient::new(external_base_url, timeout),
        }
    }

    /// The currently selected mode.
    pub async fn current_mode(&self) -> DetectorMode {
        *self.mode.read().await
    }

    /// Probe whether the external service answers its status endpoint.
    pub async fn external_available(&self) -> bool {
        self.external.is_available().await
    }

    /// Switch the active mode.
    ///
    /// Selecting an external mode requires the service to answer its
    /// availability probe; otherwise the switch fails with
    /// `BackendUnavailable` and the previous mode stays active.
    pub async fn set_mode(&self, mode: DetectorMode) -> DetectResult<DetectorMode> {
        if mode.is_external() && !self.external.is_available().await {
            return Err(DetectError::backend_unavailable(format!(
                "external detector not reachable, cannot switch to {mode}"
            )));
        }
        let mut current = self.mode.write().await;
        *current = mode;
        info!(%mode, "detection mode changed");
        Ok(mode)
    }

    /// Describe every mode with active/available flags.
    pub async fn modes(&self) -> Vec<ModeInfo> {
        let active = self.current_mode().await;
        let external_up = self.external.is_available().await;
        DetectorMode::ALL
            .into_iter()
            .map(|mode| ModeInfo {
                mode,
                name: mode.display_name(),
                description: mode.description(),
                active: mode == active,
                available: !mode.is_external() || external_up,
            })
            .collect()
    }

    /// Analyze one zone polygon with the active variant.
    pub async fn analyze(
        &self,
        frame: &[u8],
        background: Option<&[u8]>,
        polygon: &[Point],
        options: &DetectOptions,
    ) -> DetectResult<DetectionResult> {
        let mode = self.current_mode().await;
        let model = match mode.model_tag() {
            None => return blob::analyze(frame, background, polygon, options),
            Some(model) => model,
        };

        match self.external.analyze(frame, model).await {
            Ok(analysis) => {
                let detections = post_filter(analysis.detections, polygon, options);
                Ok(DetectionResult::new(detections, analysis.inference_ms, mode))
            }
            Err(e) => {
                // Degrade to the built-in pipeline; the result reports the
                // mode that actually produced it.
                warn!(%mode, error = %e, "external detector failed, falling back to blob");
                blob::analyze(frame, None, polygon, options)
            }
        }
    }
}

/// Containment, class, and confidence filters, applied in that order.
fn post_filter(
    detections: Vec<Detection>,
    polygon: &[Point],
    options: &DetectOptions,
) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| {
            let (cx, cy) = d.bbox.center();
            point_in_polygon(cx, cy, polygon)
        })
        .filter(|d| match &options.classes {
            Some(allowed) => allowed.iter().any(|c| c == &d.label),
            None => true,
        })
        .filter(|d| d.confidence >= options.confidence_threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonewatch_models::BoundingBox;

    fn det(label: &str, confidence: f64, x: u32, y: u32) -> Detection {
        Detection {
            label: label.into(),
            confidence,
            bbox: BoundingBox::new(x, y, 10, 10),
        }
    }

    fn square100() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]
    }

    #[test]
    fn test_post_filter_containment() {
        let options = DetectOptions::default();
        let kept = post_filter(
            vec![det("car", 0.9, 20, 20), det("car", 0.9, 200, 20)],
            &square100(),
            &options,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].bbox.x, 20);
    }

    #[test]
    fn test_post_filter_class_allow_list() {
        let options = DetectOptions {
            classes: Some(vec!["car".into()]),
            ..Default::default()
        };
        let kept = post_filter(
            vec![det("car", 0.9, 20, 20), det("person", 0.9, 30, 30)],
            &square100(),
            &options,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].label, "car");
    }

    #[test]
    fn test_post_filter_confidence_floor() {
        let options = DetectOptions {
            confidence_threshold: 0.5,
            ..Default::default()
        };
        let kept = post_filter(
            vec![det("car", 0.49, 20, 20), det("car", 0.5, 30, 30)],
            &square100(),
            &options,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.5);
    }
}
