//! Blobs, detections, and detector selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default confidence floor applied to external detections.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Axis-aligned bounding box in integer pixel space.
///
/// Boxes derived from connected components are inclusive on all sides, so a
/// single-pixel component has `width == height == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point of the box.
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

/// A connected component of changed pixels inside a zone mask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    /// Id in encounter order within one analysis (row-major scan).
    pub id: u32,
    /// Member pixel count.
    pub area: u32,
    /// Integer-rounded mean of member pixel coordinates.
    pub centroid: (u32, u32),
    pub bbox: BoundingBox,
}

/// A generic object observation from any detector variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    /// Confidence in `[0, 1]`; 1.0 for blob detections.
    pub confidence: f64,
    pub bbox: BoundingBox,
}

/// Which detector variant is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DetectorMode {
    /// Background-subtraction blob detection (built in).
    #[default]
    Blob,
    /// External object-detector service, YOLO model.
    ExternalYolo,
    /// External object-detector service, SSD model.
    ExternalSsd,
}

impl DetectorMode {
    pub const ALL: [DetectorMode; 3] = [
        DetectorMode::Blob,
        DetectorMode::ExternalYolo,
        DetectorMode::ExternalSsd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorMode::Blob => "blob",
            DetectorMode::ExternalYolo => "external-yolo",
            DetectorMode::ExternalSsd => "external-ssd",
        }
    }

    /// Human-readable name for mode listings.
    pub fn display_name(&self) -> &'static str {
        match self {
            DetectorMode::Blob => "Background subtraction",
            DetectorMode::ExternalYolo => "External detector (YOLO)",
            DetectorMode::ExternalSsd => "External detector (SSD)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DetectorMode::Blob => {
                "Difference against a per-camera background frame, morphology cleanup, \
                 connected components inside the zone polygon"
            }
            DetectorMode::ExternalYolo => {
                "Delegates to the external detector service with a YOLO model tag"
            }
            DetectorMode::ExternalSsd => {
                "Delegates to the external detector service with an SSD model tag"
            }
        }
    }

    /// True for modes that call the external detector service.
    pub fn is_external(&self) -> bool {
        !matches!(self, DetectorMode::Blob)
    }

    /// Model tag sent to the external service.
    pub fn model_tag(&self) -> Option<&'static str> {
        match self {
            DetectorMode::Blob => None,
            DetectorMode::ExternalYolo => Some("yolo"),
            DetectorMode::ExternalSsd => Some("ssd"),
        }
    }
}

impl fmt::Display for DetectorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for unrecognized detector mode strings.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown detection mode: {0}")]
pub struct UnknownModeError(pub String);

impl FromStr for DetectorMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(DetectorMode::Blob),
            "external-yolo" => Ok(DetectorMode::ExternalYolo),
            "external-ssd" => Ok(DetectorMode::ExternalSsd),
            other => Err(UnknownModeError(other.to_string())),
        }
    }
}

/// Per-call analysis options, usually derived from the zone record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectOptions {
    pub min_area: u32,
    pub max_area: u32,
    /// Confidence floor for external detections.
    pub confidence_threshold: f64,
    /// Allow-list of class labels; `None` keeps every class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            min_area: crate::zone::DEFAULT_MIN_AREA,
            max_area: crate::zone::DEFAULT_MAX_AREA,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            classes: None,
        }
    }
}

impl DetectOptions {
    /// Options for a specific zone's area gates.
    pub fn for_zone(zone: &crate::Zone) -> Self {
        Self {
            min_area: zone.min_area,
            max_area: zone.max_area,
            ..Self::default()
        }
    }
}

/// Normalized result returned by every detector variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
    /// Always `detections.len()`.
    pub count: usize,
    /// Wall-clock analysis time, or the server-reported figure for the
    /// external variant when present.
    pub inference_ms: u64,
    /// The mode that actually produced the detections. A failed external
    /// call that fell back to blob detection reports `blob` here.
    pub mode: DetectorMode,
    /// Blob detail for the blob variant, used by the renderer and the
    /// occupancy snapshot. Empty for external detections.
    #[serde(default)]
    pub blobs: Vec<Blob>,
}

impl DetectionResult {
    pub fn new(detections: Vec<Detection>, inference_ms: u64, mode: DetectorMode) -> Self {
        Self {
            count: detections.len(),
            detections,
            inference_ms,
            mode,
            blobs: Vec::new(),
        }
    }

    pub fn with_blobs(mut self, blobs: Vec<Blob>) -> Self {
        self.blobs = blobs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trip() {
        for mode in DetectorMode::ALL {
            assert_eq!(mode.as_str().parse::<DetectorMode>().unwrap(), mode);
        }
        assert!("hailo-yolo".parse::<DetectorMode>().is_err());
    }

    #[test]
    fn test_mode_serde_kebab_case() {
        let json = serde_json::to_string(&DetectorMode::ExternalYolo).unwrap();
        assert_eq!(json, "\"external-yolo\"");
    }

    #[test]
    fn test_bbox_center() {
        let bbox = BoundingBox::new(40, 40, 20, 20);
        assert_eq!(bbox.center(), (50.0, 50.0));
    }

    #[test]
    fn test_result_count_matches_len() {
        let det = Detection {
            label: "object".into(),
            confidence: 1.0,
            bbox: BoundingBox::new(0, 0, 2, 2),
        };
        let result = DetectionResult::new(vec![det.clone(), det], 3, DetectorMode::Blob);
        assert_eq!(result.count, 2);
    }
}
