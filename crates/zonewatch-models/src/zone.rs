//! Zone records and their validation rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::geometry::{polygon_area, Point};

/// Default minimum blob area in pixels squared.
pub const DEFAULT_MIN_AREA: u32 = 500;
/// Default maximum blob area in pixels squared.
pub const DEFAULT_MAX_AREA: u32 = 50_000;
/// Default occupancy count at which the zone alarms.
pub const DEFAULT_ALARM_THRESHOLD: u32 = 1;

/// Why a zone input was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZoneValidationError {
    #[error("polygon must have at least 3 points, got {0}")]
    TooFewPoints(usize),

    #[error("polygon contains a non-finite coordinate")]
    NonFiniteCoordinate,

    #[error("polygon is degenerate (zero area)")]
    DegeneratePolygon,

    #[error("min_area {min} exceeds max_area {max}")]
    AreaBoundsInverted { min: u32, max: u32 },

    #[error("alarm_threshold must be at least 1")]
    ZeroAlarmThreshold,
}

/// A named polygonal region on one camera's image plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Opaque stable identifier (UUID v4 assigned by the store).
    pub id: String,
    pub name: String,
    /// Camera this zone belongs to; `None` means the zone is unassigned and
    /// applies to ad-hoc analysis on any camera.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<String>,
    /// Ordered vertices in image pixel space.
    pub polygon: Vec<Point>,
    pub min_area: u32,
    pub max_area: u32,
    pub alarm_threshold: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a zone create request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneInput {
    pub name: String,
    #[serde(default)]
    pub camera_id: Option<String>,
    pub polygon: Vec<Point>,
    #[serde(default)]
    pub min_area: Option<u32>,
    #[serde(default)]
    pub max_area: Option<u32>,
    #[serde(default)]
    pub alarm_threshold: Option<u32>,
}

/// Distinguish an absent key from an explicit null for double-`Option`
/// fields: the field default stays `None`, while any present value
/// (including null) lands in `Some(..)`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Partial zone update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZonePatch {
    #[serde(default)]
    pub name: Option<String>,
    /// `{"camera_id": null}` clears the assignment; an absent key keeps it.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub camera_id: Option<Option<String>>,
    #[serde(default)]
    pub polygon: Option<Vec<Point>>,
    #[serde(default)]
    pub min_area: Option<u32>,
    #[serde(default)]
    pub max_area: Option<u32>,
    #[serde(default)]
    pub alarm_threshold: Option<u32>,
}

impl ZonePatch {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.camera_id.is_none()
            && self.polygon.is_none()
            && self.min_area.is_none()
            && self.max_area.is_none()
            && self.alarm_threshold.is_none()
    }
}

/// Validate polygon and threshold invariants shared by create and update.
pub fn validate_zone_fields(
    polygon: &[Point],
    min_area: u32,
    max_area: u32,
    alarm_threshold: u32,
) -> Result<(), ZoneValidationError> {
    if polygon.len() < 3 {
        return Err(ZoneValidationError::TooFewPoints(polygon.len()));
    }
    if polygon.iter().any(|p| !p.is_finite()) {
        return Err(ZoneValidationError::NonFiniteCoordinate);
    }
    if polygon_area(polygon).abs() == 0.0 {
        return Err(ZoneValidationError::DegeneratePolygon);
    }
    if min_area > max_area {
        return Err(ZoneValidationError::AreaBoundsInverted {
            min: min_area,
            max: max_area,
        });
    }
    if alarm_threshold == 0 {
        return Err(ZoneValidationError::ZeroAlarmThreshold);
    }
    Ok(())
}

impl ZoneInput {
    /// Effective area/alarm settings with defaults applied.
    pub fn resolved_thresholds(&self) -> (u32, u32, u32) {
        (
            self.min_area.unwrap_or(DEFAULT_MIN_AREA),
            self.max_area.unwrap_or(DEFAULT_MAX_AREA),
            self.alarm_threshold.unwrap_or(DEFAULT_ALARM_THRESHOLD),
        )
    }

    /// Validate the input as the store would before persisting.
    pub fn validate(&self) -> Result<(), ZoneValidationError> {
        let (min_area, max_area, alarm_threshold) = self.resolved_thresholds();
        validate_zone_fields(&self.polygon, min_area, max_area, alarm_threshold)
    }
}
