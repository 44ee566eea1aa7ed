//! Shared data models for the ZoneWatch backend.
//!
//! This crate provides Serde-serializable types for:
//! - Zones (polygonal regions of interest with detection thresholds)
//! - Blobs and detections produced by the analysis pipeline
//! - Occupancy snapshots and dwell sessions
//! - Parking events (entry / exit / occupancy change)
//! - Live update messages fanned out to transport adapters

pub mod detection;
pub mod event;
pub mod geometry;
pub mod occupancy;
pub mod update;
pub mod zone;

// Re-export common types
pub use detection::{
    Blob, BoundingBox, Detection, DetectionResult, DetectorMode, DetectOptions,
    UnknownModeError, DEFAULT_CONFIDENCE_THRESHOLD,
};
pub use event::{
    EventFilter, EventKind, EventStats, NewEvent, ParkingEvent, ZoneEventStats,
};
pub use geometry::{polygon_area, Point};
pub use occupancy::{ZoneOccupancy, ZoneSession};
pub use update::{OccupancySummary, UpdateMessage};
pub use zone::{
    validate_zone_fields, Zone, ZoneInput, ZonePatch, ZoneValidationError,
    DEFAULT_ALARM_THRESHOLD, DEFAULT_MAX_AREA, DEFAULT_MIN_AREA,
};
