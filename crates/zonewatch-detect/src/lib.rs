//! Detector variants for the ZoneWatch pipeline.
//!
//! Two ways to count objects inside a zone polygon:
//! - `blob` - background-subtraction + connected components, built on
//!   `zonewatch-imaging`; always available.
//! - `external` - delegates to the external object-detector service and
//!   post-filters its detections by containment, class, and confidence.
//!
//! `DetectionService` holds the process-wide active mode and handles
//! fallback from a failing external service to the blob pipeline.

pub mod blob;
pub mod error;
pub mod external;
pub mod service;


pub use error::{DetectError, DetectResult};
pub use external::{ExternalAnalysis, ExternalDetectorClient};
pub use service::{DetectionService, ModeInfo};
