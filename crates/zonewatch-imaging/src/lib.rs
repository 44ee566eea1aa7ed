//! Grayscale image primitives and frame annotation.
//!
//! Everything here operates on `image::GrayImage` planes (8-bit luma with
//! explicit dimensions). The binary images produced by thresholding use the
//! convention 255 = foreground, 0 = background.
//!
//! ## Modules
//! - `codec` - JPEG/PNG decode to grayscale, PNG background blobs
//! - `ops` - thresholding, morphology, running-mean background update
//! - `mask` - polygon rasterization and point-in-polygon tests
//! - `components` - connected-component extraction with area gating
//! - `annotate` - zone/blob overlay rendering onto JPEG frames

pub mod annotate;
pub mod codec;
pub mod components;
pub mod error;
pub mod mask;
pub mod ops;

mod font;

pub use annotate::{render_annotated, ZoneOverlay};
pub use codec::{
    decode_background_png, decode_gray, decode_rgb, encode_background_png, encode_jpeg,
    ANNOTATED_JPEG_QUALITY,
};
pub use components::connected_components;
pub use error::{ImagingError, ImagingResult};
pub use mask::{apply_mask, point_in_polygon, polygon_mask};
pub use ops::{
    abs_diff_threshold, dilate, erode, mean_diff_threshold, mean_luma, morphology_open,
    running_mean_update, DEFAULT_ALPHA, DEFAULT_DIFF_THRESHOLD, DEFAULT_MORPH_PASSES,
};
