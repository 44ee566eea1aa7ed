//! Imaging error types.

use thiserror::Error;

/// Result type for imaging operations.
pub type ImagingResult<T> = Result<T, ImagingError>;

/// Errors produced by the image pipeline.
#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("dimension mismatch: expected {expected_w}x{expected_h}, got {actual_w}x{actual_h}")]
    DimensionMismatch {
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },

    #[error("image encode failed: {0}")]
    Encode(String),
}

impl ImagingError {
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Build a mismatch error from two plane dimension pairs.
    pub fn dimension_mismatch(expected: (u32, u32), actual: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            expected_w: expected.0,
            expected_h: expected.1,
            actual_w: actual.0,
            actual_h: actual.1,
        }
    }
}

impl From<image::ImageError> for ImagingError {
    fn from(e: image::ImageError) -> Self {
        ImagingError::InvalidImage(e.to_string())
    }
}
