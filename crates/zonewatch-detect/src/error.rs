//! Detector error types.

use thiserror::Error;
use zonewatch_imaging::ImagingError;

/// Result type for detector operations.
pub type DetectResult<T> = Result<T, DetectError>;

/// Errors that can occur while running detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error(transparent)]
    Imaging(#[from] ImagingError),

    #[error("external detector request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("external detector returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("detector backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl DetectError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// True when the blob pipeline refused mismatched planes; surfaced to
    /// callers instead of being recovered.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            DetectError::Imaging(ImagingError::DimensionMismatch { .. })
        )
    }
}
