//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use zonewatch_imaging::ImagingError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<zonewatch_store::StoreError> for ApiError {
    fn from(e: zonewatch_store::StoreError) -> Self {
        use zonewatch_store::StoreError;
        match e {
            StoreError::InvalidZone(e) => ApiError::BadRequest(e.to_string()),
            StoreError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<zonewatch_detect::DetectError> for ApiError {
    fn from(e: zonewatch_detect::DetectError) -> Self {
        use zonewatch_detect::DetectError;
        match e {
            DetectError::BackendUnavailable(msg) => ApiError::BadRequest(msg),
            DetectError::Imaging(img) => img.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ImagingError> for ApiError {
    fn from(e: ImagingError) -> Self {
        match e {
            ImagingError::InvalidImage(_) | ImagingError::DimensionMismatch { .. } => {
                ApiError::BadRequest(e.to_string())
            }
            ImagingError::Encode(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<zonewatch_camera::CameraError> for ApiError {
    fn from(e: zonewatch_camera::CameraError) -> Self {
        ApiError::Upstream(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
