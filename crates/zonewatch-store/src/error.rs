//! Store error types.

use thiserror::Error;
use zonewatch_models::ZoneValidationError;

/// Result type for row-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during row-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid zone: {0}")]
    InvalidZone(#[from] ZoneValidationError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt row: {0}")]
    CorruptRow(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn corrupt_row(msg: impl Into<String>) -> Self {
        Self::CorruptRow(msg.into())
    }

    /// True for absent-row errors (mapped to 404 by the transport).
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
