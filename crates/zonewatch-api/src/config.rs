//! API configuration.

use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Base URL of the snapshot source
    pub snapshot_base_url: String,
    /// Base URL of the external object-detector service
    pub external_detector_url: String,
    /// Path of the SQLite row store
    pub database_path: String,
    /// Timeout for snapshot fetches
    pub snapshot_timeout: Duration,
    /// Timeout for external detector calls
    pub detector_timeout: Duration,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size (base64 frames can be large)
    pub max_body_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3620,
            snapshot_base_url: "http://localhost:1984".to_string(),
            external_detector_url: "http://localhost:3000".to_string(),
            database_path: "zonewatch.db".to_string(),
            snapshot_timeout: Duration::from_secs(5),
            detector_timeout: Duration::from_secs(10),
            cors_origins: vec!["*".to_string()],
            max_body_size: 20 * 1024 * 1024, // 20MB
        }
    }
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3620),
            snapshot_base_url: std::env::var("SNAPSHOT_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:1984".to_string()),
            external_detector_url: std::env::var("EXTERNAL_DETECTOR_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "zonewatch.db".to_string()),
            snapshot_timeout: Duration::from_secs(
                std::env::var("SNAPSHOT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            detector_timeout: Duration::from_secs(
                std::env::var("DETECTOR_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20 * 1024 * 1024),
        }
    }
}
