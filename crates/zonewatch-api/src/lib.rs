//! Axum transport adapter for the ZoneWatch core.
//!
//! The interesting logic lives in the engine/detect/store crates; this crate
//! wires them to HTTP routes, the live WebSocket channel, configuration, and
//! process bootstrap.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod ws;

#[cfg(test)]
mod api_tests;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
