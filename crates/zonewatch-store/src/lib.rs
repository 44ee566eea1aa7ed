//! Embedded row store for ZoneWatch.
//!
//! SQLite (via rusqlite, bundled) used as a plain row store with three
//! tables: `zones`, `background_frames`, and the append-only `events` log.
//! Polygons are stored as serialized JSON; timestamps as RFC 3339 text.
//!
//! ## Modules
//! - `db` - connection handling and schema
//! - `zones` - zone CRUD and background blobs
//! - `events` - event append and queries
//! - `error` - typed errors (`StoreResult`)

pub mod db;
pub mod error;
mod events;
mod zones;

pub use db::Store;
pub use error::{StoreError, StoreResult};
