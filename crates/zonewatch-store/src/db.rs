//! Connection handling and schema.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::info;

use crate::error::{StoreError, StoreResult};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS zones (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    camera_id       TEXT,
    polygon         TEXT NOT NULL,
    min_area        INTEGER NOT NULL,
    max_area        INTEGER NOT NULL,
    alarm_threshold INTEGER NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS background_frames (
    camera_id  TEXT PRIMARY KEY,
    frame      BLOB NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    zone_id          TEXT NOT NULL,
    zone_name        TEXT NOT NULL,
    camera_id        TEXT,
    kind             TEXT NOT NULL,
    count_before     INTEGER NOT NULL,
    count_after      INTEGER NOT NULL,
    duration_seconds REAL,
    entry_time       TEXT,
    exit_time        TEXT,
    timestamp        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp);
CREATE INDEX IF NOT EXISTS idx_events_zone ON events(zone_id);
";

/// Handle to the embedded row store.
///
/// The connection lives behind a mutex; every public method hops through
/// `spawn_blocking` so SQLite work never runs on the async executor.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::init(conn, Some(path.as_ref().display().to_string()))
    }

    /// Open a throwaway in-memory store (tests, ad-hoc tooling).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<String>) -> StoreResult<Self> {
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        if let Some(path) = path {
            info!(path, "opened row store");
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    pub(crate) async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(|e| e.into_inner());
            f(&mut guard)
        })
        .await?
    }
}

/// Parse an RFC 3339 timestamp column.
pub(crate) fn parse_ts(s: &str) -> StoreResult<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| StoreError::corrupt_row(format!("bad timestamp {s:?}: {e}")))
}
