//! Zone CRUD and background-frame blobs.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;
use uuid::Uuid;
use zonewatch_models::{validate_zone_fields, Point, Zone, ZoneInput, ZonePatch};

use crate::db::{parse_ts, Store};
use crate::error::{StoreError, StoreResult};

fn zone_from_row(row: &Row<'_>) -> rusqlite::Result<(Zone, String)> {
    // Defer polygon/timestamp parsing so rusqlite's FromSql stays simple.
    Ok((
        Zone {
            id: row.get(0)?,
            name: row.get(1)?,
            camera_id: row.get(2)?,
            polygon: Vec::new(),
            min_area: row.get(4)?,
            max_area: row.get(5)?,
            alarm_threshold: row.get(6)?,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        },
        row.get::<_, String>(3)?,
    ))
}

fn finish_zone(
    (mut zone, polygon_json): (Zone, String),
    created_at: &str,
    updated_at: &str,
) -> StoreResult<Zone> {
    zone.polygon = serde_json::from_str::<Vec<Point>>(&polygon_json)?;
    zone.created_at = parse_ts(created_at)?;
    zone.updated_at = parse_ts(updated_at)?;
    Ok(zone)
}

fn read_zone(conn: &Connection, id: &str) -> StoreResult<Option<Zone>> {
    conn.query_row(
        "SELECT id, name, camera_id, polygon, min_area, max_area, alarm_threshold,
                created_at, updated_at
         FROM zones WHERE id = ?1",
        params![id],
        |row| {
            let partial = zone_from_row(row)?;
            let created: String = row.get(7)?;
            let updated: String = row.get(8)?;
            Ok((partial, created, updated))
        },
    )
    .optional()?
    .map(|(partial, created, updated)| finish_zone(partial, &created, &updated))
    .transpose()
}

impl Store {
    /// Create a zone, assigning an opaque id and applying defaults.
    pub async fn create_zone(&self, input: ZoneInput) -> StoreResult<Zone> {
        input.validate()?;
        self.with_conn(move |conn| {
            let (min_area, max_area, alarm_threshold) = input.resolved_thresholds();
            let now = Utc::now();
            let zone = Zone {
                id: Uuid::new_v4().to_string(),
                name: input.name,
                camera_id: input.camera_id,
                polygon: input.polygon,
                min_area,
                max_area,
                alarm_threshold,
                created_at: now,
                updated_at: now,
            };
            conn.execute(
                "INSERT INTO zones (id, name, camera_id, polygon, min_area, max_area,
                                    alarm_threshold, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    zone.id,
                    zone.name,
                    zone.camera_id,
                    serde_json::to_string(&zone.polygon)?,
                    zone.min_area,
                    zone.max_area,
                    zone.alarm_threshold,
                    zone.created_at.to_rfc3339(),
                    zone.updated_at.to_rfc3339(),
                ],
            )?;
            info!(zone_id = %zone.id, name = %zone.name, "created zone");
            Ok(zone)
        })
        .await
    }

    /// Fetch one zone; `NotFound` when absent.
    pub async fn get_zone(&self, id: &str) -> StoreResult<Zone> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            read_zone(conn, &id)?.ok_or_else(|| StoreError::not_found(format!("zone {id}")))
        })
        .await
    }

    /// All zones, newest first.
    pub async fn list_zones(&self) -> StoreResult<Vec<Zone>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, camera_id, polygon, min_area, max_area, alarm_threshold,
                        created_at, updated_at
                 FROM zones ORDER BY created_at DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                let partial = zone_from_row(row)?;
                let created: String = row.get(7)?;
                let updated: String = row.get(8)?;
                Ok((partial, created, updated))
            })?;
            let mut zones = Vec::new();
            for row in rows {
                let (partial, created, updated) = row?;
                zones.push(finish_zone(partial, &created, &updated)?);
            }
            Ok(zones)
        })
        .await
    }

    /// Zones assigned to exactly this camera.
    pub async fn zones_for_camera(&self, camera_id: &str) -> StoreResult<Vec<Zone>> {
        let camera_id = camera_id.to_string();
        let all = self.list_zones().await?;
        Ok(all
            .into_iter()
            .filter(|z| z.camera_id.as_deref() == Some(camera_id.as_str()))
            .collect())
    }

    /// Apply a partial update; re-validates the merged record.
    pub async fn update_zone(&self, id: &str, patch: ZonePatch) -> StoreResult<Zone> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let mut zone =
                read_zone(conn, &id)?.ok_or_else(|| StoreError::not_found(format!("zone {id}")))?;

            if let Some(name) = patch.name {
                zone.name = name;
            }
            if let Some(camera_id) = patch.camera_id {
                zone.camera_id = camera_id;
            }
            if let Some(polygon) = patch.polygon {
                zone.polygon = polygon;
            }
            if let Some(min_area) = patch.min_area {
                zone.min_area = min_area;
            }
            if let Some(max_area) = patch.max_area {
                zone.max_area = max_area;
            }
            if let Some(alarm_threshold) = patch.alarm_threshold {
                zone.alarm_threshold = alarm_threshold;
            }
            validate_zone_fields(
                &zone.polygon,
                zone.min_area,
                zone.max_area,
                zone.alarm_threshold,
            )?;
            zone.updated_at = Utc::now();

            conn.execute(
                "UPDATE zones SET name = ?2, camera_id = ?3, polygon = ?4, min_area = ?5,
                                  max_area = ?6, alarm_threshold = ?7, updated_at = ?8
                 WHERE id = ?1",
                params![
                    zone.id,
                    zone.name,
                    zone.camera_id,
                    serde_json::to_string(&zone.polygon)?,
                    zone.min_area,
                    zone.max_area,
                    zone.alarm_threshold,
                    zone.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(zone)
        })
        .await
    }

    /// Delete a zone and its event rows; returns whether a zone row existed.
    pub async fn delete_zone(&self, id: &str) -> StoreResult<bool> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            // Event rows reference the zone; remove them first.
            tx.execute("DELETE FROM events WHERE zone_id = ?1", params![id])?;
            let removed = tx.execute("DELETE FROM zones WHERE id = ?1", params![id])?;
            tx.commit()?;
            if removed > 0 {
                info!(zone_id = %id, "deleted zone and its events");
            }
            Ok(removed > 0)
        })
        .await
    }

    /// Upsert the background blob for a camera.
    pub async fn save_background(&self, camera_id: &str, blob: Vec<u8>) -> StoreResult<()> {
        let camera_id = camera_id.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO background_frames (camera_id, frame, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(camera_id) DO UPDATE SET frame = ?2, updated_at = ?3",
                params![camera_id, blob, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
        .await
    }

    /// Fetch the background blob for a camera, if one has been captured.
    pub async fn get_background(&self, camera_id: &str) -> StoreResult<Option<Vec<u8>>> {
        let camera_id = camera_id.to_string();
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT frame FROM background_frames WHERE camera_id = ?1",
                    params![camera_id],
                    |row| row.get::<_, Vec<u8>>(0),
                )
                .optional()?)
        })
        .await
    }
}
