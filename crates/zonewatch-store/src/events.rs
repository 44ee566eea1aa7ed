//! Append-only event log and its queries.

use rusqlite::{params_from_iter, Row, ToSql};
use zonewatch_models::{
    EventFilter, EventKind, NewEvent, ParkingEvent, ZoneEventStats,
};

use crate::db::{parse_ts, Store};
use crate::error::{StoreError, StoreResult};

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<RawEvent> {
    Ok(RawEvent {
        id: row.get(0)?,
        zone_id: row.get(1)?,
        zone_name: row.get(2)?,
        camera_id: row.get(3)?,
        kind: row.get(4)?,
        count_before: row.get(5)?,
        count_after: row.get(6)?,
        duration_seconds: row.get(7)?,
        entry_time: row.get(8)?,
        exit_time: row.get(9)?,
        timestamp: row.get(10)?,
    })
}

struct RawEvent {
    id: i64,
    zone_id: String,
    zone_name: String,
    camera_id: Option<String>,
    kind: String,
    count_before: u32,
    count_after: u32,
    duration_seconds: Option<f64>,
    entry_time: Option<String>,
    exit_time: Option<String>,
    timestamp: String,
}

impl RawEvent {
    fn into_event(self) -> StoreResult<ParkingEvent> {
        let kind = EventKind::parse(&self.kind)
            .ok_or_else(|| StoreError::corrupt_row(format!("bad event kind {:?}", self.kind)))?;
        Ok(ParkingEvent {
            id: self.id,
            zone_id: self.zone_id,
            zone_name: self.zone_name,
            camera_id: self.camera_id,
            kind,
            count_before: self.count_before,
            count_after: self.count_after,
            duration_seconds: self.duration_seconds,
            entry_time: self.entry_time.as_deref().map(parse_ts).transpose()?,
            exit_time: self.exit_time.as_deref().map(parse_ts).transpose()?,
            timestamp: parse_ts(&self.timestamp)?,
        })
    }
}

const EVENT_COLUMNS: &str = "id, zone_id, zone_name, camera_id, kind, count_before, count_after,
    duration_seconds, entry_time, exit_time, timestamp";

fn filter_clauses(filter: &EventFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut args: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(zone_id) = &filter.zone_id {
        clauses.push("zone_id = ?");
        args.push(Box::new(zone_id.clone()));
    }
    if let Some(camera_id) = &filter.camera_id {
        clauses.push("camera_id = ?");
        args.push(Box::new(camera_id.clone()));
    }
    if let Some(event_type) = &filter.event_type {
        clauses.push("kind = ?");
        args.push(Box::new(event_type.clone()));
    }
    if let Some(since) = &filter.since {
        clauses.push("timestamp >= ?");
        args.push(Box::new(since.to_rfc3339()));
    }
    if let Some(until) = &filter.until {
        clauses.push("timestamp < ?");
        args.push(Box::new(until.to_rfc3339()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (where_sql, args)
}

impl Store {
    /// Append one event, returning the stored row.
    pub async fn append_event(&self, event: NewEvent) -> StoreResult<ParkingEvent> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO events (zone_id, zone_name, camera_id, kind, count_before,
                                     count_after, duration_seconds, entry_time, exit_time,
                                     timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    event.zone_id,
                    event.zone_name,
                    event.camera_id,
                    event.kind.as_str(),
                    event.count_before,
                    event.count_after,
                    event.duration_seconds,
                    event.entry_time.map(|t| t.to_rfc3339()),
                    event.exit_time.map(|t| t.to_rfc3339()),
                    event.timestamp.to_rfc3339(),
                ],
            )?;
            let id = conn.last_insert_rowid();
            Ok(ParkingEvent {
                id,
                zone_id: event.zone_id,
                zone_name: event.zone_name,
                camera_id: event.camera_id,
                kind: event.kind,
                count_before: event.count_before,
                count_after: event.count_after,
                duration_seconds: event.duration_seconds,
                entry_time: event.entry_time,
                exit_time: event.exit_time,
                timestamp: event.timestamp,
            })
        })
        .await
    }

    /// Filtered page of events (newest first) plus the unpaged total.
    pub async fn query_events(
        &self,
        filter: EventFilter,
    ) -> StoreResult<(Vec<ParkingEvent>, u64)> {
        self.with_conn(move |conn| {
            let (where_sql, args) = filter_clauses(&filter);

            let total: u64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM events{where_sql}"),
                params_from_iter(args.iter().map(|a| a.as_ref())),
                |row| row.get(0),
            )?;

            let sql = format!(
                "SELECT {EVENT_COLUMNS} FROM events{where_sql}
                 ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?"
            );
            let mut stmt = conn.prepare(&sql)?;
            let limit = filter.effective_limit() as i64;
            let offset = filter.offset.unwrap_or(0) as i64;
            let mut page_args: Vec<&dyn ToSql> =
                args.iter().map(|a| a.as_ref()).collect();
            page_args.push(&limit);
            page_args.push(&offset);

            let rows = stmt.query_map(params_from_iter(page_args), event_from_row)?;
            let mut events = Vec::new();
            for row in rows {
                events.push(row?.into_event()?);
            }
            Ok((events, total))
        })
        .await
    }

    /// Last `limit` events for one zone, newest first.
    pub async fn zone_history(&self, zone_id: &str, limit: u32) -> StoreResult<Vec<ParkingEvent>> {
        let filter = EventFilter {
            zone_id: Some(zone_id.to_string()),
            limit: Some(limit),
            ..Default::default()
        };
        Ok(self.query_events(filter).await?.0)
    }

    /// Entry/exit aggregates, overall and per zone.
    ///
    /// `since` is an inclusive lower bound applied to both. The live
    /// `current_occupied` figure comes from the engine's session map, so this
    /// returns only the log-derived parts.
    pub async fn event_stats(
        &self,
        since: Option<chrono::DateTime<chrono::Utc>>,
    ) -> StoreResult<(u64, u64, Option<f64>, Vec<ZoneEventStats>)> {
        self.with_conn(move |conn| {
            let (where_sql, args): (String, Vec<Box<dyn ToSql>>) = match since {
                Some(ts) => (
                    " WHERE timestamp >= ?".to_string(),
                    vec![Box::new(ts.to_rfc3339())],
                ),
                None => (String::new(), Vec::new()),
            };

            let sql = format!(
                "SELECT zone_id, zone_name,
                        SUM(CASE WHEN kind = 'entry' THEN 1 ELSE 0 END),
                        SUM(CASE WHEN kind = 'exit' THEN 1 ELSE 0 END),
                        SUM(CASE WHEN kind = 'exit' THEN duration_seconds END),
                        SUM(CASE WHEN kind = 'exit' AND duration_seconds IS NOT NULL
                                 THEN 1 ELSE 0 END)
                 FROM events{where_sql}
                 GROUP BY zone_id, zone_name
                 ORDER BY zone_name"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params_from_iter(args.iter().map(|a| a.as_ref())),
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, u64>(2)?,
                        row.get::<_, u64>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                        row.get::<_, u64>(5)?,
                    ))
                },
            )?;

            let mut by_zone = Vec::new();
            let (mut total_entries, mut total_exits) = (0u64, 0u64);
            let (mut total_duration, mut completed_exits) = (0.0f64, 0u64);
            for row in rows {
                let (zone_id, zone_name, entries, exits, duration_sum, timed_exits) = row?;
                total_entries += entries;
                total_exits += exits;
                let avg = duration_sum
                    .filter(|_| timed_exits > 0)
                    .map(|sum| sum / timed_exits as f64);
                if let Some(sum) = duration_sum {
                    total_duration += sum;
                    completed_exits += timed_exits;
                }
                by_zone.push(ZoneEventStats {
                    zone_id,
                    zone_name,
                    entries,
                    exits,
                    avg_duration_seconds: avg,
                });
            }

            let avg_duration = (completed_exits > 0).then(|| total_duration / completed_exits as f64);
            Ok((total_entries, total_exits, avg_duration, by_zone))
        })
        .await
    }
}
