//! Occupancy state and the entry/exit event state machine.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use zonewatch_models::{
    Blob, EventKind, EventStats, NewEvent, ParkingEvent, UpdateMessage, Zone, ZoneOccupancy,
    ZoneSession,
};
use zonewatch_store::{Store, StoreResult};

use crate::sink::UpdateSink;

#[derive(Default)]
struct TrackerState {
    occupancy: HashMap<String, ZoneOccupancy>,
    /// One session per zone, present iff the last published count was > 0.
    sessions: HashMap<String, ZoneSession>,
}

/// Process-wide occupancy tracker.
///
/// Every write captures the previous count, updates the entry atomically,
/// runs the event state machine, appends the event row, and publishes the
/// resulting update messages. A single async mutex serializes the whole
/// read-modify-write so per-zone writes are totally ordered and each logged
/// event observes exactly the previous write's count.
pub struct OccupancyTracker {
    store: Store,
    sink: UpdateSink,
    state: Mutex<TrackerState>,
}

impl OccupancyTracker {
    pub fn new(store: Store, sink: UpdateSink) -> Self {
        Self {
            store,
            sink,
            state: Mutex::new(TrackerState::default()),
        }
    }

    /// Record a fresh count for a zone.
    ///
    /// Returns the published occupancy entry and the event that was logged,
    /// if the transition produced one. A failed event append surfaces as an
    /// error after the in-memory state and the occupancy update have
    /// already been published; callers in the scheduler log and continue.
    pub async fn record(
        &self,
        zone: &Zone,
        count: u32,
        blobs: Vec<Blob>,
        now: DateTime<Utc>,
    ) -> StoreResult<(ZoneOccupancy, Option<ParkingEvent>)> {
        let mut state = self.state.lock().await;

        let prev = state
            .occupancy
            .get(&zone.id)
            .map(|occ| occ.count)
            .unwrap_or(0);

        let entry = ZoneOccupancy {
            zone_id: zone.id.clone(),
            zone_name: zone.name.clone(),
            camera_id: zone.camera_id.clone(),
            count,
            blobs,
            alarm: count >= zone.alarm_threshold,
            last_updated: now,
        };
        state.occupancy.insert(zone.id.clone(), entry.clone());

        let pending_event = transition(&mut state.sessions, zone, prev, count, now);
        self.sink.publish(UpdateMessage::occupancy_update(&entry));

        let event = match pending_event {
            Some(new_event) => {
                debug!(
                    zone_id = %zone.id,
                    kind = new_event.kind.as_str(),
                    prev, count, "occupancy transition"
                );
                let stored = self.store.append_event(new_event).await?;
                self.sink
                    .publish(UpdateMessage::parking_event(stored.clone()));
                Some(stored)
            }
            None => None,
        };

        Ok((entry, event))
    }

    /// Latest entry for one zone.
    pub async fn get(&self, zone_id: &str) -> Option<ZoneOccupancy> {
        self.state.lock().await.occupancy.get(zone_id).cloned()
    }

    /// Every tracked zone, sorted by name for stable output.
    pub async fn snapshot(&self) -> Vec<ZoneOccupancy> {
        let state = self.state.lock().await;
        let mut entries: Vec<ZoneOccupancy> = state.occupancy.values().cloned().collect();
        entries.sort_by(|a, b| a.zone_name.cmp(&b.zone_name));
        entries
    }

    /// Number of zones with a live session.
    pub async fn occupied_count(&self) -> u64 {
        self.state.lock().await.sessions.len() as u64
    }

    /// Drop all state for a deleted zone.
    pub async fn remove_zone(&self, zone_id: &str) {
        let mut state = self.state.lock().await;
        state.occupancy.remove(zone_id);
        if state.sessions.remove(zone_id).is_some() {
            warn!(zone_id, "dropped live session for deleted zone");
        }
    }

    /// Aggregate statistics: log-derived totals plus the live occupied count.
    pub async fn stats(&self, since: Option<DateTime<Utc>>) -> StoreResult<EventStats> {
        let (total_entries, total_exits, avg_duration_seconds, by_zone) =
            self.store.event_stats(since).await?;
        Ok(EventStats {
            total_entries,
            total_exits,
            current_occupied: self.occupied_count().await,
            avg_duration_seconds,
            by_zone,
        })
    }
}

/// Map a `(prev, new)` count transition onto an event, mutating sessions.
fn transition(
    sessions: &mut HashMap<String, ZoneSession>,
    zone: &Zone,
    prev: u32,
    new: u32,
    now: DateTime<Utc>,
) -> Option<NewEvent> {
    if prev == new {
        return None;
    }

    let base = NewEvent {
        zone_id: zone.id.clone(),
        zone_name: zone.name.clone(),
        camera_id: zone.camera_id.clone(),
        kind: EventKind::OccupancyChange,
        count_before: prev,
        count_after: new,
        duration_seconds: None,
        entry_time: None,
        exit_time: None,
        timestamp: now,
    };

    if prev == 0 {
        sessions.insert(
            zone.id.clone(),
            ZoneSession {
                entry_time: now,
                count_at_entry: new,
            },
        );
        return Some(NewEvent {
            kind: EventKind::Entry,
            entry_time: Some(now),
            ..base
        });
    }

    if new == 0 {
        // A missing session (process restart) still emits the exit, just
        // without a dwell duration.
        let session = sessions.remove(&zone.id);
        let duration = session
            .map(|s| (now - s.entry_time).num_milliseconds() as f64 / 1000.0);
        return Some(NewEvent {
            kind: EventKind::Exit,
            duration_seconds: duration,
            entry_time: session.map(|s| s.entry_time),
            exit_time: Some(now),
            ..base
        });
    }

    Some(base)
}
