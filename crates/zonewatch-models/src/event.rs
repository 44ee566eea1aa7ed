//! Parking events and event-log queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of occupancy transition an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Zone went from empty to occupied.
    Entry,
    /// Zone returned to empty.
    Exit,
    /// Count changed between two non-zero values.
    OccupancyChange,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Entry => "entry",
            EventKind::Exit => "exit",
            EventKind::OccupancyChange => "occupancy_change",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "entry" => Some(EventKind::Entry),
            "exit" => Some(EventKind::Exit),
            "occupancy_change" => Some(EventKind::OccupancyChange),
            _ => None,
        }
    }
}

/// An append-only occupancy transition record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingEvent {
    /// Monotone row id assigned by the store.
    pub id: i64,
    pub zone_id: String,
    pub zone_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<String>,
    #[serde(rename = "event_type")]
    pub kind: EventKind,
    pub count_before: u32,
    pub count_after: u32,
    /// Dwell time in seconds; present only on exits that closed a session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_time: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

/// An event about to be appended; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub zone_id: String,
    pub zone_name: String,
    pub camera_id: Option<String>,
    pub kind: EventKind,
    pub count_before: u32,
    pub count_after: u32,
    pub duration_seconds: Option<f64>,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

/// Query filters for the event log. All filters are ANDed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
    #[serde(default)]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub camera_id: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    /// Inclusive lower bound on event timestamps.
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on event timestamps.
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
}

impl EventFilter {
    pub const DEFAULT_LIMIT: u32 = 100;
    pub const MAX_LIMIT: u32 = 1000;

    /// Effective page size with the default and cap applied.
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .min(Self::MAX_LIMIT)
    }
}

/// Per-zone aggregation row in the statistics response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneEventStats {
    pub zone_id: String,
    pub zone_name: String,
    pub entries: u64,
    pub exits: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_duration_seconds: Option<f64>,
}

/// Aggregated event statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
    pub total_entries: u64,
    pub total_exits: u64,
    /// Number of zones with a live session (in-memory, not log-derived).
    pub current_occupied: u64,
    /// Mean dwell time over completed sessions, exits only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_duration_seconds: Option<f64>,
    pub by_zone: Vec<ZoneEventStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_form() {
        assert_eq!(
            serde_json::to_string(&EventKind::OccupancyChange).unwrap(),
            "\"occupancy_change\""
        );
        assert_eq!(EventKind::parse("exit"), Some(EventKind::Exit));
        assert_eq!(EventKind::parse("arrival"), None);
    }

    #[test]
    fn test_event_serializes_kind_as_event_type() {
        let event = ParkingEvent {
            id: 7,
            zone_id: "z1".into(),
            zone_name: "bay".into(),
            camera_id: None,
            kind: EventKind::Entry,
            count_before: 0,
            count_after: 2,
            duration_seconds: None,
            entry_time: Some(Utc::now()),
            exit_time: None,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"entry\""));
        assert!(!json.contains("duration_seconds"));
    }

    #[test]
    fn test_filter_limit_cap() {
        let filter = EventFilter {
            limit: Some(100_000),
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), EventFilter::MAX_LIMIT);
        assert_eq!(EventFilter::default().effective_limit(), 100);
    }
}
