//! Live update messages fanned out to transport adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detection::DetectorMode;
use crate::event::ParkingEvent;
use crate::occupancy::ZoneOccupancy;
use crate::zone::Zone;

/// Compact per-zone line in the `initial_state` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancySummary {
    pub zone_id: String,
    pub zone_name: String,
    pub count: u32,
    pub last_updated: DateTime<Utc>,
}

impl From<&ZoneOccupancy> for OccupancySummary {
    fn from(occ: &ZoneOccupancy) -> Self {
        Self {
            zone_id: occ.zone_id.clone(),
            zone_name: occ.zone_name.clone(),
            count: occ.count,
            last_updated: occ.last_updated,
        }
    }
}

/// Typed broadcast message envelope.
///
/// Delivery is best-effort: slow subscribers may miss messages, producers
/// never block on the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateMessage {
    /// Sent to each newly attached subscriber.
    InitialState { zones: Vec<OccupancySummary> },

    /// A zone's count was re-published.
    OccupancyUpdate {
        zone_id: String,
        zone_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        camera_id: Option<String>,
        count: u32,
        alarm: bool,
        timestamp: DateTime<Utc>,
    },

    /// The active detector variant changed.
    ModeChanged { mode: DetectorMode },

    ZoneCreated { zone: Zone },
    ZoneUpdated { zone: Zone },
    ZoneDeleted { zone_id: String },

    /// An entry/exit/occupancy-change event was logged.
    ParkingEvent { event: ParkingEvent },
}

impl UpdateMessage {
    /// Initial-state message from an occupancy snapshot.
    pub fn initial_state<'a>(zones: impl IntoIterator<Item = &'a ZoneOccupancy>) -> Self {
        UpdateMessage::InitialState {
            zones: zones.into_iter().map(OccupancySummary::from).collect(),
        }
    }

    /// Occupancy update derived from the freshly written entry.
    pub fn occupancy_update(occ: &ZoneOccupancy) -> Self {
        UpdateMessage::OccupancyUpdate {
            zone_id: occ.zone_id.clone(),
            zone_name: occ.zone_name.clone(),
            camera_id: occ.camera_id.clone(),
            count: occ.count,
            alarm: occ.alarm,
            timestamp: occ.last_updated,
        }
    }

    pub fn mode_changed(mode: DetectorMode) -> Self {
        UpdateMessage::ModeChanged { mode }
    }

    pub fn parking_event(event: ParkingEvent) -> Self {
        UpdateMessage::ParkingEvent { event }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_message_tagging() {
        let msg = UpdateMessage::mode_changed(DetectorMode::ExternalYolo);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"mode_changed\""));
        assert!(json.contains("\"mode\":\"external-yolo\""));
    }

    #[test]
    fn test_occupancy_update_fields() {
        let occ = ZoneOccupancy {
            zone_id: "z1".into(),
            zone_name: "bay".into(),
            camera_id: None,
            count: 3,
            blobs: vec![],
            alarm: true,
            last_updated: Utc::now(),
        };
        let json = serde_json::to_string(&UpdateMessage::occupancy_update(&occ)).unwrap();
        assert!(json.contains("\"type\":\"occupancy_update\""));
        assert!(json.contains("\"count\":3"));
        // Unassigned camera is omitted, not null.
        assert!(!json.contains("camera_id"));
    }

    #[test]
    fn test_zone_deleted_shape() {
        let msg = UpdateMessage::ZoneDeleted {
            zone_id: "z9".into(),
        };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"zone_deleted","zone_id":"z9"}"#
        );
    }
}
