//! Live occupancy state per zone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detection::Blob;

/// Latest published occupancy for one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneOccupancy {
    pub zone_id: String,
    pub zone_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<String>,
    pub count: u32,
    pub blobs: Vec<Blob>,
    /// `count >= zone.alarm_threshold` at the time of the write.
    pub alarm: bool,
    pub last_updated: DateTime<Utc>,
}

/// Dwell-timing state for an occupied zone.
///
/// Exists exactly while the last published count is positive; opened on the
/// 0→positive transition and closed (consumed) on the positive→0 transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneSession {
    pub entry_time: DateTime<Utc>,
    pub count_at_entry: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupancy_serde_shape() {
        let occ = ZoneOccupancy {
            zone_id: "z1".into(),
            zone_name: "bay".into(),
            camera_id: Some("cam-a".into()),
            count: 2,
            blobs: vec![],
            alarm: true,
            last_updated: Utc::now(),
        };
        let json = serde_json::to_string(&occ).unwrap();
        assert!(json.contains("\"alarm\":true"));
        assert!(json.contains("\"camera_id\":\"cam-a\""));
    }
}
