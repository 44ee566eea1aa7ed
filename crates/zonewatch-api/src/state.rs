//! Application state.

use std::sync::Arc;

use zonewatch_camera::SnapshotClient;
use zonewatch_detect::DetectionService;
use zonewatch_engine::{OccupancyTracker, Scheduler, UpdateSink};
use zonewatch_store::{Store, StoreResult};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Store,
    pub snapshot: SnapshotClient,
    pub detector: Arc<DetectionService>,
    pub tracker: Arc<OccupancyTracker>,
    pub scheduler: Scheduler,
    pub sink: UpdateSink,
}

impl AppState {
    /// Create new application state around an already-open store.
    pub fn new(config: AppConfig, store: Store) -> Self {
        let sink = UpdateSink::new();
        let snapshot =
            SnapshotClient::new(config.snapshot_base_url.clone(), config.snapshot_timeout);
        let detector = Arc::new(DetectionService::new(
            config.external_detector_url.clone(),
            config.detector_timeout,
        ));
        let tracker = Arc::new(OccupancyTracker::new(store.clone(), sink.clone()));
        let scheduler = Scheduler::new(
            snapshot.clone(),
            store.clone(),
            Arc::clone(&detector),
            Arc::clone(&tracker),
        );

        Self {
            config,
            store,
            snapshot,
            detector,
            tracker,
            scheduler,
            sink,
        }
    }

    /// State wired to the configured on-disk store.
    pub fn from_config(config: AppConfig) -> StoreResult<Self> {
        let store = Store::open(&config.database_path)?;
        Ok(Self::new(config, store))
    }
}
