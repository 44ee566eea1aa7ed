//! Round-robin camera scheduler.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use zonewatch_camera::SnapshotClient;
use zonewatch_detect::DetectionService;
use zonewatch_models::DetectOptions;
use zonewatch_store::Store;

use crate::occupancy::OccupancyTracker;

/// Default tick interval when the start request does not set one.
pub const DEFAULT_INTERVAL_MS: u64 = 5_000;

#[derive(Debug, Default)]
struct RoundRobinState {
    enabled: bool,
    cameras: Vec<String>,
    interval_ms: u64,
    cursor: usize,
    /// Camera visited by the most recent tick.
    current_camera: Option<String>,
}

/// Scheduler status snapshot for the admin API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerStatus {
    pub enabled: bool,
    pub cameras: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_camera: Option<String>,
    pub interval_ms: u64,
}

/// Round-robin ticker over a fixed camera list.
///
/// `start` resets the cursor, ticks once immediately, then ticks on a
/// periodic timer. Each tick analyzes one camera: snapshot fetch, per-zone
/// detection, occupancy record (which logs events and publishes updates).
/// `stop` lets an in-flight tick finish and halts before the next one.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    snapshot: SnapshotClient,
    store: Store,
    detector: Arc<DetectionService>,
    tracker: Arc<OccupancyTracker>,
    state: Mutex<RoundRobinState>,
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
}

impl Scheduler {
    pub fn new(
        snapshot: SnapshotClient,
        store: Store,
        detector: Arc<DetectionService>,
        tracker: Arc<OccupancyTracker>,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                snapshot,
                store,
                detector,
                tracker,
                state: Mutex::new(RoundRobinState::default()),
                stop_tx: Mutex::new(None),
            }),
        }
    }

    /// Start (or reconfigure) the ticker. Resets the cursor to zero.
    pub fn start(&self, cameras: Vec<String>, interval_ms: u64) {
        let interval_ms = interval_ms.max(100);
        self.halt_ticker();
        {
            let mut state = self.inner.state.lock().unwrap();
            state.enabled = true;
            state.cameras = cameras.clone();
            state.interval_ms = interval_ms;
            state.cursor = 0;
            state.current_camera = None;
        }
        info!(?cameras, interval_ms, "round-robin scheduler started");

        let (stop_tx, mut stop_rx) = watch::channel(false);
        *self.inner.stop_tx.lock().unwrap() = Some(stop_tx);

        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                        scheduler.run_tick().await;
                    }
                }
            }
            debug!("scheduler ticker exited");
        });
    }

    /// Stop the ticker before its next tick.
    pub fn stop(&self) {
        self.halt_ticker();
        let mut state = self.inner.state.lock().unwrap();
        if state.enabled {
            state.enabled = false;
            info!("round-robin scheduler stopped");
        }
    }

    fn halt_ticker(&self) {
        if let Some(stop_tx) = self.inner.stop_tx.lock().unwrap().take() {
            let _ = stop_tx.send(true);
        }
    }

    /// Current configuration and position.
    pub fn status(&self) -> SchedulerStatus {
        let state = self.inner.state.lock().unwrap();
        SchedulerStatus {
            enabled: state.enabled,
            cameras: state.cameras.clone(),
            current_camera: state.current_camera.clone(),
            interval_ms: state.interval_ms,
        }
    }

    /// Run one tick: visit the camera under the cursor and advance.
    ///
    /// Failures are recovered per tick (snapshot) or per zone (detection,
    /// persistence); the cursor advances regardless.
    pub async fn run_tick(&self) {
        let camera = {
            let mut state = self.inner.state.lock().unwrap();
            if state.cameras.is_empty() {
                return;
            }
            let camera = state.cameras[state.cursor % state.cameras.len()].clone();
            state.cursor = (state.cursor + 1) % state.cameras.len();
            state.current_camera = Some(camera.clone());
            camera
        };

        if let Err(e) = self.analyze_camera(&camera).await {
            error!(camera, "tick failed: {e:#}");
        }
    }

    /// Analyze every zone assigned to one camera.
    async fn analyze_camera(&self, camera: &str) -> anyhow::Result<()> {
        let inner = &self.inner;

        let frame = inner.snapshot.fetch_frame(camera).await?;
        let zones = inner.store.zones_for_camera(camera).await?;
        if zones.is_empty() {
            debug!(camera, "no zones assigned, skipping analysis");
            return Ok(());
        }
        let background = inner.store.get_background(camera).await?;

        for zone in &zones {
            let options = DetectOptions::for_zone(zone);
            let result = match inner
                .detector
                .analyze(&frame, background.as_deref(), &zone.polygon, &options)
                .await
            {
                Ok(result) => result,
                Err(e) => {
                    // Dimension mismatches and decode failures skip the
                    // zone; the rest of the tick continues.
                    warn!(camera, zone_id = %zone.id, "zone analysis failed: {e}");
                    continue;
                }
            };

            if let Err(e) = inner
                .tracker
                .record(zone, result.count as u32, result.blobs, Utc::now())
                .await
            {
                warn!(camera, zone_id = %zone.id, "failed to persist event: {e}");
            }
        }
        Ok(())
    }
}
