//! Occupancy tracking, event logging, and scheduling for ZoneWatch.
//!
//! The engine ties the pipeline together: the scheduler pulls snapshots and
//! fans detection across a camera's zones, the occupancy tracker converts
//! counts into entry/exit events with dwell attribution, and the update sink
//! broadcasts every state change to attached transport adapters. Both the
//! scheduler and the tracker depend only on the one-way `UpdateSink`
//! interface; subscribers register with the sink, never with the state.

pub mod occupancy;
pub mod scheduler;
pub mod sink;

pub use occupancy::OccupancyTracker;
pub use scheduler::{Scheduler, SchedulerStatus, DEFAULT_INTERVAL_MS};
pub use sink::UpdateSink;
