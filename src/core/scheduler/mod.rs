//! Schedule engine
//!
//! Owns the bounded set of timed playback triggers: evaluates them against
//! delivered time samples, fires each at most once per calendar minute,
//! persists every mutation and restores the set at startup.
//!
//! [`engine`] is the pure state machine, [`persist`] its durable record
//! format and storage seam, [`service`] the bus-facing wrapper that turns
//! request messages into engine calls and engine results into responses.

pub mod engine;
pub mod persist;
pub mod service;

pub use engine::{ScheduleEngine, ScheduleError};
pub use persist::{PersistedSchedule, ScheduleStore, SettingsScheduleStore};
pub use service::ScheduleService;

/// Maximum number of schedule entries
pub const MAX_SCHEDULES: usize = 20;
