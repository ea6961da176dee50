//! Schedule persistence
//!
//! Durable record format and storage seam for the schedule engine. The
//! engine saves its complete active set on every mutation and loads it back
//! at startup; what "saving" means is behind [`ScheduleStore`] so the engine
//! can be exercised without flash.
//!
//! On storage the set lives under namespaced settings keys: `sched/cnt`
//! holds the active-entry count, `sched/<ordinal>` one fixed-size record per
//! active entry.

use super::MAX_SCHEDULES;
use crate::core::traits::SharedState;
use crate::platform::traits::FlashInterface;
use crate::storage::{SharedSettings, StorageError};
use core::fmt::Write;
use heapless::{String, Vec};

/// Count key
const KEY_COUNT: &str = "sched/cnt";

/// Record key prefix (`sched/0` .. `sched/19`)
const KEY_PREFIX: &str = "sched/";

/// Encoded record length
pub const RECORD_LEN: usize = 5;

/// Durable snapshot of one active schedule entry.
///
/// `slot` is the entry's identity at save time; load tries to give it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedSchedule {
    pub hour: u8,
    pub minute: u8,
    pub song_index: u16,
    pub slot: u8,
}

impl PersistedSchedule {
    /// Fixed-size little-endian record
    pub fn to_bytes(self) -> [u8; RECORD_LEN] {
        let song = self.song_index.to_le_bytes();
        [self.hour, self.minute, song[0], song[1], self.slot]
    }

    /// Parse a record; anything but exactly [`RECORD_LEN`] bytes is rejected.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        if raw.len() != RECORD_LEN {
            return None;
        }
        Some(Self {
            hour: raw[0],
            minute: raw[1],
            song_index: u16::from_le_bytes([raw[2], raw[3]]),
            slot: raw[4],
        })
    }
}

/// Storage seam for the schedule engine.
pub trait ScheduleStore {
    /// Replace the stored set with `records`.
    fn save(&mut self, records: &[PersistedSchedule]) -> Result<(), StorageError>;

    /// Read the stored set. Records that fail to parse are skipped, not
    /// partially applied.
    fn load(&mut self) -> Result<Vec<PersistedSchedule, MAX_SCHEDULES>, StorageError>;
}

/// Settings-backed schedule store.
pub struct SettingsScheduleStore<'a, F: FlashInterface> {
    settings: &'a SharedSettings<F>,
}

impl<'a, F: FlashInterface> SettingsScheduleStore<'a, F> {
    pub fn new(settings: &'a SharedSettings<F>) -> Self {
        Self { settings }
    }
}

fn record_key(ordinal: usize) -> String<{ crate::storage::kv::MAX_KEY_LEN }> {
    let mut key = String::new();
    // "sched/" + at most two digits always fits the key bound
    let _ = write!(key, "{}{}", KEY_PREFIX, ordinal);
    key
}

impl<F: FlashInterface> ScheduleStore for SettingsScheduleStore<'_, F> {
    fn save(&mut self, records: &[PersistedSchedule]) -> Result<(), StorageError> {
        self.settings.with_mut(|settings| {
            settings.put(KEY_COUNT, &(records.len() as u32).to_le_bytes())?;
            for (ordinal, record) in records.iter().enumerate() {
                settings.put(record_key(ordinal).as_str(), &record.to_bytes())?;
            }
            // Drop stale records beyond the new count
            for ordinal in records.len()..MAX_SCHEDULES {
                settings.remove(record_key(ordinal).as_str());
            }
            settings.flush()
        })
    }

    fn load(&mut self) -> Result<Vec<PersistedSchedule, MAX_SCHEDULES>, StorageError> {
        self.settings.with(|settings| {
            let count = match settings.get(KEY_COUNT) {
                Some(raw) if raw.len() == 4 => {
                    u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize
                }
                Some(_) => return Err(StorageError::Corrupt),
                None => 0,
            };

            let mut records = Vec::new();
            for ordinal in 0..count.min(MAX_SCHEDULES) {
                let Some(raw) = settings.get(record_key(ordinal).as_str()) else {
                    continue;
                };
                // Wrong-length records are skipped whole
                if let Some(record) = PersistedSchedule::from_bytes(raw) {
                    records.push(record).ok();
                }
            }
            Ok(records)
        })
    }
}
