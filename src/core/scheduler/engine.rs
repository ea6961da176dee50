//! Schedule engine state machine
//!
//! A fixed array of 20 slots; a slot's index is the schedule's identity for
//! as long as it stays active. Each entry debounces on the calendar minute:
//! it fires when a delivered time sample matches its hour/minute and it has
//! not fired in that minute yet, and re-arms as soon as a sample reports a
//! different minute.
//!
//! The engine is deliberately free of bus and clock knowledge: time arrives
//! as plain (hour, minute) pairs, fired entries are returned to the caller,
//! and persistence goes through the [`ScheduleStore`] seam.

use super::persist::{PersistedSchedule, ScheduleStore};
use super::MAX_SCHEDULES;
use crate::log_warn;
use heapless::Vec;

/// Schedule operation failures, reported as failure responses, never fatal.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// No free slot for an add
    CapacityExceeded,
    /// Remove identity outside the array range
    InvalidIdentity,
    /// Add with hour ≥ 24 or minute ≥ 60
    InvalidTime,
}

#[derive(Debug, Clone, Copy)]
struct ScheduleEntry {
    active: bool,
    hour: u8,
    minute: u8,
    song_index: u16,
    /// Already fired in the current minute
    triggered: bool,
    /// Minute seen by the last evaluation; `None` until first checked
    last_checked_minute: Option<u8>,
}

impl ScheduleEntry {
    const EMPTY: ScheduleEntry = ScheduleEntry {
        active: false,
        hour: 0,
        minute: 0,
        song_index: 0,
        triggered: false,
        last_checked_minute: None,
    };
}

/// The schedule engine
pub struct ScheduleEngine<S: ScheduleStore> {
    entries: [ScheduleEntry; MAX_SCHEDULES],
    enabled: bool,
    store: S,
}

impl<S: ScheduleStore> ScheduleEngine<S> {
    /// Create an engine with every slot free and scheduling enabled
    pub fn new(store: S) -> Self {
        Self {
            entries: [ScheduleEntry::EMPTY; MAX_SCHEDULES],
            enabled: true,
            store,
        }
    }

    /// Load the persisted set into the slot array.
    ///
    /// Each record goes back to the slot it was saved from; if that slot is
    /// out of range or already taken by an earlier record, the first free
    /// slot is used instead. Records that exhaust the array are dropped.
    pub fn restore(&mut self) {
        let records = match self.store.load() {
            Ok(records) => records,
            Err(e) => {
                log_warn!("schedule restore failed: {:?}", e);
                return;
            }
        };

        for record in records {
            if record.hour >= 24 || record.minute >= 60 {
                log_warn!("dropping stored schedule with invalid time");
                continue;
            }

            let slot = record.slot as usize;
            let target = if slot < MAX_SCHEDULES && !self.entries[slot].active {
                Some(slot)
            } else {
                self.first_free_slot()
            };

            if let Some(target) = target {
                self.entries[target] = ScheduleEntry {
                    active: true,
                    hour: record.hour,
                    minute: record.minute,
                    song_index: record.song_index,
                    triggered: false,
                    last_checked_minute: None,
                };
            }
        }
    }

    /// Add an entry into the first free slot.
    ///
    /// Identical duplicates are allowed. Returns the new slot identity;
    /// on failure nothing changes, in memory or on storage.
    pub fn add(&mut self, hour: u8, minute: u8, song_index: u16) -> Result<u8, ScheduleError> {
        if hour >= 24 || minute >= 60 {
            return Err(ScheduleError::InvalidTime);
        }

        let slot = self.first_free_slot().ok_or(ScheduleError::CapacityExceeded)?;
        self.entries[slot] = ScheduleEntry {
            active: true,
            hour,
            minute,
            song_index,
            triggered: false,
            last_checked_minute: None,
        };
        self.persist();
        Ok(slot as u8)
    }

    /// Free the slot named by `id`.
    ///
    /// Any in-range identity succeeds: removing an already-free slot is a
    /// no-op success; the only checked bound is the array range.
    pub fn remove(&mut self, id: i32) -> Result<u8, ScheduleError> {
        let slot = usize::try_from(id).map_err(|_| ScheduleError::InvalidIdentity)?;
        if slot >= MAX_SCHEDULES {
            return Err(ScheduleError::InvalidIdentity);
        }

        self.entries[slot].active = false;
        self.persist();
        Ok(slot as u8)
    }

    /// Free every slot
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            entry.active = false;
        }
        self.persist();
    }

    /// Snapshot of the active set in ascending slot order
    pub fn active_set(&self) -> Vec<PersistedSchedule, MAX_SCHEDULES> {
        let mut set = Vec::new();
        for (slot, entry) in self.entries.iter().enumerate() {
            if entry.active {
                // Cannot overflow: the array and the Vec share their bound
                set.push(PersistedSchedule {
                    hour: entry.hour,
                    minute: entry.minute,
                    song_index: entry.song_index,
                    slot: slot as u8,
                })
                .ok();
            }
        }
        set
    }

    /// Master switch. While disabled the engine's host stops feeding it time
    /// samples; individual entries keep their state.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Evaluate every active entry against a delivered time sample.
    ///
    /// A minute change re-arms an entry regardless of whether the new minute
    /// matches; a match fires an armed entry at most once per minute.
    /// Returns the entries fired by this sample.
    pub fn evaluate(&mut self, hour: u8, minute: u8) -> Vec<PersistedSchedule, MAX_SCHEDULES> {
        let mut fired = Vec::new();

        for (slot, entry) in self.entries.iter_mut().enumerate() {
            if !entry.active {
                continue;
            }

            if entry.last_checked_minute != Some(minute) {
                entry.last_checked_minute = Some(minute);
                entry.triggered = false;
            }

            if entry.hour == hour && entry.minute == minute && !entry.triggered {
                entry.triggered = true;
                fired
                    .push(PersistedSchedule {
                        hour: entry.hour,
                        minute: entry.minute,
                        song_index: entry.song_index,
                        slot: slot as u8,
                    })
                    .ok();
            }
        }

        fired
    }

    fn first_free_slot(&self) -> Option<usize> {
        self.entries.iter().position(|e| !e.active)
    }

    /// Write the complete active set through the store.
    ///
    /// A failed write is logged and otherwise ignored; the in-memory state
    /// stays authoritative and the operation's response is unaffected.
    fn persist(&mut self) {
        let set = self.active_set();
        if let Err(e) = self.store.save(&set) {
            log_warn!("schedule persist failed: {:?}", e);
        }
    }
}
