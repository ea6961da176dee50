//! Persistent settings storage
//!
//! One CRC-validated Flash block holds every durable setting (schedules, WiFi
//! credentials) as namespaced key/value entries. Modules share a single
//! [`Settings`] instance through [`SharedSettings`]; each mutating bus
//! operation flushes synchronously before its response goes out.

pub mod kv;

pub use kv::KvStore;

use crate::core::traits::ModuleState;
use crate::platform::traits::FlashInterface;
use crate::{log_error, log_warn};

/// Storage-level errors
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Flash device cannot be read or written
    Unavailable,
    /// Stored data present but failed validation
    Corrupt,
    /// Key, value or entry count beyond the store's bounds
    CapacityExceeded,
}

/// The settings store together with its Flash device.
pub struct Settings<F: FlashInterface> {
    kv: KvStore,
    flash: F,
}

impl<F: FlashInterface> Settings<F> {
    /// Load settings from Flash.
    ///
    /// A corrupt or unreadable store is logged and replaced with an empty
    /// one; the system keeps running on defaults.
    pub fn load(mut flash: F) -> Self {
        let kv = match KvStore::load_from_flash(&mut flash) {
            Ok(kv) => kv,
            Err(StorageError::Corrupt) => {
                log_warn!("settings block corrupt, starting empty");
                KvStore::new()
            }
            Err(_) => {
                log_error!("settings flash unavailable, starting empty");
                KvStore::new()
            }
        };
        Self { kv, flash }
    }

    /// Get the value stored under `key`
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.kv.get(key)
    }

    /// Store `value` under `key` (in memory; call `flush` to persist)
    pub fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.kv.put(key, value)
    }

    /// Remove the value stored under `key`
    pub fn remove(&mut self, key: &str) -> bool {
        self.kv.remove(key)
    }

    /// Write pending changes to Flash
    pub fn flush(&mut self) -> Result<(), StorageError> {
        self.kv.save_to_flash(&mut self.flash)
    }

    /// Tear down, returning the Flash device (reboot simulation in tests)
    pub fn release(self) -> F {
        self.flash
    }
}

/// Settings shared across modules
pub type SharedSettings<F> = ModuleState<Settings<F>>;
