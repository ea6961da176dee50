//! Flash-backed key/value store
//!
//! Persistent settings storage using a CRC-validated Flash block. This is the
//! durable home of the schedule set and the WiFi credentials, addressed by
//! namespaced string keys (`sched/0`, `wifi/ssid`, ...).
//!
//! # Flash Block Format
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Magic: [u8; 4] = b"SETT"                      │  Offset: 0
//! ├───────────────────────────────────────────────┤
//! │ Version: u32 = 1                              │  Offset: 4
//! ├───────────────────────────────────────────────┤
//! │ Entry Count: u32                              │  Offset: 8
//! ├───────────────────────────────────────────────┤
//! │ Entries: [(key, value)]                       │  Offset: 12
//! │   key: [u8; 16] (null-terminated)             │
//! │   value_len: u8                               │
//! │   value: value_len bytes                      │
//! ├───────────────────────────────────────────────┤
//! │ CRC32: u32                                    │  Offset: block_size - 4
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Reads fall back across several block copies; writes go to block 0 and are
//! skipped entirely while the store is clean.

use super::StorageError;
use crate::platform::traits::FlashInterface;
use heapless::{FnvIndexMap, String, Vec};

/// Settings block base address (Flash offset)
const SETTINGS_BLOCK_BASE: u32 = 0x040000; // 256 KB

/// Settings block size (4 KB per block)
const SETTINGS_BLOCK_SIZE: u32 = 4096;

/// Number of settings blocks probed on load
const SETTINGS_BLOCK_COUNT: u32 = 4;

/// Magic number for settings blocks
const SETTINGS_MAGIC: [u8; 4] = *b"SETT";

/// Settings format version
const SETTINGS_VERSION: u32 = 1;

/// Maximum key length
pub const MAX_KEY_LEN: usize = 16;

/// Maximum value length
pub const MAX_VALUE_LEN: usize = 64;

/// Maximum number of entries
pub const MAX_ENTRIES: usize = 32;

/// Bounded key/value map with Flash persistence
pub struct KvStore {
    entries: FnvIndexMap<String<MAX_KEY_LEN>, Vec<u8, MAX_VALUE_LEN>, MAX_ENTRIES>,
    /// Needs a Flash write
    dirty: bool,
}

impl KvStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            entries: FnvIndexMap::new(),
            dirty: false,
        }
    }

    /// Load the store from Flash.
    ///
    /// Probes each block copy and uses the first valid one. A device that has
    /// never been written (all blocks erased) loads as an empty store.
    ///
    /// # Errors
    ///
    /// `StorageError::Corrupt` if at least one block carries data but none
    /// validates; `StorageError::Unavailable` if Flash itself cannot be read.
    pub fn load_from_flash<F: FlashInterface>(flash: &mut F) -> Result<Self, StorageError> {
        let mut failure: Option<StorageError> = None;

        for block_id in 0..SETTINGS_BLOCK_COUNT {
            let address = SETTINGS_BLOCK_BASE + (block_id * SETTINGS_BLOCK_SIZE);

            let mut buf = [0u8; SETTINGS_BLOCK_SIZE as usize];
            if flash.read(address, &mut buf).is_err() {
                failure.get_or_insert(StorageError::Unavailable);
                continue;
            }

            // Erased block: nothing was ever stored here
            if buf.iter().all(|&b| b == 0xFF) {
                continue;
            }

            match Self::parse_block(&buf) {
                Ok(store) => return Ok(store),
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(Self::new()),
        }
    }

    fn parse_block(buf: &[u8]) -> Result<Self, StorageError> {
        if buf[0..4] != SETTINGS_MAGIC {
            return Err(StorageError::Corrupt);
        }

        let version = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        if version != SETTINGS_VERSION {
            return Err(StorageError::Corrupt);
        }

        let stored_crc = u32::from_le_bytes([
            buf[SETTINGS_BLOCK_SIZE as usize - 4],
            buf[SETTINGS_BLOCK_SIZE as usize - 3],
            buf[SETTINGS_BLOCK_SIZE as usize - 2],
            buf[SETTINGS_BLOCK_SIZE as usize - 1],
        ]);
        let calculated_crc = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC)
            .checksum(&buf[0..SETTINGS_BLOCK_SIZE as usize - 4]);
        if stored_crc != calculated_crc {
            return Err(StorageError::Corrupt);
        }

        let entry_count = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]) as usize;
        if entry_count > MAX_ENTRIES {
            return Err(StorageError::Corrupt);
        }

        let mut store = Self::new();
        let mut offset = 12;

        for _ in 0..entry_count {
            if offset + MAX_KEY_LEN + 1 > buf.len() {
                return Err(StorageError::Corrupt);
            }

            let key_bytes = &buf[offset..offset + MAX_KEY_LEN];
            let key_len = key_bytes
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(MAX_KEY_LEN);
            let key_str = core::str::from_utf8(&key_bytes[..key_len])
                .map_err(|_| StorageError::Corrupt)?;
            offset += MAX_KEY_LEN;

            let value_len = buf[offset] as usize;
            offset += 1;
            if value_len > MAX_VALUE_LEN || offset + value_len > buf.len() {
                return Err(StorageError::Corrupt);
            }

            let mut key = String::new();
            key.push_str(key_str).map_err(|_| StorageError::Corrupt)?;
            let mut value = Vec::new();
            value
                .extend_from_slice(&buf[offset..offset + value_len])
                .map_err(|_| StorageError::Corrupt)?;
            offset += value_len;

            store
                .entries
                .insert(key, value)
                .map_err(|_| StorageError::Corrupt)?;
        }

        Ok(store)
    }

    /// Save the store to Flash (block 0).
    ///
    /// Skipped entirely while no entry has changed since the last save.
    pub fn save_to_flash<F: FlashInterface>(&mut self, flash: &mut F) -> Result<(), StorageError> {
        if !self.dirty {
            return Ok(());
        }

        let mut buf = [0xFFu8; SETTINGS_BLOCK_SIZE as usize];

        buf[0..4].copy_from_slice(&SETTINGS_MAGIC);
        buf[4..8].copy_from_slice(&SETTINGS_VERSION.to_le_bytes());
        buf[8..12].copy_from_slice(&(self.entries.len() as u32).to_le_bytes());

        let mut offset = 12;
        for (key, value) in &self.entries {
            // key, zero-padded to MAX_KEY_LEN
            buf[offset..offset + MAX_KEY_LEN].fill(0);
            buf[offset..offset + key.len()].copy_from_slice(key.as_bytes());
            offset += MAX_KEY_LEN;

            buf[offset] = value.len() as u8;
            offset += 1;
            buf[offset..offset + value.len()].copy_from_slice(value);
            offset += value.len();
        }

        let crc = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC)
            .checksum(&buf[0..SETTINGS_BLOCK_SIZE as usize - 4]);
        buf[SETTINGS_BLOCK_SIZE as usize - 4..].copy_from_slice(&crc.to_le_bytes());

        flash
            .erase(SETTINGS_BLOCK_BASE, SETTINGS_BLOCK_SIZE)
            .map_err(|_| StorageError::Unavailable)?;
        flash
            .write(SETTINGS_BLOCK_BASE, &buf)
            .map_err(|_| StorageError::Unavailable)?;

        self.dirty = false;

        Ok(())
    }

    /// Get the value stored under `key`
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        let key = Self::make_key(key)?;
        self.entries.get(&key).map(|v| v.as_slice())
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// `StorageError::CapacityExceeded` if the key or value exceeds its
    /// length bound, or the store is full.
    pub fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let key = Self::make_key(key).ok_or(StorageError::CapacityExceeded)?;
        let mut stored = Vec::new();
        stored
            .extend_from_slice(value)
            .map_err(|_| StorageError::CapacityExceeded)?;

        // Replacing an existing key must not fail on a full map
        if self.entries.contains_key(&key) {
            self.entries.insert(key, stored).ok();
        } else {
            self.entries
                .insert(key, stored)
                .map_err(|_| StorageError::CapacityExceeded)?;
        }
        self.dirty = true;
        Ok(())
    }

    /// Remove the value stored under `key`.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(key) = Self::make_key(key) else {
            return false;
        };
        let removed = self.entries.remove(&key).is_some();
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Number of entries in the store
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether unsaved changes exist
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn make_key(key: &str) -> Option<String<MAX_KEY_LEN>> {
        let mut k = String::new();
        k.push_str(key).ok()?;
        Some(k)
    }
}

impl Default for KvStore {
    fn default() -> Self {
        Self::new()
    }
}
