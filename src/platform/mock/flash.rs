//! Mock Flash implementation for testing
//!
//! Provides in-memory Flash simulation for unit tests.

use crate::platform::{error::FlashError, traits::FlashInterface, Result};
use core::cell::RefCell;
use std::vec;
use std::vec::Vec;

/// Flash block size (4 KB)
const BLOCK_SIZE: u32 = 4096;

/// Flash capacity (4 MB)
const FLASH_CAPACITY: u32 = 4 * 1024 * 1024;

/// Protected firmware region (first 256 KB)
const FIRMWARE_SIZE: u32 = 0x40000;

/// Mock Flash implementation
///
/// Simulates Flash storage in memory for testing. Supports:
/// - Read/write/erase operations with real Flash write semantics (1→0 only)
/// - Corruption injection for testing the settings loader's error handling
/// - Power-loss simulation (partial write) for reliability testing
#[derive(Debug)]
pub struct MockFlash {
    /// Flash storage (initialized to 0xFF - erased state)
    storage: RefCell<Vec<u8>>,
    /// Simulated power loss flag
    power_loss: RefCell<bool>,
    /// When set, all operations fail (device unavailable)
    offline: bool,
}

impl MockFlash {
    /// Create a new mock Flash instance
    pub fn new() -> Self {
        Self {
            storage: RefCell::new(vec![0xFF; FLASH_CAPACITY as usize]),
            power_loss: RefCell::new(false),
            offline: false,
        }
    }

    /// Get Flash contents (for test verification)
    pub fn get_contents(&self, address: u32, len: usize) -> Vec<u8> {
        let storage = self.storage.borrow();
        storage[address as usize..(address as usize + len)].to_vec()
    }

    /// Overwrite a range with a corrupt pattern (for testing error recovery)
    pub fn inject_corruption(&mut self, address: u32, len: usize) {
        let mut storage = self.storage.borrow_mut();
        for i in 0..len {
            storage[address as usize + i] = 0xAA;
        }
    }

    /// Make the next write only partially complete, simulating power loss
    /// mid-operation.
    pub fn simulate_power_loss(&mut self) {
        *self.power_loss.borrow_mut() = true;
    }

    /// Fail every subsequent operation (device unavailable)
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    fn clear_power_loss(&mut self) {
        *self.power_loss.borrow_mut() = false;
    }

    fn is_writable(&self, address: u32) -> bool {
        (FIRMWARE_SIZE..FLASH_CAPACITY).contains(&address)
    }

    fn is_block_aligned(&self, address: u32) -> bool {
        address.is_multiple_of(BLOCK_SIZE)
    }
}

impl Default for MockFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashInterface for MockFlash {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        if self.offline {
            return Err(FlashError::ReadFailed.into());
        }

        if address >= FLASH_CAPACITY || address as usize + buf.len() > FLASH_CAPACITY as usize {
            return Err(FlashError::InvalidAddress.into());
        }

        let storage = self.storage.borrow();
        buf.copy_from_slice(&storage[address as usize..(address as usize + buf.len())]);

        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        if self.offline {
            return Err(FlashError::WriteFailed.into());
        }

        if !self.is_writable(address) {
            return Err(FlashError::InvalidAddress.into());
        }

        if address as usize + data.len() > FLASH_CAPACITY as usize {
            return Err(FlashError::InvalidAddress.into());
        }

        // Simulate power loss (partial write)
        let write_len = if *self.power_loss.borrow() {
            self.clear_power_loss();
            data.len() / 2
        } else {
            data.len()
        };

        // Flash can only change bits from 1→0
        let mut storage = self.storage.borrow_mut();
        for i in 0..write_len {
            storage[address as usize + i] &= data[i];
        }

        Ok(())
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        if self.offline {
            return Err(FlashError::EraseFailed.into());
        }

        if !self.is_writable(address) || !self.is_block_aligned(address) {
            return Err(FlashError::InvalidAddress.into());
        }

        if !size.is_multiple_of(BLOCK_SIZE) || address + size > FLASH_CAPACITY {
            return Err(FlashError::InvalidAddress.into());
        }

        let mut storage = self.storage.borrow_mut();
        for i in 0..size as usize {
            storage[address as usize + i] = 0xFF;
        }

        Ok(())
    }

    fn block_size(&self) -> u32 {
        BLOCK_SIZE
    }

    fn capacity(&self) -> u32 {
        FLASH_CAPACITY
    }
}
