//! Flash interface trait
//!
//! This module defines the Flash storage interface that platform implementations
//! must provide. Flash backs the persistent settings block (schedules, WiFi
//! credentials).
//!
//! # Flash Characteristics
//!
//! - Flash is organized in blocks (typically 4 KB)
//! - Erase operations set all bytes to 0xFF
//! - Write operations can only change bits from 1→0 (erase first to reset)
//! - Flash operations are blocking and can take 100ms+; callers must keep them
//!   out of bus handlers' hot paths where latency matters
//!
//! # Safety Invariants
//!
//! - Flash peripheral must be initialized before use
//! - Only one owner per Flash instance (no concurrent access)
//! - Implementations must refuse to erase/write the firmware region

use crate::platform::Result;

/// Flash interface trait
///
/// Platform implementations must provide this interface for Flash
/// read/write/erase operations.
pub trait FlashInterface {
    /// Read `buf.len()` bytes from Flash starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if the range
    /// is out of bounds, `FlashError::ReadFailed` if the operation fails.
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()>;

    /// Write `data` to Flash starting at `address`.
    ///
    /// The target range must have been erased beforehand; writing can only
    /// clear bits.
    ///
    /// # Errors
    ///
    /// Returns `FlashError::InvalidAddress` for protected or out-of-bounds
    /// ranges, `FlashError::WriteFailed` if the operation fails.
    fn write(&mut self, address: u32, data: &[u8]) -> Result<()>;

    /// Erase `size` bytes starting at `address`.
    ///
    /// Both `address` and `size` must be block-aligned.
    ///
    /// # Errors
    ///
    /// Returns `FlashError::InvalidAddress` for misaligned, protected or
    /// out-of-bounds ranges, `FlashError::EraseFailed` if the operation fails.
    fn erase(&mut self, address: u32, size: u32) -> Result<()>;

    /// Erase block size in bytes
    fn block_size(&self) -> u32;

    /// Total Flash capacity in bytes
    fn capacity(&self) -> u32;
}
