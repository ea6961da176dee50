//! Real-time clock interface trait
//!
//! The wall clock behind the time-sync subsystem. On hardware this is the
//! on-chip RTC kept in sync by an NTP task; the sync mechanism itself is not
//! part of this crate.

/// Broken-down civil time
///
/// Field ranges follow the usual `struct tm` conventions except that `month`
/// and `weekday` are plain 1-based / 0-based values, not offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTime {
    /// Full year, e.g. 2025
    pub year: u16,
    /// Month 1-12
    pub month: u8,
    /// Day of month 1-31
    pub day: u8,
    /// Hour 0-23
    pub hour: u8,
    /// Minute 0-59
    pub minute: u8,
    /// Second 0-59
    pub second: u8,
    /// Day of week, 0 = Sunday
    pub weekday: u8,
}

/// Real-time clock interface
///
/// Platform implementations must provide the current wall-clock time, or
/// report that no valid time source is available yet (cold boot before the
/// first sync).
pub trait RtcInterface {
    /// Current Unix timestamp and broken-down local time.
    ///
    /// Returns `None` while the clock has never been set.
    fn now(&self) -> Option<(u64, DateTime)>;
}
