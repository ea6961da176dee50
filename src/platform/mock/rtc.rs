//! Mock RTC implementation for testing

use crate::platform::traits::{DateTime, RtcInterface};
use core::cell::Cell;

/// Mock real-time clock
///
/// Starts unset (no valid time source), like a cold-booted board before the
/// first sync. Tests set the time explicitly and advance it as needed.
#[derive(Debug, Default)]
pub struct MockRtc {
    now: Cell<Option<(u64, DateTime)>>,
}

impl MockRtc {
    /// Create a new, unset clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the full timestamp and broken-down time
    pub fn set(&self, timestamp: u64, datetime: DateTime) {
        self.now.set(Some((timestamp, datetime)));
    }

    /// Set only hour and minute, keeping a fixed date (test convenience)
    pub fn set_hm(&self, hour: u8, minute: u8) {
        let datetime = DateTime {
            year: 2025,
            month: 6,
            day: 1,
            hour,
            minute,
            second: 0,
            weekday: 0,
        };
        let timestamp = 1_748_736_000 + u64::from(hour) * 3600 + u64::from(minute) * 60;
        self.now.set(Some((timestamp, datetime)));
    }

    /// Clear the clock back to the unset state
    pub fn invalidate(&self) {
        self.now.set(None);
    }
}

impl RtcInterface for MockRtc {
    fn now(&self) -> Option<(u64, DateTime)> {
        self.now.get()
    }
}

impl RtcInterface for &MockRtc {
    fn now(&self) -> Option<(u64, DateTime)> {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unset() {
        let rtc = MockRtc::new();
        assert!(rtc.now().is_none());
    }

    #[test]
    fn set_hm_round_trips() {
        let rtc = MockRtc::new();
        rtc.set_hm(7, 30);

        let (_, dt) = rtc.now().unwrap();
        assert_eq!(dt.hour, 7);
        assert_eq!(dt.minute, 30);
    }
}
