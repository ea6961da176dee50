//! Time synchronization messages

use crate::communication::{empty_payload, get_bool, get_u16, get_u64, get_u8, put_bool, put_bytes, put_u8};
use crate::communication::{Payload, MAX_PAYLOAD};
use crate::core::broker::Topic;
use crate::platform::traits::DateTime;
use heapless::Vec;

empty_payload!(
    /// Request the current wall-clock time
    TimeRequest,
    Topic::TimeRequest
);

/// Current wall-clock time.
///
/// When `valid` is false no time source is available yet and the remaining
/// fields are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeResponse {
    /// Unix timestamp
    pub timestamp: u64,
    /// Broken-down local time
    pub datetime: DateTime,
    /// Whether a valid time source backs this sample
    pub valid: bool,
}

impl Payload for TimeResponse {
    const TOPIC: Topic = Topic::TimeResponse;

    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()> {
        put_bytes(buf, &self.timestamp.to_le_bytes())?;
        put_bytes(buf, &self.datetime.year.to_le_bytes())?;
        put_u8(buf, self.datetime.month)?;
        put_u8(buf, self.datetime.day)?;
        put_u8(buf, self.datetime.hour)?;
        put_u8(buf, self.datetime.minute)?;
        put_u8(buf, self.datetime.second)?;
        put_u8(buf, self.datetime.weekday)?;
        put_bool(buf, self.valid)
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        let mut offset = 0;
        let timestamp = get_u64(buf, &mut offset)?;
        let datetime = DateTime {
            year: get_u16(buf, &mut offset)?,
            month: get_u8(buf, &mut offset)?,
            day: get_u8(buf, &mut offset)?,
            hour: get_u8(buf, &mut offset)?,
            minute: get_u8(buf, &mut offset)?,
            second: get_u8(buf, &mut offset)?,
            weekday: get_u8(buf, &mut offset)?,
        };
        let valid = get_bool(buf, &mut offset)?;
        Some(Self {
            timestamp,
            datetime,
            valid,
        })
    }
}
