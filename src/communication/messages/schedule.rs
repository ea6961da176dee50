//! Schedule engine messages

use crate::communication::{empty_payload, get_bool, get_i32, get_u16, get_u8, put_bool, put_bytes, put_u8};
use crate::communication::{Payload, MAX_PAYLOAD};
use crate::core::broker::Topic;
use crate::core::scheduler::MAX_SCHEDULES;
use bitflags::bitflags;
use heapless::Vec;

bitflags! {
    /// Day-of-week selector carried by the add message.
    ///
    /// Accepted from callers for forward compatibility; the engine neither
    /// stores nor enforces it (see the service tests pinning this behavior).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WeekdayMask: u8 {
        const SUN = 1 << 0;
        const MON = 1 << 1;
        const TUE = 1 << 2;
        const WED = 1 << 3;
        const THU = 1 << 4;
        const FRI = 1 << 5;
        const SAT = 1 << 6;
    }
}

impl WeekdayMask {
    /// Every day of the week
    pub const EVERY_DAY: WeekdayMask = WeekdayMask::all();
}

impl Default for WeekdayMask {
    fn default() -> Self {
        WeekdayMask::EVERY_DAY
    }
}

/// Add a schedule entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Add {
    /// Hour 0-23
    pub hour: u8,
    /// Minute 0-59
    pub minute: u8,
    /// Song to play when the entry fires
    pub song_index: u16,
    /// Day-of-week selector (not enforced, see type docs)
    pub weekdays: WeekdayMask,
}

impl Payload for Add {
    const TOPIC: Topic = Topic::ScheduleAdd;

    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()> {
        put_u8(buf, self.hour)?;
        put_u8(buf, self.minute)?;
        put_bytes(buf, &self.song_index.to_le_bytes())?;
        put_u8(buf, self.weekdays.bits())
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        let mut offset = 0;
        let hour = get_u8(buf, &mut offset)?;
        let minute = get_u8(buf, &mut offset)?;
        let song_index = get_u16(buf, &mut offset)?;
        let weekdays = WeekdayMask::from_bits_truncate(get_u8(buf, &mut offset)?);
        Some(Self {
            hour,
            minute,
            song_index,
            weekdays,
        })
    }
}

/// Remove the schedule entry with the given identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remove {
    pub id: i32,
}

impl Payload for Remove {
    const TOPIC: Topic = Topic::ScheduleRemove;

    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()> {
        put_bytes(buf, &self.id.to_le_bytes())
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        let mut offset = 0;
        let id = get_i32(buf, &mut offset)?;
        Some(Self { id })
    }
}

empty_payload!(
    /// Request the list of active schedule entries
    List,
    Topic::ScheduleList
);

empty_payload!(
    /// Remove every schedule entry
    Clear,
    Topic::ScheduleClear
);

/// Master switch for the schedule engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetEnabled {
    pub enabled: bool,
}

impl Payload for SetEnabled {
    const TOPIC: Topic = Topic::ScheduleSetEnabled;

    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()> {
        put_bool(buf, self.enabled)
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        let mut offset = 0;
        let enabled = get_bool(buf, &mut offset)?;
        Some(Self { enabled })
    }
}

/// Outcome of an add/remove/clear/enable request.
///
/// `id` names the affected slot where one is applicable (add and remove);
/// on the wire it is -1 otherwise, matching the console's rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub success: bool,
    pub id: Option<u8>,
}

impl Response {
    pub fn ok(id: Option<u8>) -> Self {
        Self { success: true, id }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            id: None,
        }
    }
}

impl Payload for Response {
    const TOPIC: Topic = Topic::ScheduleResponse;

    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()> {
        put_bool(buf, self.success)?;
        let wire_id = self.id.map_or(-1, i32::from);
        put_bytes(buf, &wire_id.to_le_bytes())
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        let mut offset = 0;
        let success = get_bool(buf, &mut offset)?;
        let wire_id = get_i32(buf, &mut offset)?;
        let id = u8::try_from(wire_id).ok();
        Some(Self { success, id })
    }
}

/// One row of the schedule listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    pub id: u8,
    pub hour: u8,
    pub minute: u8,
    pub song_index: u16,
}

/// Active schedule entries, ascending by slot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListResponse {
    pub entries: Vec<EntryInfo, MAX_SCHEDULES>,
}

impl Payload for ListResponse {
    const TOPIC: Topic = Topic::ScheduleListResponse;

    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()> {
        put_u8(buf, self.entries.len() as u8)?;
        for entry in &self.entries {
            put_u8(buf, entry.id)?;
            put_u8(buf, entry.hour)?;
            put_u8(buf, entry.minute)?;
            put_bytes(buf, &entry.song_index.to_le_bytes())?;
        }
        Some(())
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        let mut offset = 0;
        let count = get_u8(buf, &mut offset)? as usize;
        if count > MAX_SCHEDULES {
            return None;
        }
        let mut entries = Vec::new();
        for _ in 0..count {
            let entry = EntryInfo {
                id: get_u8(buf, &mut offset)?,
                hour: get_u8(buf, &mut offset)?,
                minute: get_u8(buf, &mut offset)?,
                song_index: get_u16(buf, &mut offset)?,
            };
            entries.push(entry).ok()?;
        }
        Some(Self { entries })
    }
}
