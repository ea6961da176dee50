//! Message topics
//!
//! The closed set of message kinds routed by the bus. Each topic carries a
//! stable numeric wire identifier, grouped in blocks by owning module
//! (1xx time, 2xx WiFi, 3xx player, 4xx schedule). The enum is the dispatch
//! key; the wire id only matters at external boundaries.

use super::BusError;

/// Message topic
///
/// One topic per message kind; no two kinds share a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    /// Enable/disable logging on a module
    SetLogging,
    /// Request current time
    TimeRequest,
    /// Response with current time
    TimeResponse,
    /// Set WiFi SSID and password
    WifiSetCredentials,
    /// Get current WiFi credentials
    WifiGetCredentials,
    /// Response with WiFi credentials
    WifiCredentials,
    /// WiFi connection status update
    WifiStatus,
    /// Set player volume
    PlayerSetVolume,
    /// Set play mode
    PlayerSetMode,
    /// Play song by index
    PlayerPlay,
    /// Volume up one step
    PlayerVolumeUp,
    /// Volume down one step
    PlayerVolumeDown,
    /// Next song
    PlayerNext,
    /// Previous song
    PlayerPrevious,
    /// Pause or resume
    PlayerTogglePause,
    /// Player command response
    PlayerResponse,
    /// Add a schedule entry
    ScheduleAdd,
    /// Remove a schedule entry
    ScheduleRemove,
    /// List schedule entries
    ScheduleList,
    /// Clear all schedule entries
    ScheduleClear,
    /// Enable/disable the schedule engine
    ScheduleSetEnabled,
    /// Schedule command response
    ScheduleResponse,
    /// Schedule list response
    ScheduleListResponse,
}

impl Topic {
    /// Number of distinct topics
    pub const COUNT: usize = 23;

    /// All topics, in table order
    pub const ALL: [Topic; Self::COUNT] = [
        Topic::SetLogging,
        Topic::TimeRequest,
        Topic::TimeResponse,
        Topic::WifiSetCredentials,
        Topic::WifiGetCredentials,
        Topic::WifiCredentials,
        Topic::WifiStatus,
        Topic::PlayerSetVolume,
        Topic::PlayerSetMode,
        Topic::PlayerPlay,
        Topic::PlayerVolumeUp,
        Topic::PlayerVolumeDown,
        Topic::PlayerNext,
        Topic::PlayerPrevious,
        Topic::PlayerTogglePause,
        Topic::PlayerResponse,
        Topic::ScheduleAdd,
        Topic::ScheduleRemove,
        Topic::ScheduleList,
        Topic::ScheduleClear,
        Topic::ScheduleSetEnabled,
        Topic::ScheduleResponse,
        Topic::ScheduleListResponse,
    ];

    /// Dense index into the subscription table
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable wire identifier
    pub fn id(self) -> u16 {
        match self {
            Topic::SetLogging => 3,
            Topic::TimeRequest => 100,
            Topic::TimeResponse => 101,
            Topic::WifiSetCredentials => 200,
            Topic::WifiGetCredentials => 201,
            Topic::WifiCredentials => 202,
            Topic::WifiStatus => 203,
            Topic::PlayerSetVolume => 300,
            Topic::PlayerSetMode => 301,
            Topic::PlayerPlay => 302,
            Topic::PlayerVolumeUp => 303,
            Topic::PlayerVolumeDown => 304,
            Topic::PlayerNext => 305,
            Topic::PlayerPrevious => 306,
            Topic::PlayerTogglePause => 307,
            Topic::PlayerResponse => 308,
            Topic::ScheduleAdd => 400,
            Topic::ScheduleRemove => 401,
            Topic::ScheduleList => 402,
            Topic::ScheduleClear => 403,
            Topic::ScheduleSetEnabled => 404,
            Topic::ScheduleResponse => 405,
            Topic::ScheduleListResponse => 406,
        }
    }

    /// Map a wire identifier back to a topic.
    ///
    /// This is the only entry point where an invalid topic is representable;
    /// everything past it works on the closed enum.
    pub fn from_id(id: u16) -> Result<Topic, BusError> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.id() == id)
            .ok_or(BusError::InvalidTopic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_and_unique() {
        for (i, topic) in Topic::ALL.iter().enumerate() {
            assert_eq!(topic.index(), i);
        }
    }

    #[test]
    fn wire_ids_round_trip() {
        for topic in Topic::ALL {
            assert_eq!(Topic::from_id(topic.id()), Ok(topic));
        }
    }

    #[test]
    fn unknown_wire_id_is_rejected() {
        assert_eq!(Topic::from_id(0), Err(BusError::InvalidTopic));
        assert_eq!(Topic::from_id(999), Err(BusError::InvalidTopic));
    }
}
