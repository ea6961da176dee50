//! Audio player messages

use crate::communication::{empty_payload, get_bool, get_i32, get_u16, get_u8, put_bool, put_bytes, put_u8};
use crate::communication::{Payload, MAX_PAYLOAD};
use crate::core::broker::Topic;
use heapless::Vec;

/// Playback modes supported by the audio module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// Loop all songs
    Loop,
    /// Loop the current song
    SingleLoop,
    /// Loop the current folder
    FolderLoop,
    /// Random playback
    Random,
    /// Play one song, then stop
    SingleShot,
}

impl PlayMode {
    fn as_u8(self) -> u8 {
        match self {
            PlayMode::Loop => 1,
            PlayMode::SingleLoop => 2,
            PlayMode::FolderLoop => 3,
            PlayMode::Random => 4,
            PlayMode::SingleShot => 5,
        }
    }

    fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(PlayMode::Loop),
            2 => Some(PlayMode::SingleLoop),
            3 => Some(PlayMode::FolderLoop),
            4 => Some(PlayMode::Random),
            5 => Some(PlayMode::SingleShot),
            _ => None,
        }
    }
}

/// Set the output volume (0-31)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetVolume {
    pub volume: u8,
}

impl Payload for SetVolume {
    const TOPIC: Topic = Topic::PlayerSetVolume;

    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()> {
        put_u8(buf, self.volume)
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        let mut offset = 0;
        let volume = get_u8(buf, &mut offset)?;
        Some(Self { volume })
    }
}

/// Set the playback mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPlayMode {
    pub mode: PlayMode,
}

impl Payload for SetPlayMode {
    const TOPIC: Topic = Topic::PlayerSetMode;

    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()> {
        put_u8(buf, self.mode.as_u8())
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        let mut offset = 0;
        let mode = PlayMode::from_u8(get_u8(buf, &mut offset)?)?;
        Some(Self { mode })
    }
}

/// Play a song by its index on the storage medium
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Play {
    pub song_index: u16,
}

impl Payload for Play {
    const TOPIC: Topic = Topic::PlayerPlay;

    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()> {
        put_bytes(buf, &self.song_index.to_le_bytes())
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        let mut offset = 0;
        let song_index = get_u16(buf, &mut offset)?;
        Some(Self { song_index })
    }
}

empty_payload!(
    /// Raise the volume one step
    VolumeUp,
    Topic::PlayerVolumeUp
);

empty_payload!(
    /// Lower the volume one step
    VolumeDown,
    Topic::PlayerVolumeDown
);

empty_payload!(
    /// Skip to the next song
    Next,
    Topic::PlayerNext
);

empty_payload!(
    /// Skip to the previous song
    Previous,
    Topic::PlayerPrevious
);

empty_payload!(
    /// Pause if playing, resume if paused
    TogglePause,
    Topic::PlayerTogglePause
);

/// Outcome of a player command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandResponse {
    pub success: bool,
    /// Driver error code when not successful, 0 otherwise
    pub error_code: i32,
}

impl CommandResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error_code: 0,
        }
    }

    pub fn failed(error_code: i32) -> Self {
        Self {
            success: false,
            error_code,
        }
    }
}

impl Payload for CommandResponse {
    const TOPIC: Topic = Topic::PlayerResponse;

    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()> {
        put_bool(buf, self.success)?;
        put_bytes(buf, &self.error_code.to_le_bytes())
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        let mut offset = 0;
        let success = get_bool(buf, &mut offset)?;
        let error_code = get_i32(buf, &mut offset)?;
        Some(Self {
            success,
            error_code,
        })
    }
}
