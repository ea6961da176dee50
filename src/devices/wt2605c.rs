//! WT2605C audio module driver
//!
//! Drives the WT2605C MP3 module over its UART AT-command interface
//! (115200 baud). Commands are CRLF-terminated ASCII frames; the module's
//! textual replies are not parsed: command delivery is the contract here,
//! playback state stays on the module.

use crate::platform::error::PlatformError;
use crate::platform::traits::UartInterface;
use crate::platform::Result;
use core::fmt::Write;
use heapless::String;

/// Maximum AT frame length
const CMD_MAX: usize = 24;

/// Volume range is 0-31
pub const VOLUME_MAX: u8 = 31;

/// Playback modes understood by the module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Cycle through all songs
    Cycle,
    /// Repeat the current song
    SingleCycle,
    /// Cycle through the current directory
    DirCycle,
    /// Random order
    Random,
    /// Play one song, then stop
    SingleShot,
}

impl PlaybackMode {
    fn code(self) -> u8 {
        match self {
            PlaybackMode::Cycle => 1,
            PlaybackMode::SingleCycle => 2,
            PlaybackMode::DirCycle => 3,
            PlaybackMode::Random => 4,
            PlaybackMode::SingleShot => 5,
        }
    }
}

/// WT2605C driver over a UART
pub struct Wt2605c<U: UartInterface> {
    uart: U,
}

impl<U: UartInterface> Wt2605c<U> {
    pub fn new(uart: U) -> Self {
        Self { uart }
    }

    /// Set the output volume (0-31)
    pub fn volume(&mut self, volume: u8) -> Result<()> {
        if volume > VOLUME_MAX {
            return Err(PlatformError::InvalidConfig);
        }
        self.command_with_arg("AT+VOL", u16::from(volume))
    }

    /// Raise the volume one step
    pub fn volume_up(&mut self) -> Result<()> {
        self.command("AT+VOLUP")
    }

    /// Lower the volume one step
    pub fn volume_down(&mut self) -> Result<()> {
        self.command("AT+VOLDOWN")
    }

    /// Select the playback mode
    pub fn play_mode(&mut self, mode: PlaybackMode) -> Result<()> {
        self.command_with_arg("AT+PLAYMODE", u16::from(mode.code()))
    }

    /// Play the song with the given index from the storage root
    pub fn play_index(&mut self, song_index: u16) -> Result<()> {
        self.command_with_arg("AT+PLAYNUM", song_index)
    }

    /// Skip to the next song
    pub fn next(&mut self) -> Result<()> {
        self.command("AT+NEXT")
    }

    /// Skip to the previous song
    pub fn previous(&mut self) -> Result<()> {
        self.command("AT+PREV")
    }

    /// Pause if playing, resume if paused
    pub fn toggle_pause(&mut self) -> Result<()> {
        self.command("AT+PP")
    }

    /// Access the underlying UART (test verification)
    pub fn uart(&self) -> &U {
        &self.uart
    }

    fn command(&mut self, cmd: &str) -> Result<()> {
        let mut frame: String<CMD_MAX> = String::new();
        write!(frame, "{}\r\n", cmd).map_err(|_| PlatformError::InvalidConfig)?;
        self.send(frame.as_bytes())
    }

    fn command_with_arg(&mut self, cmd: &str, arg: u16) -> Result<()> {
        let mut frame: String<CMD_MAX> = String::new();
        write!(frame, "{}={}\r\n", cmd, arg).map_err(|_| PlatformError::InvalidConfig)?;
        self.send(frame.as_bytes())
    }

    fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.uart.write(frame)?;
        self.uart.flush()
    }
}
