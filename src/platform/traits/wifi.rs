//! WiFi link interface trait
//!
//! Radio management (scanning, association, DHCP) is out of scope for this
//! crate; the credential subsystem only needs to hand credentials to the link
//! and observe its connection state.

use crate::platform::Result;

/// WiFi link connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// WiFi link interface
pub trait WifiLink {
    /// Begin connecting with the given credentials.
    ///
    /// Non-blocking: progress is observed through `status()`.
    fn connect(&mut self, ssid: &str, password: &str) -> Result<()>;

    /// Drop the current association, if any
    fn disconnect(&mut self) -> Result<()>;

    /// Current link state
    fn status(&self) -> LinkStatus;

    /// Received signal strength in dBm (0 when not connected)
    fn rssi(&self) -> i32;
}
