//! Mock WiFi link implementation for testing

use crate::platform::{
    traits::{LinkStatus, WifiLink},
    Result,
};
use std::string::String;

/// Mock WiFi link
///
/// `connect` records the credentials and moves to `Connecting`; the test
/// resolves the attempt with [`MockWifiLink::resolve`].
#[derive(Debug, Default)]
pub struct MockWifiLink {
    status: Option<LinkStatus>,
    last_ssid: Option<String>,
    last_password: Option<String>,
    rssi: i32,
}

impl MockWifiLink {
    pub fn new() -> Self {
        Self {
            status: None,
            last_ssid: None,
            last_password: None,
            rssi: 0,
        }
    }

    /// Resolve a pending connection attempt
    pub fn resolve(&mut self, success: bool) {
        self.status = Some(if success {
            self.rssi = -55;
            LinkStatus::Connected
        } else {
            LinkStatus::Failed
        });
    }

    /// Simulate the link dropping
    pub fn drop_link(&mut self) {
        self.status = Some(LinkStatus::Disconnected);
        self.rssi = 0;
    }

    /// SSID of the last connection attempt (for test verification)
    pub fn last_ssid(&self) -> Option<&str> {
        self.last_ssid.as_deref()
    }

    /// Password of the last connection attempt (for test verification)
    pub fn last_password(&self) -> Option<&str> {
        self.last_password.as_deref()
    }
}

impl WifiLink for MockWifiLink {
    fn connect(&mut self, ssid: &str, password: &str) -> Result<()> {
        self.last_ssid = Some(ssid.into());
        self.last_password = Some(password.into());
        self.status = Some(LinkStatus::Connecting);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.status = Some(LinkStatus::Disconnected);
        self.rssi = 0;
        Ok(())
    }

    fn status(&self) -> LinkStatus {
        self.status.unwrap_or(LinkStatus::Disconnected)
    }

    fn rssi(&self) -> i32 {
        self.rssi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_then_resolve() {
        let mut link = MockWifiLink::new();
        assert_eq!(link.status(), LinkStatus::Disconnected);

        link.connect("shed", "hunter2").unwrap();
        assert_eq!(link.status(), LinkStatus::Connecting);
        assert_eq!(link.last_ssid(), Some("shed"));

        link.resolve(true);
        assert_eq!(link.status(), LinkStatus::Connected);
        assert!(link.rssi() < 0);
    }
}
