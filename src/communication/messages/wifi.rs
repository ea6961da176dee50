//! WiFi credential and status messages

use crate::communication::{empty_payload, get_bool, get_i32, get_str, get_u8, put_bool, put_bytes, put_str, put_u8};
use crate::communication::{Payload, MAX_PAYLOAD};
use crate::core::broker::Topic;
use crate::platform::traits::LinkStatus;
use heapless::{String, Vec};

/// Maximum SSID length (IEEE 802.11)
pub const SSID_MAX: usize = 32;

/// Maximum WPA2 passphrase length
pub const PASSWORD_MAX: usize = 64;

/// Store new WiFi credentials and reconnect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCredentials {
    pub ssid: String<SSID_MAX>,
    pub password: String<PASSWORD_MAX>,
}

impl Payload for SetCredentials {
    const TOPIC: Topic = Topic::WifiSetCredentials;

    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()> {
        put_str(buf, self.ssid.as_str())?;
        put_str(buf, self.password.as_str())
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        let mut offset = 0;
        let ssid = get_str::<SSID_MAX>(buf, &mut offset)?;
        let password = get_str::<PASSWORD_MAX>(buf, &mut offset)?;
        Some(Self { ssid, password })
    }
}

empty_payload!(
    /// Request the stored WiFi credentials
    GetCredentials,
    Topic::WifiGetCredentials
);

/// Stored WiFi credentials.
///
/// With `has_credentials` false both strings are empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CredentialsResponse {
    pub ssid: String<SSID_MAX>,
    pub password: String<PASSWORD_MAX>,
    pub has_credentials: bool,
}

impl Payload for CredentialsResponse {
    const TOPIC: Topic = Topic::WifiCredentials;

    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()> {
        put_bool(buf, self.has_credentials)?;
        put_str(buf, self.ssid.as_str())?;
        put_str(buf, self.password.as_str())
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        let mut offset = 0;
        let has_credentials = get_bool(buf, &mut offset)?;
        let ssid = get_str::<SSID_MAX>(buf, &mut offset)?;
        let password = get_str::<PASSWORD_MAX>(buf, &mut offset)?;
        Some(Self {
            ssid,
            password,
            has_credentials,
        })
    }
}

/// WiFi connection status broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: LinkStatus,
    pub ssid: String<SSID_MAX>,
    /// Signal strength in dBm (0 when not connected)
    pub rssi: i32,
}

fn status_as_u8(status: LinkStatus) -> u8 {
    match status {
        LinkStatus::Disconnected => 0,
        LinkStatus::Connecting => 1,
        LinkStatus::Connected => 2,
        LinkStatus::Failed => 3,
    }
}

fn status_from_u8(v: u8) -> Option<LinkStatus> {
    match v {
        0 => Some(LinkStatus::Disconnected),
        1 => Some(LinkStatus::Connecting),
        2 => Some(LinkStatus::Connected),
        3 => Some(LinkStatus::Failed),
        _ => None,
    }
}

impl Payload for StatusUpdate {
    const TOPIC: Topic = Topic::WifiStatus;

    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()> {
        put_u8(buf, status_as_u8(self.status))?;
        put_bytes(buf, &self.rssi.to_le_bytes())?;
        put_str(buf, self.ssid.as_str())
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        let mut offset = 0;
        let status = status_from_u8(get_u8(buf, &mut offset)?)?;
        let rssi = get_i32(buf, &mut offset)?;
        let ssid = get_str::<SSID_MAX>(buf, &mut offset)?;
        Some(Self { status, ssid, rssi })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_ssid_is_rejected() {
        // length prefix claims 33 bytes, above SSID_MAX
        let mut raw = std::vec![33u8];
        raw.extend_from_slice(&[b'x'; 33]);
        raw.push(0); // empty password
        assert!(SetCredentials::decode(&raw).is_none());
    }

    #[test]
    fn credentials_with_max_lengths_fit() {
        let creds = SetCredentials {
            ssid: String::try_from(core::str::from_utf8(&[b's'; SSID_MAX]).unwrap()).unwrap(),
            password: String::try_from(core::str::from_utf8(&[b'p'; PASSWORD_MAX]).unwrap())
                .unwrap(),
        };

        let mut buf = Vec::new();
        creds.encode(&mut buf).unwrap();
        assert_eq!(SetCredentials::decode(&buf), Some(creds));
    }

    #[test]
    fn status_update_rejects_unknown_status() {
        assert!(StatusUpdate::decode(&[9, 0, 0, 0, 0, 0]).is_none());
    }
}
