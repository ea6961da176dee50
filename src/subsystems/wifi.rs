//! WiFi credential subsystem
//!
//! Owns the stored network credentials and the link status. Credentials
//! arrive and leave over the bus, persist in the settings store under
//! `wifi/ssid` / `wifi/pass`, and are handed to the platform's [`WifiLink`]
//! for the actual association. Radio management stays below the trait.
//!
//! `poll()` is the periodic driver: it publishes status transitions and
//! re-initiates the connection whenever the link is down and credentials
//! exist.

use crate::communication::messages::system::{ModuleId, SetLogging};
use crate::communication::messages::wifi::{
    CredentialsResponse, GetCredentials, SetCredentials, StatusUpdate, PASSWORD_MAX, SSID_MAX,
};
use crate::communication::{send, Payload};
use crate::core::broker::{BusError, Message, MessageBus, Subscriber, Topic};
use crate::core::traits::{ModuleState, SharedState};
use crate::platform::traits::{FlashInterface, LinkStatus, WifiLink};
use crate::storage::SharedSettings;
use crate::{log_info, log_warn};
use heapless::String;

/// Settings key for the stored SSID
const KEY_SSID: &str = "wifi/ssid";

/// Settings key for the stored passphrase
const KEY_PASSWORD: &str = "wifi/pass";

struct WifiCtx<L: WifiLink> {
    link: L,
    ssid: String<SSID_MAX>,
    password: String<PASSWORD_MAX>,
    last_status: LinkStatus,
    log: bool,
}

impl<L: WifiLink> WifiCtx<L> {
    fn has_credentials(&self) -> bool {
        !self.ssid.is_empty()
    }
}

/// The WiFi credential manager on the bus
pub struct WifiService<'a, F: FlashInterface, L: WifiLink> {
    settings: &'a SharedSettings<F>,
    state: ModuleState<WifiCtx<L>>,
}

fn stored_string<F: FlashInterface, const N: usize>(
    settings: &SharedSettings<F>,
    key: &str,
) -> String<N> {
    settings.with(|s| {
        let mut out = String::new();
        if let Some(raw) = s.get(key) {
            if let Ok(text) = core::str::from_utf8(raw) {
                if out.push_str(text).is_err() {
                    log_warn!("stored value for {} too long, ignoring", key);
                }
            }
        }
        out
    })
}

impl<'a, F: FlashInterface, L: WifiLink> WifiService<'a, F, L> {
    /// Create the service, restoring persisted credentials.
    pub fn new(settings: &'a SharedSettings<F>, link: L) -> Self {
        let ssid = stored_string::<F, SSID_MAX>(settings, KEY_SSID);
        let password = stored_string::<F, PASSWORD_MAX>(settings, KEY_PASSWORD);

        if ssid.is_empty() {
            log_info!("wifi: no credentials stored");
        } else {
            log_info!("wifi: loaded credentials from storage");
        }

        Self {
            settings,
            state: ModuleState::new(WifiCtx {
                link,
                ssid,
                password,
                last_status: LinkStatus::Disconnected,
                log: false,
            }),
        }
    }

    /// Subscribe to every topic this service answers.
    pub fn register<'s>(&'s self, bus: &MessageBus<'s>) -> Result<(), BusError> {
        bus.subscribe(Topic::SetLogging, self)?;
        bus.subscribe(Topic::WifiSetCredentials, self)?;
        bus.subscribe(Topic::WifiGetCredentials, self)
    }

    /// Periodic tick from the host loop.
    ///
    /// Publishes a status update on every link transition and retries the
    /// connection while the link is down and credentials are stored.
    pub fn poll(&self, bus: &MessageBus<'_>) {
        let update = self.state.with_mut(|ctx| {
            let status = ctx.link.status();
            let changed = status != ctx.last_status;
            ctx.last_status = status;

            if matches!(status, LinkStatus::Disconnected | LinkStatus::Failed)
                && ctx.has_credentials()
            {
                if ctx.log {
                    log_info!("wifi: attempting to reconnect");
                }
                if ctx.link.connect(ctx.ssid.as_str(), ctx.password.as_str()).is_err() {
                    log_warn!("wifi: connect request failed");
                }
            }

            changed.then(|| status_update(ctx, status))
        });

        if let Some(update) = update {
            send(bus, &update);
        }
    }

    fn on_set_credentials(&self, bus: &MessageBus<'_>, creds: &SetCredentials) {
        // Persist first, then reconnect with the new credentials
        self.settings.with_mut(|settings| {
            let stored = settings
                .put(KEY_SSID, creds.ssid.as_bytes())
                .and_then(|_| settings.put(KEY_PASSWORD, creds.password.as_bytes()))
                .and_then(|_| settings.flush());
            if let Err(e) = stored {
                log_warn!("wifi: storing credentials failed: {:?}", e);
            }
        });

        let update = self.state.with_mut(|ctx| {
            ctx.ssid = creds.ssid.clone();
            ctx.password = creds.password.clone();

            if ctx.link.status() == LinkStatus::Connected {
                let _ = ctx.link.disconnect();
            }
            if ctx.link.connect(ctx.ssid.as_str(), ctx.password.as_str()).is_err() {
                log_warn!("wifi: connect request failed");
            }
            ctx.last_status = LinkStatus::Connecting;
            status_update(ctx, LinkStatus::Connecting)
        });

        send(bus, &update);
    }

    fn on_get_credentials(&self, bus: &MessageBus<'_>) {
        let response = self.state.with(|ctx| {
            if ctx.has_credentials() {
                CredentialsResponse {
                    ssid: ctx.ssid.clone(),
                    password: ctx.password.clone(),
                    has_credentials: true,
                }
            } else {
                CredentialsResponse::default()
            }
        });
        send(bus, &response);
    }
}

fn status_update<L: WifiLink>(ctx: &WifiCtx<L>, status: LinkStatus) -> StatusUpdate {
    let ssid = match status {
        LinkStatus::Disconnected => String::new(),
        _ => ctx.ssid.clone(),
    };
    StatusUpdate {
        status,
        ssid,
        rssi: ctx.link.rssi(),
    }
}

impl<F: FlashInterface, L: WifiLink> Subscriber for WifiService<'_, F, L> {
    fn on_message(&self, bus: &MessageBus<'_>, message: &Message<'_>) {
        match message.topic {
            Topic::SetLogging => {
                if let Some(cmd) = SetLogging::decode(message.payload) {
                    if cmd.targets(ModuleId::Wifi, ModuleId::Wifi.name()) {
                        self.state.with_mut(|ctx| ctx.log = cmd.enabled);
                        if cmd.enabled {
                            log_info!("wifi logging enabled");
                        }
                    }
                }
            }
            Topic::WifiSetCredentials => match SetCredentials::decode(message.payload) {
                Some(creds) => self.on_set_credentials(bus, &creds),
                None => log_warn!("malformed wifi credentials dropped"),
            },
            Topic::WifiGetCredentials => {
                if GetCredentials::decode(message.payload).is_some() {
                    self.on_get_credentials(bus);
                }
            }
            _ => {}
        }
    }
}
