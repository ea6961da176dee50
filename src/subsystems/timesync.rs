//! Time synchronization subsystem
//!
//! Answers time-sample requests on the bus from the platform clock. Keeping
//! the clock itself (and whatever NTP machinery feeds it) behind
//! `RtcInterface` means the schedule engine never reads time directly: it
//! only ever sees the response messages this module publishes.

use crate::communication::messages::system::{ModuleId, SetLogging};
use crate::communication::messages::time::{TimeRequest, TimeResponse};
use crate::communication::{send, Payload};
use crate::core::broker::{BusError, Message, MessageBus, Subscriber, Topic};
use crate::core::traits::{ModuleState, SharedState};
use crate::log_info;
use crate::platform::traits::RtcInterface;

struct TimeCtx<C: RtcInterface> {
    rtc: C,
    log: bool,
}

/// The time source on the bus
pub struct TimeService<C: RtcInterface> {
    state: ModuleState<TimeCtx<C>>,
}

impl<C: RtcInterface> TimeService<C> {
    pub fn new(rtc: C) -> Self {
        Self {
            state: ModuleState::new(TimeCtx { rtc, log: false }),
        }
    }

    /// Subscribe to every topic this service answers.
    pub fn register<'s>(&'s self, bus: &MessageBus<'s>) -> Result<(), BusError> {
        bus.subscribe(Topic::SetLogging, self)?;
        bus.subscribe(Topic::TimeRequest, self)
    }

    fn on_request(&self, bus: &MessageBus<'_>) {
        let (response, log) = self.state.with(|ctx| {
            let response = match ctx.rtc.now() {
                Some((timestamp, datetime)) => TimeResponse {
                    timestamp,
                    datetime,
                    valid: true,
                },
                // No valid time source yet: zeroed, flagged invalid
                None => TimeResponse::default(),
            };
            (response, ctx.log)
        });

        if log {
            if response.valid {
                log_info!(
                    "time request answered: {:02}:{:02}:{:02}",
                    response.datetime.hour,
                    response.datetime.minute,
                    response.datetime.second
                );
            } else {
                log_info!("time request received but no valid time source");
            }
        }

        send(bus, &response);
    }
}

impl<C: RtcInterface> Subscriber for TimeService<C> {
    fn on_message(&self, bus: &MessageBus<'_>, message: &Message<'_>) {
        match message.topic {
            Topic::SetLogging => {
                if let Some(cmd) = SetLogging::decode(message.payload) {
                    if cmd.targets(ModuleId::TimeSync, ModuleId::TimeSync.name()) {
                        self.state.with_mut(|ctx| ctx.log = cmd.enabled);
                        if cmd.enabled {
                            log_info!("timesync logging enabled");
                        }
                    }
                }
            }
            Topic::TimeRequest => {
                if TimeRequest::decode(message.payload).is_some() {
                    self.on_request(bus);
                }
            }
            _ => {}
        }
    }
}
