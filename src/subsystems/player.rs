//! Audio player subsystem
//!
//! Translates player command messages into WT2605C driver calls and answers
//! each one with a command response. The driver's UART lives inside the
//! module lock; commands arriving from different contexts serialize there.

use crate::communication::messages::player::{
    CommandResponse, Play, PlayMode, SetPlayMode, SetVolume,
};
use crate::communication::messages::system::{ModuleId, SetLogging};
use crate::communication::{send, Payload};
use crate::core::broker::{BusError, Message, MessageBus, Subscriber, Topic};
use crate::core::traits::{ModuleState, SharedState};
use crate::devices::wt2605c::{PlaybackMode, Wt2605c};
use crate::platform::error::PlatformError;
use crate::platform::traits::UartInterface;
use crate::{log_info, log_warn};

struct PlayerCtx<U: UartInterface> {
    driver: Wt2605c<U>,
    log: bool,
}

/// The audio player on the bus
pub struct PlayerService<U: UartInterface> {
    state: ModuleState<PlayerCtx<U>>,
}

fn mode_of(mode: PlayMode) -> PlaybackMode {
    match mode {
        PlayMode::Loop => PlaybackMode::Cycle,
        PlayMode::SingleLoop => PlaybackMode::SingleCycle,
        PlayMode::FolderLoop => PlaybackMode::DirCycle,
        PlayMode::Random => PlaybackMode::Random,
        PlayMode::SingleShot => PlaybackMode::SingleShot,
    }
}

/// Numeric code carried in failure responses
fn error_code(error: PlatformError) -> i32 {
    match error {
        PlatformError::InvalidConfig => -2,
        PlatformError::Uart(_) => -3,
        _ => -1,
    }
}

impl<U: UartInterface> PlayerService<U> {
    pub fn new(uart: U) -> Self {
        Self {
            state: ModuleState::new(PlayerCtx {
                driver: Wt2605c::new(uart),
                log: false,
            }),
        }
    }

    /// Subscribe to every topic this service answers.
    pub fn register<'s>(&'s self, bus: &MessageBus<'s>) -> Result<(), BusError> {
        for topic in [
            Topic::SetLogging,
            Topic::PlayerSetVolume,
            Topic::PlayerSetMode,
            Topic::PlayerPlay,
            Topic::PlayerVolumeUp,
            Topic::PlayerVolumeDown,
            Topic::PlayerNext,
            Topic::PlayerPrevious,
            Topic::PlayerTogglePause,
        ] {
            bus.subscribe(topic, self)?;
        }
        Ok(())
    }

    fn respond(&self, bus: &MessageBus<'_>, result: crate::platform::Result<()>) {
        let response = match result {
            Ok(()) => CommandResponse::ok(),
            Err(e) => {
                log_warn!("player command failed: {:?}", e);
                CommandResponse::failed(error_code(e))
            }
        };
        send(bus, &response);
    }
}

impl<U: UartInterface> Subscriber for PlayerService<U> {
    fn on_message(&self, bus: &MessageBus<'_>, message: &Message<'_>) {
        match message.topic {
            Topic::SetLogging => {
                if let Some(cmd) = SetLogging::decode(message.payload) {
                    if cmd.targets(ModuleId::Player, ModuleId::Player.name()) {
                        self.state.with_mut(|ctx| ctx.log = cmd.enabled);
                        if cmd.enabled {
                            log_info!("player logging enabled");
                        }
                    }
                }
                return;
            }
            Topic::PlayerSetVolume => {
                let Some(cmd) = SetVolume::decode(message.payload) else {
                    return;
                };
                let result = self.state.with_mut(|ctx| ctx.driver.volume(cmd.volume));
                self.respond(bus, result);
            }
            Topic::PlayerSetMode => {
                let Some(cmd) = SetPlayMode::decode(message.payload) else {
                    return;
                };
                let result = self
                    .state
                    .with_mut(|ctx| ctx.driver.play_mode(mode_of(cmd.mode)));
                self.respond(bus, result);
            }
            Topic::PlayerPlay => {
                let Some(cmd) = Play::decode(message.payload) else {
                    return;
                };
                let (result, log) = self
                    .state
                    .with_mut(|ctx| (ctx.driver.play_index(cmd.song_index), ctx.log));
                if log {
                    log_info!("playing song {}", cmd.song_index);
                }
                self.respond(bus, result);
            }
            Topic::PlayerVolumeUp => {
                let result = self.state.with_mut(|ctx| ctx.driver.volume_up());
                self.respond(bus, result);
            }
            Topic::PlayerVolumeDown => {
                let result = self.state.with_mut(|ctx| ctx.driver.volume_down());
                self.respond(bus, result);
            }
            Topic::PlayerNext => {
                let result = self.state.with_mut(|ctx| ctx.driver.next());
                self.respond(bus, result);
            }
            Topic::PlayerPrevious => {
                let result = self.state.with_mut(|ctx| ctx.driver.previous());
                self.respond(bus, result);
            }
            Topic::PlayerTogglePause => {
                let result = self.state.with_mut(|ctx| ctx.driver.toggle_pause());
                self.respond(bus, result);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::messages::player::{Next, Previous, TogglePause, VolumeDown, VolumeUp};
    use crate::platform::mock::MockUart;
    use core::cell::RefCell;

    struct Responses {
        seen: RefCell<std::vec::Vec<CommandResponse>>,
    }

    impl Responses {
        fn new() -> Self {
            Self {
                seen: RefCell::new(std::vec::Vec::new()),
            }
        }
    }

    impl Subscriber for Responses {
        fn on_message(&self, _bus: &MessageBus<'_>, message: &Message<'_>) {
            self.seen
                .borrow_mut()
                .push(CommandResponse::decode(message.payload).unwrap());
        }
    }

    #[test]
    fn play_message_reaches_the_uart_and_responds_ok() {
        let service = PlayerService::new(MockUart::default());
        let responses = Responses::new();

        let bus = MessageBus::new();
        service.register(&bus).unwrap();
        bus.subscribe(Topic::PlayerResponse, &responses).unwrap();

        send(&bus, &Play { song_index: 12 });

        let tx = service.state.with(|ctx| ctx.driver.uart().tx_data());
        assert_eq!(tx, b"AT+PLAYNUM=12\r\n");
        assert_eq!(responses.seen.borrow().as_slice(), &[CommandResponse::ok()]);
    }

    #[test]
    fn out_of_range_volume_fails_with_a_code() {
        let service = PlayerService::new(MockUart::default());
        let responses = Responses::new();

        let bus = MessageBus::new();
        service.register(&bus).unwrap();
        bus.subscribe(Topic::PlayerResponse, &responses).unwrap();

        send(&bus, &SetVolume { volume: 99 });

        let seen = responses.seen.borrow();
        assert!(!seen[0].success);
        assert_eq!(seen[0].error_code, -2);
    }

    #[test]
    fn every_transport_command_answers() {
        let service = PlayerService::new(MockUart::default());
        let responses = Responses::new();

        let bus = MessageBus::new();
        service.register(&bus).unwrap();
        bus.subscribe(Topic::PlayerResponse, &responses).unwrap();

        send(&bus, &VolumeUp);
        send(&bus, &VolumeDown);
        send(&bus, &Next);
        send(&bus, &Previous);
        send(&bus, &TogglePause);
        send(
            &bus,
            &SetPlayMode {
                mode: PlayMode::SingleShot,
            },
        );

        assert_eq!(responses.seen.borrow().len(), 6);
        assert!(responses.seen.borrow().iter().all(|r| r.success));
    }
}
