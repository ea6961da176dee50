//! Serial console subsystem
//!
//! Line-based command interface over a UART. Each accepted line translates
//! 1:1 into a bus message; the responses come back over the bus and are
//! rendered as text. The console holds no command state of its own; it is a
//! pure translator on both directions.
//!
//! No line editing beyond backspace; lines end on CR or LF.

use crate::communication::messages::player::{
    CommandResponse, Next, Play, PlayMode, Previous, SetPlayMode, SetVolume, TogglePause,
    VolumeDown, VolumeUp,
};
use crate::communication::messages::schedule::{
    Add, Clear, List, ListResponse, Remove, Response, SetEnabled, WeekdayMask,
};
use crate::communication::messages::system::{ModuleId, SetLogging};
use crate::communication::messages::wifi::{
    CredentialsResponse, GetCredentials, SetCredentials, StatusUpdate, PASSWORD_MAX, SSID_MAX,
};
use crate::communication::{send, Payload};
use crate::core::broker::{BusError, Message, MessageBus, Subscriber, Topic};
use crate::core::traits::{ModuleState, SharedState};
use crate::platform::traits::{LinkStatus, SystemControl, UartInterface};
use core::fmt::Write;
use heapless::String;

/// Maximum accepted line length; longer lines are dropped whole
const LINE_MAX: usize = 96;

/// Render buffer for one output line
const OUT_MAX: usize = 128;

struct ConsoleCtx<U: UartInterface, S: SystemControl> {
    uart: U,
    system: S,
    line: String<LINE_MAX>,
}

impl<U: UartInterface, S: SystemControl> ConsoleCtx<U, S> {
    /// Drain pending input; returns the next completed line, if any.
    fn pump(&mut self) -> Option<String<LINE_MAX>> {
        let mut byte = [0u8; 1];
        while self.uart.available() {
            if self.uart.read(&mut byte).unwrap_or(0) == 0 {
                break;
            }
            match byte[0] {
                b'\r' | b'\n' => {
                    if !self.line.is_empty() {
                        let line = self.line.clone();
                        self.line.clear();
                        return Some(line);
                    }
                }
                0x08 | 0x7F => {
                    self.line.pop();
                }
                b if b.is_ascii_graphic() || b == b' ' => {
                    // Overlong line: drop it wholesale rather than truncate
                    if self.line.push(b as char).is_err() {
                        self.line.clear();
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn write_line(&mut self, text: &str) {
        let _ = self.uart.write(text.as_bytes());
        let _ = self.uart.write(b"\r\n");
    }
}

/// The serial console on the bus
pub struct ConsoleService<U: UartInterface, S: SystemControl> {
    state: ModuleState<ConsoleCtx<U, S>>,
}

impl<U: UartInterface, S: SystemControl> ConsoleService<U, S> {
    pub fn new(uart: U, system: S) -> Self {
        Self {
            state: ModuleState::new(ConsoleCtx {
                uart,
                system,
                line: String::new(),
            }),
        }
    }

    /// Subscribe to every response topic the console renders.
    pub fn register<'s>(&'s self, bus: &MessageBus<'s>) -> Result<(), BusError> {
        for topic in [
            Topic::ScheduleResponse,
            Topic::ScheduleListResponse,
            Topic::PlayerResponse,
            Topic::WifiCredentials,
            Topic::WifiStatus,
        ] {
            bus.subscribe(topic, self)?;
        }
        Ok(())
    }

    /// Periodic tick from the host loop: process any completed input lines.
    pub fn run(&self, bus: &MessageBus<'_>) {
        // Lines are handled outside the module lock: publishing a command
        // re-enters this console through the response subscriptions.
        while let Some(line) = self.state.with_mut(ConsoleCtx::pump) {
            self.handle_line(bus, line.as_str());
        }
    }

    fn print(&self, text: &str) {
        self.state.with_mut(|ctx| ctx.write_line(text));
    }

    fn handle_line(&self, bus: &MessageBus<'_>, line: &str) {
        let mut parts = line.split_ascii_whitespace();
        let Some(cmd) = parts.next() else {
            return;
        };

        match cmd {
            "help" => self.print_help(),
            "sched" => self.cmd_sched(bus, &mut parts),
            "vol" => self.cmd_vol(bus, &mut parts),
            "mode" => self.cmd_mode(bus, &mut parts),
            "play" => match parts.next().and_then(|t| t.parse::<u16>().ok()) {
                Some(song_index) => send(bus, &Play { song_index }),
                None => self.print("usage: play <song>"),
            },
            "next" => send(bus, &Next),
            "prev" => send(bus, &Previous),
            "pause" => send(bus, &TogglePause),
            "wifi" => self.cmd_wifi(bus, &mut parts),
            "log" => self.cmd_log(bus, &mut parts),
            "uptime" => self.cmd_uptime(),
            "restart" => self.cmd_restart(),
            _ => self.print("unknown command, try 'help'"),
        }
    }

    fn cmd_sched<'t>(&self, bus: &MessageBus<'_>, parts: &mut impl Iterator<Item = &'t str>) {
        match parts.next() {
            Some("add") => {
                let hour = parts.next().and_then(|t| t.parse::<u8>().ok());
                let minute = parts.next().and_then(|t| t.parse::<u8>().ok());
                let song = parts.next().and_then(|t| t.parse::<u16>().ok());
                let (Some(hour), Some(minute), Some(song_index)) = (hour, minute, song) else {
                    self.print("usage: sched add <hour> <minute> <song> [days]");
                    return;
                };
                if hour > 23 || minute > 59 {
                    self.print("error: time out of range");
                    return;
                }
                let weekdays = match parts.next() {
                    Some(days) => match parse_weekdays(days) {
                        Some(mask) => mask,
                        None => {
                            self.print("error: bad day list (e.g. mon,wed,fri)");
                            return;
                        }
                    },
                    None => WeekdayMask::EVERY_DAY,
                };
                send(
                    bus,
                    &Add {
                        hour,
                        minute,
                        song_index,
                        weekdays,
                    },
                );
            }
            Some("rm") => match parts.next().and_then(|t| t.parse::<i32>().ok()) {
                Some(id) => send(bus, &Remove { id }),
                None => self.print("usage: sched rm <id>"),
            },
            Some("list") => send(bus, &List),
            Some("clear") => send(bus, &Clear),
            Some("on") => send(bus, &SetEnabled { enabled: true }),
            Some("off") => send(bus, &SetEnabled { enabled: false }),
            _ => self.print("usage: sched add|rm|list|clear|on|off"),
        }
    }

    fn cmd_vol<'t>(&self, bus: &MessageBus<'_>, parts: &mut impl Iterator<Item = &'t str>) {
        match parts.next() {
            Some("up") => send(bus, &VolumeUp),
            Some("down") => send(bus, &VolumeDown),
            Some(raw) => match raw.parse::<u8>() {
                Ok(volume) => send(bus, &SetVolume { volume }),
                Err(_) => self.print("usage: vol up|down|<0-31>"),
            },
            None => self.print("usage: vol up|down|<0-31>"),
        }
    }

    fn cmd_mode<'t>(&self, bus: &MessageBus<'_>, parts: &mut impl Iterator<Item = &'t str>) {
        let mode = match parts.next() {
            Some("loop") => PlayMode::Loop,
            Some("single") => PlayMode::SingleLoop,
            Some("folder") => PlayMode::FolderLoop,
            Some("random") => PlayMode::Random,
            Some("once") => PlayMode::SingleShot,
            _ => {
                self.print("usage: mode loop|single|folder|random|once");
                return;
            }
        };
        send(bus, &SetPlayMode { mode });
    }

    fn cmd_wifi<'t>(&self, bus: &MessageBus<'_>, parts: &mut impl Iterator<Item = &'t str>) {
        match parts.next() {
            Some("set") => {
                let (Some(ssid), Some(password)) = (parts.next(), parts.next()) else {
                    self.print("usage: wifi set <ssid> <password>");
                    return;
                };
                let (Ok(ssid), Ok(password)) = (
                    String::<SSID_MAX>::try_from(ssid),
                    String::<PASSWORD_MAX>::try_from(password),
                ) else {
                    self.print("error: ssid or password too long");
                    return;
                };
                send(bus, &SetCredentials { ssid, password });
            }
            Some("show") => send(bus, &GetCredentials),
            _ => self.print("usage: wifi set|show"),
        }
    }

    fn cmd_log<'t>(&self, bus: &MessageBus<'_>, parts: &mut impl Iterator<Item = &'t str>) {
        let module = parts.next().and_then(ModuleId::from_name);
        let enabled = match parts.next() {
            Some("on") => Some(true),
            Some("off") => Some(false),
            _ => None,
        };
        match (module, enabled) {
            (Some(module), Some(enabled)) => send(bus, &SetLogging::for_module(module, enabled)),
            _ => self.print("usage: log <module|all> on|off"),
        }
    }

    fn cmd_uptime(&self) {
        let mut out: String<OUT_MAX> = String::new();
        self.state.with_mut(|ctx| {
            let seconds = ctx.system.uptime_us() / 1_000_000;
            let _ = write!(
                out,
                "uptime: {}h {}m {}s",
                seconds / 3600,
                (seconds / 60) % 60,
                seconds % 60
            );
            ctx.write_line(out.as_str());
        });
    }

    fn cmd_restart(&self) {
        self.state.with_mut(|ctx| {
            ctx.write_line("restarting...");
            ctx.system.restart();
        });
    }

    fn print_help(&self) {
        for line in [
            "commands:",
            "  sched add <hour> <minute> <song> [days]",
            "  sched rm <id> | list | clear | on | off",
            "  vol up|down|<0-31>",
            "  mode loop|single|folder|random|once",
            "  play <song> | next | prev | pause",
            "  wifi set <ssid> <password> | wifi show",
            "  log <module|all> on|off",
            "  uptime | restart",
        ] {
            self.print(line);
        }
    }
}

fn parse_weekdays(raw: &str) -> Option<WeekdayMask> {
    let mut mask = WeekdayMask::empty();
    for day in raw.split(',') {
        mask |= match day {
            "sun" => WeekdayMask::SUN,
            "mon" => WeekdayMask::MON,
            "tue" => WeekdayMask::TUE,
            "wed" => WeekdayMask::WED,
            "thu" => WeekdayMask::THU,
            "fri" => WeekdayMask::FRI,
            "sat" => WeekdayMask::SAT,
            "all" => WeekdayMask::EVERY_DAY,
            _ => return None,
        };
    }
    Some(mask)
}

impl<U: UartInterface, S: SystemControl> Subscriber for ConsoleService<U, S> {
    fn on_message(&self, _bus: &MessageBus<'_>, message: &Message<'_>) {
        let mut out: String<OUT_MAX> = String::new();

        match message.topic {
            Topic::ScheduleResponse => {
                let Some(response) = Response::decode(message.payload) else {
                    return;
                };
                let _ = match (response.success, response.id) {
                    (true, Some(id)) => write!(out, "ok, schedule {}", id),
                    (true, None) => write!(out, "ok"),
                    (false, _) => write!(out, "error: schedule command failed"),
                };
                self.print(out.as_str());
            }
            Topic::ScheduleListResponse => {
                let Some(list) = ListResponse::decode(message.payload) else {
                    return;
                };
                for entry in &list.entries {
                    out.clear();
                    let _ = write!(
                        out,
                        "  {}: {:02}:{:02} -> song {}",
                        entry.id, entry.hour, entry.minute, entry.song_index
                    );
                    self.print(out.as_str());
                }
                out.clear();
                let _ = write!(out, "{} schedule(s)", list.entries.len());
                self.print(out.as_str());
            }
            Topic::PlayerResponse => {
                let Some(response) = CommandResponse::decode(message.payload) else {
                    return;
                };
                if response.success {
                    self.print("ok");
                } else {
                    let _ = write!(out, "error: player code {}", response.error_code);
                    self.print(out.as_str());
                }
            }
            Topic::WifiCredentials => {
                let Some(creds) = CredentialsResponse::decode(message.payload) else {
                    return;
                };
                if creds.has_credentials {
                    let _ = write!(out, "ssid: {}  password: {}", creds.ssid, creds.password);
                    self.print(out.as_str());
                } else {
                    self.print("no wifi credentials stored");
                }
            }
            Topic::WifiStatus => {
                let Some(update) = StatusUpdate::decode(message.payload) else {
                    return;
                };
                let _ = match update.status {
                    LinkStatus::Connected => {
                        write!(out, "wifi: connected to {} ({} dBm)", update.ssid, update.rssi)
                    }
                    LinkStatus::Connecting => write!(out, "wifi: connecting to {}", update.ssid),
                    LinkStatus::Failed => write!(out, "wifi: connection failed"),
                    LinkStatus::Disconnected => write!(out, "wifi: disconnected"),
                };
                self.print(out.as_str());
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{MockSystem, MockUart};
    use core::cell::RefCell;

    /// Records raw payloads seen on one topic.
    struct Probe {
        topic: Topic,
        seen: RefCell<std::vec::Vec<std::vec::Vec<u8>>>,
    }

    impl Probe {
        fn new(topic: Topic) -> Self {
            Self {
                topic,
                seen: RefCell::new(std::vec::Vec::new()),
            }
        }

        fn decode<P: Payload>(&self) -> P {
            P::decode(self.seen.borrow().last().expect("nothing seen")).expect("bad payload")
        }

        fn count(&self) -> usize {
            self.seen.borrow().len()
        }
    }

    impl Subscriber for Probe {
        fn on_message(&self, _bus: &MessageBus<'_>, message: &Message<'_>) {
            if message.topic == self.topic {
                self.seen.borrow_mut().push(message.payload.to_vec());
            }
        }
    }

    fn console() -> ConsoleService<MockUart, MockSystem> {
        ConsoleService::new(MockUart::default(), MockSystem::new())
    }

    fn type_line(service: &ConsoleService<MockUart, MockSystem>, bus: &MessageBus<'_>, line: &str) {
        service.state.with_mut(|ctx| {
            ctx.uart.inject_rx_data(line.as_bytes());
            ctx.uart.inject_rx_data(b"\r\n");
        });
        service.run(bus);
    }

    fn output(service: &ConsoleService<MockUart, MockSystem>) -> std::string::String {
        let raw = service.state.with(|ctx| ctx.uart.tx_data());
        std::string::String::from_utf8(raw).unwrap()
    }

    #[test]
    fn sched_add_publishes_the_add_message() {
        let service = console();
        let probe = Probe::new(Topic::ScheduleAdd);

        let bus = MessageBus::new();
        service.register(&bus).unwrap();
        bus.subscribe(Topic::ScheduleAdd, &probe).unwrap();

        type_line(&service, &bus, "sched add 7 30 12");

        let add: Add = probe.decode();
        assert_eq!(add.hour, 7);
        assert_eq!(add.minute, 30);
        assert_eq!(add.song_index, 12);
        assert_eq!(add.weekdays, WeekdayMask::EVERY_DAY);
    }

    #[test]
    fn sched_add_with_days_parses_the_mask() {
        let service = console();
        let probe = Probe::new(Topic::ScheduleAdd);

        let bus = MessageBus::new();
        service.register(&bus).unwrap();
        bus.subscribe(Topic::ScheduleAdd, &probe).unwrap();

        type_line(&service, &bus, "sched add 7 30 12 mon,wed,fri");

        let add: Add = probe.decode();
        assert_eq!(
            add.weekdays,
            WeekdayMask::MON | WeekdayMask::WED | WeekdayMask::FRI
        );
    }

    #[test]
    fn sched_add_rejects_out_of_range_time_locally() {
        let service = console();
        let probe = Probe::new(Topic::ScheduleAdd);

        let bus = MessageBus::new();
        service.register(&bus).unwrap();
        bus.subscribe(Topic::ScheduleAdd, &probe).unwrap();

        type_line(&service, &bus, "sched add 24 00 1");

        assert_eq!(probe.count(), 0);
        assert!(output(&service).contains("time out of range"));
    }

    #[test]
    fn schedule_response_renders_id() {
        let service = console();
        let bus = MessageBus::new();
        service.register(&bus).unwrap();

        send(&bus, &Response::ok(Some(3)));
        send(&bus, &Response::failed());

        let text = output(&service);
        assert!(text.contains("ok, schedule 3"));
        assert!(text.contains("error: schedule command failed"));
    }

    #[test]
    fn list_response_renders_each_entry() {
        use crate::communication::messages::schedule::EntryInfo;

        let service = console();
        let bus = MessageBus::new();
        service.register(&bus).unwrap();

        let mut list = ListResponse::default();
        list.entries
            .push(EntryInfo {
                id: 2,
                hour: 9,
                minute: 5,
                song_index: 7,
            })
            .unwrap();
        send(&bus, &list);

        let text = output(&service);
        assert!(text.contains("2: 09:05 -> song 7"));
        assert!(text.contains("1 schedule(s)"));
    }

    #[test]
    fn transport_commands_map_one_to_one() {
        let service = console();
        let next = Probe::new(Topic::PlayerNext);
        let prev = Probe::new(Topic::PlayerPrevious);
        let pause = Probe::new(Topic::PlayerTogglePause);
        let vol = Probe::new(Topic::PlayerSetVolume);
        let mode = Probe::new(Topic::PlayerSetMode);

        let bus = MessageBus::new();
        service.register(&bus).unwrap();
        for probe in [&next, &prev, &pause, &vol, &mode] {
            bus.subscribe(probe.topic, probe).unwrap();
        }

        type_line(&service, &bus, "next");
        type_line(&service, &bus, "prev");
        type_line(&service, &bus, "pause");
        type_line(&service, &bus, "vol 15");
        type_line(&service, &bus, "mode random");

        assert_eq!(next.count(), 1);
        assert_eq!(prev.count(), 1);
        assert_eq!(pause.count(), 1);
        let vol_msg: SetVolume = vol.decode();
        assert_eq!(vol_msg.volume, 15);
        let mode_msg: SetPlayMode = mode.decode();
        assert_eq!(mode_msg.mode, PlayMode::Random);
    }

    #[test]
    fn log_command_targets_a_module() {
        let service = console();
        let probe = Probe::new(Topic::SetLogging);

        let bus = MessageBus::new();
        service.register(&bus).unwrap();
        bus.subscribe(Topic::SetLogging, &probe).unwrap();

        type_line(&service, &bus, "log schedule on");

        let cmd: SetLogging = probe.decode();
        assert_eq!(cmd.module, ModuleId::Schedule);
        assert!(cmd.enabled);

        type_line(&service, &bus, "log toaster on");
        assert_eq!(probe.count(), 1);
        assert!(output(&service).contains("usage: log"));
    }

    #[test]
    fn uptime_and_restart_use_system_control() {
        let service = console();
        let bus = MessageBus::new();
        service.register(&bus).unwrap();

        service.state.with_mut(|ctx| ctx.system.advance_us(3_661_000_000));
        type_line(&service, &bus, "uptime");
        assert!(output(&service).contains("uptime: 1h 1m 1s"));

        type_line(&service, &bus, "restart");
        assert!(service.state.with(|ctx| ctx.system.restart_requested()));
    }

    #[test]
    fn backspace_edits_the_line() {
        let service = console();
        let probe = Probe::new(Topic::PlayerPlay);

        let bus = MessageBus::new();
        service.register(&bus).unwrap();
        bus.subscribe(Topic::PlayerPlay, &probe).unwrap();

        service.state.with_mut(|ctx| {
            ctx.uart.inject_rx_data(b"play 13\x085\r\n");
        });
        service.run(&bus);

        let play: Play = probe.decode();
        assert_eq!(play.song_index, 15);
    }

    #[test]
    fn unknown_command_prints_a_hint() {
        let service = console();
        let bus = MessageBus::new();
        service.register(&bus).unwrap();

        type_line(&service, &bus, "frobnicate");
        assert!(output(&service).contains("unknown command"));
    }

    #[test]
    fn wifi_set_publishes_credentials() {
        let service = console();
        let probe = Probe::new(Topic::WifiSetCredentials);

        let bus = MessageBus::new();
        service.register(&bus).unwrap();
        bus.subscribe(Topic::WifiSetCredentials, &probe).unwrap();

        type_line(&service, &bus, "wifi set shed hunter2");

        let creds: SetCredentials = probe.decode();
        assert_eq!(creds.ssid.as_str(), "shed");
        assert_eq!(creds.password.as_str(), "hunter2");
    }
}
