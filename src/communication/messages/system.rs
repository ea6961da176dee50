//! System-wide messages

use crate::communication::{get_bool, get_str, get_u8, put_bool, put_str, put_u8};
use crate::communication::{Payload, MAX_PAYLOAD};
use crate::core::broker::Topic;
use heapless::{String, Vec};

/// Maximum module name length in the set-logging message
pub const MODULE_NAME_MAX: usize = 32;

/// Addressable modules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleId {
    Schedule,
    Player,
    TimeSync,
    Wifi,
    Console,
    /// Special value addressing every module
    All,
}

impl ModuleId {
    fn as_u8(self) -> u8 {
        match self {
            ModuleId::Schedule => 0,
            ModuleId::Player => 1,
            ModuleId::TimeSync => 2,
            ModuleId::Wifi => 3,
            ModuleId::Console => 4,
            ModuleId::All => 5,
        }
    }

    fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(ModuleId::Schedule),
            1 => Some(ModuleId::Player),
            2 => Some(ModuleId::TimeSync),
            3 => Some(ModuleId::Wifi),
            4 => Some(ModuleId::Console),
            5 => Some(ModuleId::All),
            _ => None,
        }
    }

    /// Console-facing module name
    pub fn name(self) -> &'static str {
        match self {
            ModuleId::Schedule => "schedule",
            ModuleId::Player => "player",
            ModuleId::TimeSync => "timesync",
            ModuleId::Wifi => "wifi",
            ModuleId::Console => "console",
            ModuleId::All => "all",
        }
    }

    /// Parse a console-facing module name
    pub fn from_name(name: &str) -> Option<Self> {
        [
            ModuleId::Schedule,
            ModuleId::Player,
            ModuleId::TimeSync,
            ModuleId::Wifi,
            ModuleId::Console,
            ModuleId::All,
        ]
        .into_iter()
        .find(|m| m.name() == name)
    }
}

/// Enable or disable diagnostic logging on a module.
///
/// A module is addressed either by id or by name; receivers honor the message
/// if either matches (or the id is `All`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetLogging {
    pub module: ModuleId,
    pub name: String<MODULE_NAME_MAX>,
    pub enabled: bool,
}

impl SetLogging {
    /// Address a module by id (name carried along for display)
    pub fn for_module(module: ModuleId, enabled: bool) -> Self {
        let mut name = String::new();
        // Module names are all shorter than MODULE_NAME_MAX
        let _ = name.push_str(module.name());
        Self {
            module,
            name,
            enabled,
        }
    }

    /// Whether a module with the given id and name should act on this message
    pub fn targets(&self, id: ModuleId, name: &str) -> bool {
        self.module == id || self.module == ModuleId::All || self.name.as_str() == name
    }
}

impl Payload for SetLogging {
    const TOPIC: Topic = Topic::SetLogging;

    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()> {
        put_u8(buf, self.module.as_u8())?;
        put_bool(buf, self.enabled)?;
        put_str(buf, self.name.as_str())
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        let mut offset = 0;
        let module = ModuleId::from_u8(get_u8(buf, &mut offset)?)?;
        let enabled = get_bool(buf, &mut offset)?;
        let name = get_str::<MODULE_NAME_MAX>(buf, &mut offset)?;
        Some(Self {
            module,
            name,
            enabled,
        })
    }
}
