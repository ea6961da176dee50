//! Functional subsystems
//!
//! The adapters around the core: each one owns its state behind
//! `ModuleState`, registers its bus subscriptions once at init, and follows
//! the dispatch discipline (decode → lock → mutate → unlock → publish).

pub mod console;
pub mod heartbeat;
pub mod player;
pub mod timesync;
pub mod wifi;

pub use console::ConsoleService;
pub use heartbeat::Heartbeat;
pub use player::PlayerService;
pub use timesync::TimeService;
pub use wifi::WifiService;
