//! Platform abstraction traits
//!
//! This module defines the traits that platform implementations must provide.

pub mod flash;
pub mod gpio;
pub mod rtc;
pub mod system;
pub mod uart;
pub mod wifi;

// Re-export trait interfaces
pub use flash::FlashInterface;
pub use gpio::{GpioInterface, PinState};
pub use rtc::{DateTime, RtcInterface};
pub use system::SystemControl;
pub use uart::{UartConfig, UartInterface};
pub use wifi::{LinkStatus, WifiLink};
