//! Mock platform implementations for testing
//!
//! This module provides mock implementations of the platform traits that can
//! be used for unit testing without hardware.
//!
//! # Feature Gate
//!
//! Available during test builds (`#[cfg(test)]`) and when the `mock` feature
//! is enabled.

#![cfg(any(test, feature = "mock"))]

mod flash;
mod gpio;
mod rtc;
mod system;
mod uart;
mod wifi;

pub use flash::MockFlash;
pub use gpio::MockGpio;
pub use rtc::MockRtc;
pub use system::MockSystem;
pub use uart::MockUart;
pub use wifi::MockWifiLink;
