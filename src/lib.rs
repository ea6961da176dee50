#![cfg_attr(not(test), no_std)]

//! spieluhr - scheduled audio playback firmware
//!
//! Firmware core for a small controller that plays songs on command and on a
//! schedule. Modules are decoupled through a synchronous publish/subscribe
//! message broker; the schedule engine fires configured (hour, minute, song)
//! triggers at most once per matching minute and persists them across
//! reboots.

// The mock platform is host-only and uses heap-backed buffers
#[cfg(any(test, feature = "mock"))]
extern crate std;

// Platform abstraction layer (traits + mocks; boards implement the traits)
pub mod platform;

// Core systems: message broker, schedule engine, sync and logging
pub mod core;

// Message catalogue: typed payloads and their wire codecs
pub mod communication;

// Persistent settings (flash-backed key/value block)
pub mod storage;

// Device drivers
pub mod devices;

// Functional subsystems: time sync, WiFi credentials, player, console, LED
pub mod subsystems;
