//! Platform abstraction layer
//!
//! This module provides hardware abstraction for the controller board. All
//! platform-specific code must be isolated behind the traits defined here;
//! the rest of the crate only ever sees these interfaces.

pub mod error;
pub mod traits;

// Mock implementations (host tests and the `mock` feature)
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{PlatformError, Result};
pub use traits::{
    DateTime, FlashInterface, GpioInterface, LinkStatus, RtcInterface, SystemControl,
    UartInterface, WifiLink,
};
