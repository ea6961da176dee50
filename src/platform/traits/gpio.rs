//! GPIO interface trait

use crate::platform::Result;

/// Logical pin state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    Low,
    High,
}

/// GPIO output interface
///
/// Minimal output-pin abstraction for the status LED. Platform implementations
/// own the pin configuration; this trait only drives an already-configured
/// output.
pub trait GpioInterface {
    /// Drive the pin to the given state
    fn set(&mut self, state: PinState) -> Result<()>;

    /// Invert the current pin state
    fn toggle(&mut self) -> Result<()>;

    /// Current commanded state of the pin
    fn state(&self) -> PinState;
}
