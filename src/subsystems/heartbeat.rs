//! Status LED heartbeat
//!
//! Toggles the board LED on a divided tick so a glance shows the main loop
//! is alive. Not a bus participant; the LED has nothing to say.

use crate::core::traits::{ModuleState, SharedState};
use crate::platform::traits::{GpioInterface, PinState};

struct HeartbeatCtx<G: GpioInterface> {
    led: G,
    ticks: u32,
}

/// The status LED driver
pub struct Heartbeat<G: GpioInterface> {
    state: ModuleState<HeartbeatCtx<G>>,
    /// Toggle once per this many ticks
    divider: u32,
}

impl<G: GpioInterface> Heartbeat<G> {
    pub fn new(led: G, divider: u32) -> Self {
        Self {
            state: ModuleState::new(HeartbeatCtx { led, ticks: 0 }),
            divider: divider.max(1),
        }
    }

    /// Periodic tick from the host loop
    pub fn run(&self) {
        self.state.with_mut(|ctx| {
            ctx.ticks += 1;
            if ctx.ticks >= self.divider {
                ctx.ticks = 0;
                let _ = ctx.led.toggle();
            }
        });
    }

    /// Force the LED off (e.g. before restart)
    pub fn off(&self) {
        self.state.with_mut(|ctx| {
            ctx.ticks = 0;
            let _ = ctx.led.set(PinState::Low);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockGpio;

    #[test]
    fn toggles_once_per_divider_ticks() {
        let heartbeat = Heartbeat::new(MockGpio::new(), 4);

        for _ in 0..12 {
            heartbeat.run();
        }

        assert_eq!(heartbeat.state.with(|ctx| ctx.led.toggle_count()), 3);
    }

    #[test]
    fn off_drives_the_pin_low() {
        let heartbeat = Heartbeat::new(MockGpio::new(), 1);
        heartbeat.run();
        assert_eq!(heartbeat.state.with(|ctx| ctx.led.state()), PinState::High);

        heartbeat.off();
        assert_eq!(heartbeat.state.with(|ctx| ctx.led.state()), PinState::Low);
    }
}
