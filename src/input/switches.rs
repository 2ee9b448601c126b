//! Mode slider switch.

use embassy_rp::gpio::Input;
use heli_core::SwitchPosition;
use portable_atomic::{AtomicBool, Ordering};

/// Last level seen by the switch task.
pub struct SwitchLevel(AtomicBool);

impl SwitchLevel {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    #[inline]
    pub fn store(&self, position: SwitchPosition) {
        self.0
            .store(position == SwitchPosition::Up, Ordering::Release);
    }

    #[inline]
    #[must_use]
    pub fn load(&self) -> SwitchPosition {
        if self.0.load(Ordering::Acquire) {
            SwitchPosition::Up
        } else {
            SwitchPosition::Down
        }
    }
}

impl Default for SwitchLevel {
    fn default() -> Self {
        Self::new()
    }
}

/// The switch input. High is [`SwitchPosition::Up`].
pub struct SwitchPin<'d>(Input<'d>);

impl<'d> SwitchPin<'d> {
    pub fn new(pin: Input<'d>) -> Self {
        Self(pin)
    }

    #[must_use]
    pub fn position(&self) -> SwitchPosition {
        if self.0.is_high() {
            SwitchPosition::Up
        } else {
            SwitchPosition::Down
        }
    }

    /// Wait for the next edge and return the level after it.
    pub async fn next_change(&mut self) -> SwitchPosition {
        self.0.wait_for_any_edge().await;
        self.position()
    }
}
