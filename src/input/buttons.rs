//! Panel buttons: polled, debounced and latched.

use embassy_rp::gpio::Input;
use heli_core::Button;
use portable_atomic::{AtomicBool, Ordering};

/// Consecutive polls a new level must hold before it is accepted.
pub const DEBOUNCE_POLLS: u8 = 3;

/// Presses waiting for the scheduler. Written by the button task.
pub struct ButtonLatch {
    pressed: [AtomicBool; 4],
}

impl ButtonLatch {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pressed: [
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
            ],
        }
    }

    #[inline]
    pub fn press(&self, button: Button) {
        self.pressed[button as usize].store(true, Ordering::Release);
    }

    #[inline]
    pub fn take(&self, button: Button) -> bool {
        self.pressed[button as usize].swap(false, Ordering::AcqRel)
    }
}

impl Default for ButtonLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Default)]
struct Debounce {
    pushed: bool,
    count: u8,
}

impl Debounce {
    /// Feed one raw level. Returns `true` when a push is accepted.
    fn update(&mut self, raw: bool) -> bool {
        if raw == self.pushed {
            self.count = 0;
            return false;
        }
        self.count += 1;
        if self.count < DEBOUNCE_POLLS {
            return false;
        }
        self.count = 0;
        self.pushed = raw;
        raw
    }
}

/// The four active-low button inputs, in [`Button::ALL`] order.
pub struct ButtonPanel<'d> {
    pins: [Input<'d>; 4],
    state: [Debounce; 4],
}

impl<'d> ButtonPanel<'d> {
    pub fn new(up: Input<'d>, down: Input<'d>, right: Input<'d>, left: Input<'d>) -> Self {
        Self {
            pins: [up, down, right, left],
            state: [Debounce::default(); 4],
        }
    }

    /// Sample every button once and latch accepted pushes.
    pub fn poll(&mut self, latch: &ButtonLatch) {
        for button in Button::ALL {
            let i = button as usize;
            if self.state[i].update(self.pins[i].is_low()) {
                latch.press(button);
            }
        }
    }
}
