//! Yaw encoder and reference marker pins.

use embassy_futures::select::select;
use embassy_rp::gpio::Input;
use portable_atomic::{AtomicU8, Ordering};

/// Channel code captured at the most recent encoder edge.
pub struct CodeLatch(AtomicU8);

impl CodeLatch {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    #[inline]
    pub fn store(&self, code: u8) {
        self.0.store(code & 0b11, Ordering::Release);
    }

    #[inline]
    #[must_use]
    pub fn load(&self) -> u8 {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for CodeLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Encoder channels A and B.
pub struct EncoderPins<'d> {
    a: Input<'d>,
    b: Input<'d>,
}

impl<'d> EncoderPins<'d> {
    pub fn new(a: Input<'d>, b: Input<'d>) -> Self {
        Self { a, b }
    }

    /// Current 2-bit code, `A << 1 | B`.
    #[must_use]
    pub fn code(&self) -> u8 {
        (u8::from(self.a.is_high()) << 1) | u8::from(self.b.is_high())
    }

    /// Wait for either channel to change and return the new code.
    pub async fn next_edge(&mut self) -> u8 {
        select(self.a.wait_for_any_edge(), self.b.wait_for_any_edge()).await;
        self.code()
    }
}

/// Once-per-revolution index sensor, active low.
pub struct IndexPin<'d>(Input<'d>);

impl<'d> IndexPin<'d> {
    pub fn new(pin: Input<'d>) -> Self {
        Self(pin)
    }

    pub async fn wait_for_marker(&mut self) {
        self.0.wait_for_falling_edge().await;
    }
}
