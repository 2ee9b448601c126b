//! Sticky event flags shared between interrupt shims and the dispatcher.
//!
//! Each flag has one writer (the interrupt side calls [`InterruptFlags::raise`])
//! and one reader (the dispatcher calls [`InterruptFlags::take`]). `take` is an
//! atomic swap, so a raise landing between check and clear is never lost.

use portable_atomic::{AtomicBool, Ordering};

/// Events signalled from interrupt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Flag {
    /// Control tick elapsed.
    Tick,
    /// Mode switch changed level.
    ModeSwitch,
    /// Restart requested by software, e.g. a host-side command or a
    /// supervisor task. The hardware reset line is read through
    /// [`ResetSource`](crate::input::ResetSource) instead.
    ResetRequested,
    /// A quadrature channel changed.
    QuadratureEdge,
    /// The yaw reference marker passed the sensor.
    YawReference,
}

/// The set of sticky flags. Place one in a `static` and hand references to
/// the shims and the scheduler.
pub struct InterruptFlags {
    tick: AtomicBool,
    mode_switch: AtomicBool,
    reset_requested: AtomicBool,
    quadrature_edge: AtomicBool,
    yaw_reference: AtomicBool,
}

impl InterruptFlags {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tick: AtomicBool::new(false),
            mode_switch: AtomicBool::new(false),
            reset_requested: AtomicBool::new(false),
            quadrature_edge: AtomicBool::new(false),
            yaw_reference: AtomicBool::new(false),
        }
    }

    #[inline]
    fn cell(&self, flag: Flag) -> &AtomicBool {
        match flag {
            Flag::Tick => &self.tick,
            Flag::ModeSwitch => &self.mode_switch,
            Flag::ResetRequested => &self.reset_requested,
            Flag::QuadratureEdge => &self.quadrature_edge,
            Flag::YawReference => &self.yaw_reference,
        }
    }

    #[inline]
    pub fn raise(&self, flag: Flag) {
        self.cell(flag).store(true, Ordering::Release);
    }

    /// Clear the flag and report whether it was raised.
    #[inline]
    pub fn take(&self, flag: Flag) -> bool {
        self.cell(flag).swap(false, Ordering::AcqRel)
    }

    #[inline]
    #[must_use]
    pub fn is_raised(&self, flag: Flag) -> bool {
        self.cell(flag).load(Ordering::Acquire)
    }

    #[inline]
    pub fn clear(&self, flag: Flag) {
        self.cell(flag).store(false, Ordering::Release);
    }
}

impl Default for InterruptFlags {
    fn default() -> Self {
        Self::new()
    }
}
