//! Status reporting at the telemetry rate.

use heli_proto::StatusFrame;

use crate::output::TelemetrySink;

/// Divides the control tick down to the telemetry rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlowTick {
    period: u32,
    count: u32,
}

impl SlowTick {
    /// `period` ticks per slow tick; zero is treated as one.
    #[must_use]
    pub const fn new(period: u32) -> Self {
        Self {
            period: if period == 0 { 1 } else { period },
            count: 0,
        }
    }

    /// Count one tick. Returns `true` on every `period`-th call.
    pub fn advance(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.period {
            self.count = 0;
            true
        } else {
            false
        }
    }
}

/// Sends one status record every `period` ticks. Sink errors are logged and
/// the record is dropped.
#[derive(Debug, Clone, Copy)]
pub struct StatusReporter {
    slow_tick: SlowTick,
    dropped: u32,
}

impl StatusReporter {
    #[must_use]
    pub const fn new(period: u32) -> Self {
        Self {
            slow_tick: SlowTick::new(period),
            dropped: 0,
        }
    }

    /// Count one control tick; on a slow tick build and send a record.
    ///
    /// Returns `true` if a record was due.
    pub fn on_tick<S, F>(&mut self, sink: &mut S, frame: F) -> bool
    where
        S: TelemetrySink,
        F: FnOnce() -> StatusFrame,
    {
        if !self.slow_tick.advance() {
            return false;
        }
        if let Err(e) = sink.send_status(&frame()) {
            self.dropped = self.dropped.wrapping_add(1);
            warn!("status record dropped: {:?}", e);
        }
        true
    }

    /// Records the sink refused so far.
    #[inline]
    #[must_use]
    pub const fn dropped(&self) -> u32 {
        self.dropped
    }
}
