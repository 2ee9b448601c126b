//! Yaw position from the slotted-disc quadrature encoder.

use fixed::types::I16F16;

use crate::config::YawConfig;

/// Position step for each `(current << 2) | previous` code pair.
///
/// Pairs where both channels changed at once are not decodable and count as
/// no movement.
const QUADRATURE_STEP: [i8; 16] = [0, 1, -1, 0, -1, 0, 0, 1, 1, 0, 0, -1, 0, -1, 1, 0];

/// Position change between two consecutive 2-bit codes.
#[inline]
#[must_use]
pub fn quadrature_step(previous: u8, current: u8) -> i8 {
    QUADRATURE_STEP[usize::from(((current & 0b11) << 2) | (previous & 0b11))]
}

/// Conversion between raw encoder units and degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YawScale {
    total: i32,
    degrees_per_unit: I16F16,
}

impl YawScale {
    /// Build the scale for an encoder. `config` must have passed
    /// [`RigConfig::validate`](crate::config::RigConfig::validate).
    #[must_use]
    pub fn new(config: &YawConfig) -> Self {
        let total = config.total_units().max(1);
        Self {
            total,
            degrees_per_unit: I16F16::from_num(360) / I16F16::saturating_from_num(total),
        }
    }

    /// Units in one revolution.
    #[inline]
    #[must_use]
    pub const fn total(&self) -> i32 {
        self.total
    }

    /// Wrap into `[0, total)`.
    #[inline]
    #[must_use]
    pub const fn wrap(&self, units: i32) -> i32 {
        units.rem_euclid(self.total)
    }

    /// Wrap into `[-total/2, total/2)`, the shortest signed distance.
    #[inline]
    #[must_use]
    pub const fn signed(&self, units: i32) -> i32 {
        let half = self.total / 2;
        (units + half).rem_euclid(self.total) - half
    }

    /// Degrees in `[-180, 180)`.
    #[must_use]
    pub fn to_degrees(&self, units: i32) -> I16F16 {
        I16F16::saturating_from_num(self.signed(units)).saturating_mul(self.degrees_per_unit)
    }

    /// Degrees rounded to the nearest integer.
    #[must_use]
    pub fn to_degrees_rounded(&self, units: i32) -> i32 {
        self.to_degrees(units).round().to_num::<i32>()
    }

    /// Nearest whole number of units for a signed angle.
    #[must_use]
    pub const fn degrees_to_units(&self, degrees: i32) -> i32 {
        let scaled = degrees * self.total;
        if scaled >= 0 {
            (scaled + 180) / 360
        } else {
            (scaled - 180) / 360
        }
    }
}

/// Absolute yaw position, counted in quadrature edges.
#[derive(Debug, Clone, Copy)]
pub struct YawTracker {
    scale: YawScale,
    previous_code: u8,
    position: i32,
}

impl YawTracker {
    #[must_use]
    pub fn new(scale: YawScale) -> Self {
        Self {
            scale,
            previous_code: 0,
            position: 0,
        }
    }

    /// Adopt the encoder's current code without moving.
    #[inline]
    pub fn seed(&mut self, code: u8) {
        self.previous_code = code & 0b11;
    }

    /// Apply one channel edge.
    pub fn on_edge(&mut self, code: u8) {
        let code = code & 0b11;
        let step = i32::from(quadrature_step(self.previous_code, code));
        self.position = self.scale.wrap(self.position + step);
        self.previous_code = code;
    }

    /// Zero the position at the reference marker.
    #[inline]
    pub fn on_reference_marker(&mut self) {
        self.position = 0;
    }

    /// Position in `[0, total)`.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> i32 {
        self.position
    }

    #[inline]
    #[must_use]
    pub const fn scale(&self) -> &YawScale {
        &self.scale
    }

    #[must_use]
    pub fn degrees(&self) -> I16F16 {
        self.scale.to_degrees(self.position)
    }

    #[must_use]
    pub fn degrees_rounded(&self) -> i32 {
        self.scale.to_degrees_rounded(self.position)
    }
}
