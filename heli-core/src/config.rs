//! Rig configuration: controller gains, sensor scales, flight profile and
//! timing.
//!
//! The values in [`DEFAULT_CONFIG`] are the operating parameters of the
//! reference rig. They are data, not literals in the algorithms, so a rig
//! with a different encoder or different rotors only needs a new table.

/// Proportional, integral and derivative gains of one channel.
///
/// Gains are integers scaled by [`ControlConfig::gain_divisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidGains {
    pub kp: i32,
    pub ki: i32,
    pub kd: i32,
}

/// Inclusive duty-cycle bounds in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyLimits {
    pub min: u8,
    pub max: u8,
}

impl DutyLimits {
    /// Clamp a raw controller output to these limits.
    #[inline]
    #[must_use]
    pub fn clamp(&self, raw: i32) -> u8 {
        // min <= max is checked by RigConfig::validate
        raw.clamp(i32::from(self.min), i32::from(self.max)) as u8
    }
}

/// Gains and limits for one rotor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    pub gains: PidGains,
    pub limits: DutyLimits,
}

/// Integer ratio, applied as `value * numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ratio {
    pub numerator: i32,
    pub denominator: i32,
}

impl Ratio {
    #[inline]
    #[must_use]
    pub fn apply(&self, value: i32) -> i32 {
        value.saturating_mul(self.numerator) / self.denominator
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlConfig {
    /// Altitude loop, drives the main rotor.
    pub main: ChannelConfig,
    /// Yaw loop, drives the tail rotor.
    pub tail: ChannelConfig,
    /// Applied once to the summed P + I + D terms.
    pub gain_divisor: i32,
    /// Divides `ki * error` before it is accumulated.
    pub integral_scale: i32,
    /// Multiplies `kd * delta` (one tick per sample).
    pub derivative_scale: i32,
    /// Constant main duty added to counter the rig's weight.
    pub gravity_offset: i32,
    /// Share of the main output fed forward into the tail.
    pub coupling: Ratio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AltitudeConfig {
    /// ADC counts spanning the full altitude range (0.8 V at 12 bits).
    pub counts_per_volt: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct YawConfig {
    /// Slots on the encoder disc.
    pub slots: u16,
    /// Quadrature edges counted per slot.
    pub edges_per_slot: u16,
    /// Yaw setpoint lead while searching for the reference marker.
    pub pivot_step_units: i32,
}

impl YawConfig {
    /// Raw units in one full revolution.
    #[inline]
    #[must_use]
    pub const fn total_units(&self) -> i32 {
        (self.slots as i32).saturating_mul(self.edges_per_slot as i32)
    }
}

/// Altitude targets and user step sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlightProfile {
    /// Target during takeoff and landing.
    pub hover_altitude: i32,
    /// Target once flying.
    pub cruise_altitude: i32,
    pub altitude_step: i32,
    pub min_altitude: i32,
    pub max_altitude: i32,
    pub yaw_step_degrees: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    pub sample_rate_hz: u32,
    pub tick_rate_hz: u32,
    pub telemetry_rate_hz: u32,
    /// Delay between a mode-switch edge and reading its level.
    pub switch_settle_us: u32,
}

impl TimingConfig {
    /// Control ticks between two status reports.
    #[inline]
    #[must_use]
    pub const fn ticks_per_report(&self) -> u32 {
        self.tick_rate_hz / self.telemetry_rate_hz
    }
}

/// Complete rig configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RigConfig {
    pub control: ControlConfig,
    pub altitude: AltitudeConfig,
    pub yaw: YawConfig,
    pub flight: FlightProfile,
    pub timing: TimingConfig,
}

/// Reference rig configuration.
pub const DEFAULT_CONFIG: RigConfig = RigConfig {
    control: ControlConfig {
        main: ChannelConfig {
            gains: PidGains {
                kp: 1500,
                ki: 10,
                kd: 250,
            },
            limits: DutyLimits { min: 20, max: 80 },
        },
        tail: ChannelConfig {
            gains: PidGains {
                kp: 290,
                ki: 2,
                kd: 200,
            },
            limits: DutyLimits { min: 16, max: 64 },
        },
        gain_divisor: 1000,
        integral_scale: 100,
        derivative_scale: 100,
        gravity_offset: 51,
        coupling: Ratio {
            numerator: 8,
            denominator: 10,
        },
    },
    altitude: AltitudeConfig {
        counts_per_volt: 1241,
    },
    yaw: YawConfig {
        slots: 112,
        edges_per_slot: 4,
        pivot_step_units: 10,
    },
    flight: FlightProfile {
        hover_altitude: 5,
        cruise_altitude: 10,
        altitude_step: 10,
        min_altitude: 0,
        max_altitude: 100,
        yaw_step_degrees: 15,
    },
    timing: TimingConfig {
        sample_rate_hz: 150,
        tick_rate_hz: 100,
        telemetry_rate_hz: 8,
        switch_settle_us: 50,
    },
};

impl Default for RigConfig {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}

/// Reason a configuration was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A rate is zero, or telemetry is faster than the control tick.
    Rate,
    /// A divisor or scale is below one.
    Divisor,
    /// A channel's minimum duty exceeds its maximum, or the maximum exceeds 100 %.
    DutyLimits,
    /// The encoder has no units per revolution, or too many.
    Encoder,
    /// A flight altitude lies outside the allowed range.
    AltitudeRange,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Rate => write!(f, "invalid sample, tick or telemetry rate"),
            Self::Divisor => write!(f, "divisor or scale below one"),
            Self::DutyLimits => write!(f, "invalid duty limits"),
            Self::Encoder => write!(f, "invalid encoder geometry"),
            Self::AltitudeRange => write!(f, "altitude target out of range"),
        }
    }
}

impl RigConfig {
    /// Check the configuration for values the control path cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        if t.sample_rate_hz == 0
            || t.tick_rate_hz == 0
            || t.telemetry_rate_hz == 0
            || t.telemetry_rate_hz > t.tick_rate_hz
        {
            return Err(ConfigError::Rate);
        }

        let c = &self.control;
        if c.gain_divisor < 1
            || c.integral_scale < 1
            || c.derivative_scale < 1
            || c.coupling.denominator < 1
            || self.altitude.counts_per_volt < 1
        {
            return Err(ConfigError::Divisor);
        }
        for limits in [c.main.limits, c.tail.limits] {
            if limits.min > limits.max || limits.max > 100 {
                return Err(ConfigError::DutyLimits);
            }
        }

        // Degree conversion runs in I16F16
        let total = self.yaw.total_units();
        if total == 0 || total > i32::from(i16::MAX) {
            return Err(ConfigError::Encoder);
        }

        let f = &self.flight;
        let in_range = |alt: i32| (f.min_altitude..=f.max_altitude).contains(&alt);
        if !in_range(f.hover_altitude) || !in_range(f.cruise_altitude) {
            return Err(ConfigError::AltitudeRange);
        }

        Ok(())
    }
}
