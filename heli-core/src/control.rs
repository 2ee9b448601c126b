//! Dual PID control: altitude drives the main rotor, yaw drives the tail.
//!
//! All arithmetic is integer. Gains are pre-scaled by
//! [`ControlConfig::gain_divisor`], and the divisor is applied once to the
//! summed terms so small integral contributions survive.
//!
//! ```text
//! error = setpoint - reading
//! P     = kp * error
//! dI    = ki * error / integral_scale
//! D     = kd * (previous - reading) * derivative_scale
//! raw   = (P + (I + dI) + D) / gain_divisor       then I += dI
//!
//! main  = clamp(raw_main + gravity)
//! tail  = clamp(raw_tail + coupling * (raw_main + gravity))
//! ```

use crate::config::{ChannelConfig, ControlConfig};
use crate::yaw::YawScale;

/// Readings and setpoints shared by both loops.
///
/// Yaw values are raw encoder units, stored in `[0, total)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlState {
    pub altitude: i32,
    pub previous_altitude: i32,
    pub yaw: i32,
    pub previous_yaw: i32,
    pub altitude_setpoint: i32,
    pub yaw_setpoint: i32,
    /// User yaw offset in degrees, shown instead of the raw setpoint.
    pub yaw_increment: i32,
}

/// Duty cycles in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyCommand {
    pub main: u8,
    pub tail: u8,
}

/// One rotor's PID memory and last commanded duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RotorChannel {
    config: ChannelConfig,
    integral: i32,
    duty: u8,
}

impl RotorChannel {
    #[must_use]
    pub const fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            integral: 0,
            duty: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn integral(&self) -> i32 {
        self.integral
    }

    #[inline]
    #[must_use]
    pub const fn duty(&self) -> u8 {
        self.duty
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Unscaled P + I + D output; accumulates the integral.
    fn pid(&mut self, error: i32, delta: i32, scales: &ControlConfig) -> i32 {
        let gains = &self.config.gains;
        let p = gains.kp.saturating_mul(error);
        let d_i = gains.ki.saturating_mul(error) / scales.integral_scale;
        let d = gains
            .kd
            .saturating_mul(delta)
            .saturating_mul(scales.derivative_scale);

        let raw = p
            .saturating_add(self.integral.saturating_add(d_i))
            .saturating_add(d)
            / scales.gain_divisor;

        self.integral = self.integral.saturating_add(d_i);
        raw
    }

    fn saturate(&mut self, raw: i32) -> u8 {
        self.duty = self.config.limits.clamp(raw);
        self.duty
    }

    fn stop(&mut self) {
        self.integral = 0;
        self.duty = 0;
    }
}

/// Both PID loops plus the gravity and coupling feed-forward terms.
#[derive(Debug, Clone, Copy)]
pub struct ControlEngine {
    config: ControlConfig,
    scale: YawScale,
    main: RotorChannel,
    tail: RotorChannel,
}

impl ControlEngine {
    #[must_use]
    pub fn new(config: &ControlConfig, scale: YawScale) -> Self {
        Self {
            config: *config,
            scale,
            main: RotorChannel::new(config.main),
            tail: RotorChannel::new(config.tail),
        }
    }

    /// Run one step of both loops and return the saturated duties.
    ///
    /// Yaw error and rate are taken the short way round the circle.
    pub fn compute(&mut self, state: &mut ControlState) -> DutyCommand {
        let altitude_error = state.altitude_setpoint - state.altitude;
        let altitude_delta = state.previous_altitude - state.altitude;
        let yaw_error = self.scale.signed(state.yaw_setpoint - state.yaw);
        let yaw_delta = self.scale.signed(state.previous_yaw - state.yaw);

        let main_raw = self
            .main
            .pid(altitude_error, altitude_delta, &self.config)
            .saturating_add(self.config.gravity_offset);
        let tail_raw = self
            .tail
            .pid(yaw_error, yaw_delta, &self.config)
            .saturating_add(self.config.coupling.apply(main_raw));

        state.previous_altitude = state.altitude;
        state.previous_yaw = state.yaw;

        DutyCommand {
            main: self.main.saturate(main_raw),
            tail: self.tail.saturate(tail_raw),
        }
    }

    /// Zero both duties and clear the integrators.
    pub fn stop(&mut self) {
        self.main.stop();
        self.tail.stop();
    }

    /// Last commanded duties.
    #[inline]
    #[must_use]
    pub const fn duties(&self) -> DutyCommand {
        DutyCommand {
            main: self.main.duty(),
            tail: self.tail.duty(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn main(&self) -> &RotorChannel {
        &self.main
    }

    #[inline]
    #[must_use]
    pub const fn tail(&self) -> &RotorChannel {
        &self.tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONFIG;

    fn engine() -> ControlEngine {
        ControlEngine::new(
            &DEFAULT_CONFIG.control,
            YawScale::new(&DEFAULT_CONFIG.yaw),
        )
    }

    #[test]
    fn test_hover_at_setpoint_is_gravity_only() {
        let mut engine = engine();
        let mut state = ControlState {
            altitude: 5,
            previous_altitude: 5,
            altitude_setpoint: 5,
            ..Default::default()
        };
        let duty = engine.compute(&mut state);
        assert_eq!(duty.main, 51);
        // 51 * 8 / 10
        assert_eq!(duty.tail, 40);
    }

    #[test]
    fn test_reference_step() {
        let mut engine = engine();
        let mut state = ControlState {
            altitude_setpoint: 2,
            yaw_setpoint: 10,
            ..Default::default()
        };
        let duty = engine.compute(&mut state);
        // P = 3000, dI = 0 -> 3 + 51 = 54
        assert_eq!(duty.main, 54);
        // P = 2900, dI = 0 -> 2 + 54 * 8 / 10 = 45
        assert_eq!(duty.tail, 45);
        assert_eq!(engine.duties(), duty);
    }

    #[test]
    fn test_integral_accumulates_after_output() {
        let mut engine = engine();
        let mut state = ControlState {
            altitude_setpoint: 50,
            ..Default::default()
        };
        engine.compute(&mut state);
        assert_eq!(engine.main().integral(), 5);
        engine.compute(&mut state);
        assert_eq!(engine.main().integral(), 10);
    }

    #[test]
    fn test_derivative_opposes_motion() {
        let mut rising = engine();
        let mut still = engine();
        let mut a = ControlState {
            altitude: 10,
            previous_altitude: 8,
            altitude_setpoint: 10,
            ..Default::default()
        };
        let mut b = ControlState {
            altitude: 10,
            previous_altitude: 10,
            altitude_setpoint: 10,
            ..Default::default()
        };
        // D = 250 * -2 * 100 = -50000 -> -50 + 51 = 1, clamped to 20
        assert_eq!(rising.compute(&mut a).main, 20);
        assert_eq!(still.compute(&mut b).main, 51);
        assert_eq!(a.previous_altitude, 10);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let state = ControlState {
            altitude: 3,
            previous_altitude: 1,
            yaw: 400,
            previous_yaw: 390,
            altitude_setpoint: 10,
            yaw_setpoint: 20,
            yaw_increment: 0,
        };
        let (mut e1, mut e2) = (engine(), engine());
        let (mut s1, mut s2) = (state, state);
        for _ in 0..50 {
            assert_eq!(e1.compute(&mut s1), e2.compute(&mut s2));
        }
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_outputs_stay_within_limits() {
        let mut engine = engine();
        for setpoint in [-1000, -100, 0, 50, 100, 1000] {
            for yaw_setpoint in [0, 100, 223, 224, 300, 447] {
                let mut state = ControlState {
                    altitude_setpoint: setpoint,
                    yaw_setpoint,
                    ..Default::default()
                };
                let duty = engine.compute(&mut state);
                assert!((20..=80).contains(&duty.main));
                assert!((16..=64).contains(&duty.tail));
            }
        }
    }

    #[test]
    fn test_tail_clamps_to_exact_bounds() {
        // Climb hard and turn left: coupling alone pushes the tail past 64
        let mut state = ControlState {
            altitude_setpoint: 100,
            yaw_setpoint: 100,
            ..Default::default()
        };
        assert_eq!(engine().compute(&mut state).tail, 64);

        // Sink hard and turn right: the tail falls below 16
        let mut state = ControlState {
            altitude_setpoint: -100,
            yaw_setpoint: 448 - 100,
            ..Default::default()
        };
        assert_eq!(engine().compute(&mut state).tail, 16);
    }

    #[test]
    fn test_yaw_error_takes_short_way() {
        let mut engine = engine();
        // 440 is 8 units behind 0, so the tail must push the same way as
        // for a small positive error
        let mut state = ControlState {
            yaw: 440,
            previous_yaw: 440,
            altitude: 5,
            previous_altitude: 5,
            altitude_setpoint: 5,
            ..Default::default()
        };
        let ahead = engine.compute(&mut state).tail;
        assert!(ahead > 40);
    }

    #[test]
    fn test_integral_saturates_instead_of_overflowing() {
        let mut engine = engine();
        let mut state = ControlState {
            altitude_setpoint: i32::MAX / 2,
            ..Default::default()
        };
        for _ in 0..10 {
            engine.compute(&mut state);
        }
        assert!(engine.main().integral() > 0);
        assert_eq!(engine.duties().main, 80);
    }

    #[test]
    fn test_stop_clears_integrators() {
        let mut engine = engine();
        let mut state = ControlState {
            altitude_setpoint: 50,
            yaw_setpoint: 50,
            ..Default::default()
        };
        engine.compute(&mut state);
        engine.stop();
        assert_eq!(engine.main().integral(), 0);
        assert_eq!(engine.tail().integral(), 0);
        assert_eq!(engine.duties(), DutyCommand::default());
    }
}
