//! The calibrated aircraft: estimator, control loops and flight mode.

use heli_proto::StatusFrame;

use crate::altitude::{AltitudeEstimator, ALTITUDE_BUFFER_DEPTH};
use crate::config::{FlightProfile, RigConfig};
use crate::control::{ControlEngine, ControlState, DutyCommand};
use crate::flight::{FlightEffect, FlightModeFsm, UserAccess};
use crate::input::{Button, ButtonSource, SwitchPosition};
use crate::output::{Actuator, Rotor};
use crate::yaw::{YawScale, YawTracker};

/// Everything that exists once the altitude reference is known.
#[derive(Debug, Clone)]
pub struct Aircraft<const N: usize = ALTITUDE_BUFFER_DEPTH> {
    estimator: AltitudeEstimator<N>,
    control: ControlState,
    engine: ControlEngine,
    fsm: FlightModeFsm,
    scale: YawScale,
    flight: FlightProfile,
}

impl<const N: usize> Aircraft<N> {
    /// Build a landed aircraft around a calibrated estimator. Setpoints
    /// start at zero and the rotors are off.
    pub fn new(estimator: AltitudeEstimator<N>, config: &RigConfig) -> Self {
        let scale = YawScale::new(&config.yaw);
        Self {
            estimator,
            control: ControlState::default(),
            engine: ControlEngine::new(&config.control, scale),
            fsm: FlightModeFsm::new(config.flight, config.yaw.pivot_step_units),
            scale,
            flight: config.flight,
        }
    }

    #[inline]
    pub fn record_sample(&mut self, raw: u16) {
        self.estimator.record_sample(raw);
    }

    /// Refresh both readings.
    pub fn estimate(&mut self, tracker: &YawTracker) {
        self.control.altitude = self.estimator.update();
        self.control.yaw = self.scale.wrap(tracker.position());
    }

    /// One control period: estimate, steer, actuate, then check progress.
    ///
    /// Rotors are left alone while landed.
    pub fn control_tick<A: Actuator>(&mut self, tracker: &YawTracker, actuator: &mut A) -> FlightEffect {
        self.estimate(tracker);
        self.fsm.update_setpoints(&mut self.control, &self.scale);
        if self.fsm.is_airborne() {
            let duty = self.engine.compute(&mut self.control);
            drive(actuator, duty);
        }
        let effect = self.fsm.check_threshold(&self.control);
        self.apply(effect, actuator)
    }

    /// Settled mode switch level.
    pub fn on_switch<A: Actuator>(&mut self, position: SwitchPosition, actuator: &mut A) -> FlightEffect {
        let effect = self.fsm.on_switch(position, &mut self.control);
        self.apply(effect, actuator)
    }

    /// The reference marker passed: it becomes yaw zero.
    pub fn capture_reference<A: Actuator>(
        &mut self,
        tracker: &mut YawTracker,
        actuator: &mut A,
    ) -> FlightEffect {
        tracker.on_reference_marker();
        self.control.yaw = 0;
        self.control.previous_yaw = 0;
        self.control.yaw_setpoint = 0;
        self.control.yaw_increment = 0;
        info!("yaw reference captured");

        let effect = self.fsm.on_reference_captured(&mut self.control);
        self.apply(effect, actuator)
    }

    /// Apply at most one button press to the setpoints.
    ///
    /// Buttons are checked in [`Button::ALL`] order and the first usable
    /// press wins. A press that would leave the altitude range is consumed
    /// without effect.
    pub fn adjust_setpoints<B: ButtonSource>(&mut self, buttons: &mut B) {
        if self.fsm.user_access() != UserAccess::Enabled {
            return;
        }

        let f = &self.flight;
        let c = &mut self.control;
        let yaw_step = self.scale.degrees_to_units(f.yaw_step_degrees);

        if buttons.take_press(Button::Up) && c.altitude_setpoint <= f.max_altitude - f.altitude_step {
            c.altitude_setpoint += f.altitude_step;
        } else if buttons.take_press(Button::Down)
            && c.altitude_setpoint >= f.min_altitude + f.altitude_step
        {
            c.altitude_setpoint -= f.altitude_step;
        } else if buttons.take_press(Button::Right) {
            c.yaw_setpoint -= yaw_step;
            c.yaw_increment -= f.yaw_step_degrees;
        } else if buttons.take_press(Button::Left) {
            c.yaw_setpoint += yaw_step;
            c.yaw_increment += f.yaw_step_degrees;
        }

        c.yaw_setpoint = self.scale.wrap(c.yaw_setpoint);
        c.yaw_increment = (c.yaw_increment + 180).rem_euclid(360) - 180;
    }

    /// Cut the rotors and clear the integrators.
    pub fn stop_rotors<A: Actuator>(&mut self, actuator: &mut A) {
        self.engine.stop();
        drive(actuator, DutyCommand::default());
    }

    fn apply<A: Actuator>(&mut self, effect: FlightEffect, actuator: &mut A) -> FlightEffect {
        match effect {
            FlightEffect::StopRotors => {
                info!("rotors stopped");
                self.stop_rotors(actuator);
            }
            FlightEffect::BeginPivotSearch => info!("searching for yaw reference"),
            FlightEffect::None => {}
        }
        effect
    }

    /// Status record for the ground terminal.
    #[must_use]
    pub fn status(&self) -> StatusFrame {
        let duty = self.engine.duties();
        StatusFrame {
            altitude_setpoint: saturate_i16(self.control.altitude_setpoint),
            altitude: saturate_i16(self.control.altitude),
            yaw_setpoint: saturate_i16(self.control.yaw_increment),
            yaw: saturate_i16(self.scale.to_degrees_rounded(self.control.yaw)),
            main_duty: duty.main,
            tail_duty: duty.tail,
            phase: self.fsm.phase(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn control(&self) -> &ControlState {
        &self.control
    }

    #[inline]
    #[must_use]
    pub const fn fsm(&self) -> &FlightModeFsm {
        &self.fsm
    }

    #[inline]
    #[must_use]
    pub const fn engine(&self) -> &ControlEngine {
        &self.engine
    }

    #[inline]
    #[must_use]
    pub const fn estimator(&self) -> &AltitudeEstimator<N> {
        &self.estimator
    }
}

fn drive<A: Actuator>(actuator: &mut A, duty: DutyCommand) {
    for (rotor, percent) in [(Rotor::Main, duty.main), (Rotor::Tail, duty.tail)] {
        if let Err(e) = actuator.set_duty(rotor, percent) {
            warn!("{:?} rotor write failed: {:?}", rotor, e);
        }
    }
}

#[inline]
fn saturate_i16(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}
