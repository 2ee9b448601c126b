//! Foreground dispatcher: services the interrupt flags in a fixed order.
//!
//! One [`Scheduler::dispatch`] pass does, in order:
//!
//! 1. reset check
//! 2. button adjustments (only with user access)
//! 3. tick: drain samples, then calibrate or run one control period, then
//!    telemetry at the slow rate
//! 4. mode switch (deferred while calibrating or during takeoff/landing)
//! 5. quadrature edge
//! 6. yaw reference capture (only while searching for it)
//! 7. reset check
//!
//! Interrupt shims never touch the aircraft; they capture a value and raise
//! a flag, and everything else happens here.

use embedded_hal::delay::DelayNs;

use crate::aircraft::Aircraft;
use crate::altitude::{AltitudeBuffer, AltitudeEstimator, CalibrationError, ALTITUDE_BUFFER_DEPTH};
use crate::config::{ConfigError, RigConfig};
use crate::flags::{Flag, InterruptFlags};
use crate::flight::{FlightEffect, UserAccess};
use crate::input::RigInputs;
use crate::output::RigOutputs;
use crate::telemetry::StatusReporter;
use crate::yaw::{YawScale, YawTracker};

/// The run ended because a reset was requested. The caller performs the
/// hardware reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Restart;

impl core::fmt::Display for Restart {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "restart requested")
    }
}

/// Calibration first, then flight.
#[derive(Debug, Clone)]
pub enum Stage<const N: usize = ALTITUDE_BUFFER_DEPTH> {
    /// Filling the altitude ring for the ground reference.
    Calibrating(AltitudeBuffer<N>),
    Running(Aircraft<N>),
}

impl<const N: usize> Default for Stage<N> {
    fn default() -> Self {
        Self::Calibrating(AltitudeBuffer::new())
    }
}

/// Foreground dispatcher for one rig.
///
/// Owns the collaborators and the aircraft, and borrows the flags the
/// interrupt shims raise. Call [`dispatch`](Self::dispatch) in a loop, or
/// [`run`](Self::run) to block until a restart is requested.
pub struct Scheduler<'f, I, O, D, const N: usize = ALTITUDE_BUFFER_DEPTH> {
    config: RigConfig,
    flags: &'f InterruptFlags,
    inputs: I,
    outputs: O,
    delay: D,
    stage: Stage<N>,
    tracker: YawTracker,
    reporter: StatusReporter,
}

impl<'f, I, O, D, const N: usize> Scheduler<'f, I, O, D, N>
where
    I: RigInputs,
    O: RigOutputs,
    D: DelayNs,
{
    /// Validate `config` and start calibrating.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] from [`RigConfig::validate`].
    pub fn new(
        config: RigConfig,
        flags: &'f InterruptFlags,
        mut inputs: I,
        outputs: O,
        delay: D,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut tracker = YawTracker::new(YawScale::new(&config.yaw));
        tracker.seed(inputs.read_code());

        Ok(Self {
            config,
            flags,
            inputs,
            outputs,
            delay,
            stage: Stage::default(),
            tracker,
            reporter: StatusReporter::new(config.timing.ticks_per_report()),
        })
    }

    /// Dispatch until a restart is requested.
    pub fn run(&mut self) -> Restart {
        loop {
            if let Err(restart) = self.dispatch() {
                return restart;
            }
        }
    }

    /// One pass over all flags.
    ///
    /// # Errors
    ///
    /// Returns [`Restart`] as soon as a reset is seen, without touching
    /// any other state.
    pub fn dispatch(&mut self) -> Result<(), Restart> {
        self.check_reset()?;

        if let Stage::Running(aircraft) = &mut self.stage {
            if aircraft.fsm().user_access() == UserAccess::Enabled {
                aircraft.adjust_setpoints(&mut self.inputs);
            }
        }

        if self.flags.take(Flag::Tick) {
            self.on_tick();
        }

        self.service_mode_switch();

        if self.flags.take(Flag::QuadratureEdge) {
            let code = self.inputs.read_code();
            self.tracker.on_edge(code);
        }

        if let Stage::Running(aircraft) = &mut self.stage {
            if aircraft.fsm().is_searching_pivot() && self.flags.take(Flag::YawReference) {
                let effect = aircraft.capture_reference(&mut self.tracker, &mut self.outputs);
                self.on_effect(effect);
            }
        }

        self.check_reset()
    }

    fn check_reset(&mut self) -> Result<(), Restart> {
        if self.inputs.is_asserted() || self.flags.is_raised(Flag::ResetRequested) {
            info!("reset requested");
            return Err(Restart);
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        match &mut self.stage {
            Stage::Calibrating(buffer) => {
                while let Some(raw) = self.inputs.poll_sample() {
                    buffer.record_sample(raw);
                }
                match buffer.calibrate() {
                    Ok(reference) => {
                        let estimator =
                            AltitudeEstimator::new(core::mem::take(buffer), reference, &self.config.altitude);
                        self.stage = Stage::Running(Aircraft::new(estimator, &self.config));
                        // The switch may have been moved while the rig was booting
                        self.flags.clear(Flag::ModeSwitch);
                        info!("altitude reference {}", reference.raw());
                    }
                    Err(CalibrationError::Pending { received, capacity }) => {
                        debug!("calibrating {}/{}", received, capacity);
                    }
                }
            }
            Stage::Running(aircraft) => {
                while let Some(raw) = self.inputs.poll_sample() {
                    aircraft.record_sample(raw);
                }
                let effect = aircraft.control_tick(&self.tracker, &mut self.outputs);
                self.reporter.on_tick(&mut self.outputs, || aircraft.status());
                self.on_effect(effect);
            }
        }
    }

    fn service_mode_switch(&mut self) {
        let Stage::Running(aircraft) = &mut self.stage else {
            return;
        };
        if aircraft.fsm().is_transient() || !self.flags.take(Flag::ModeSwitch) {
            return;
        }

        self.delay.delay_us(self.config.timing.switch_settle_us);
        let position = self.inputs.position();
        debug!("mode switch {:?}", position);
        let effect = aircraft.on_switch(position, &mut self.outputs);
        self.on_effect(effect);
    }

    fn on_effect(&self, effect: FlightEffect) {
        if effect == FlightEffect::BeginPivotSearch {
            self.flags.clear(Flag::YawReference);
        }
    }

    #[inline]
    #[must_use]
    pub fn stage(&self) -> &Stage<N> {
        &self.stage
    }

    /// The aircraft, once calibrated.
    #[must_use]
    pub fn aircraft(&self) -> Option<&Aircraft<N>> {
        match &self.stage {
            Stage::Running(aircraft) => Some(aircraft),
            Stage::Calibrating(_) => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn tracker(&self) -> &YawTracker {
        &self.tracker
    }

    #[inline]
    #[must_use]
    pub fn reporter(&self) -> &StatusReporter {
        &self.reporter
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    /// Get a reference to the inputs.
    pub fn inputs(&self) -> &I {
        &self.inputs
    }

    /// Get a mutable reference to the inputs.
    pub fn inputs_mut(&mut self) -> &mut I {
        &mut self.inputs
    }

    /// Get a reference to the outputs.
    pub fn outputs(&self) -> &O {
        &self.outputs
    }

    /// Get a mutable reference to the outputs.
    pub fn outputs_mut(&mut self) -> &mut O {
        &mut self.outputs
    }

    /// Decompose the scheduler into its inputs, outputs and delay.
    pub fn into_parts(self) -> (I, O, D) {
        (self.inputs, self.outputs, self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONFIG;
    use crate::flight::{FlightState, Maneuver};
    use crate::input::{Button, SwitchPosition};
    use crate::output::Rotor;
    use crate::test_utils::{MockDelay, MockInputs, MockOutputs};
    use heli_proto::FlightPhase;

    type TestScheduler<'f> = Scheduler<'f, MockInputs, MockOutputs, MockDelay>;

    // Raw ADC counts for a few altitudes against a 2000 reference
    const GROUND: u16 = 2000;
    const HOVER: u16 = 1937; // 5 %
    const LOW: u16 = 1990; // 0 %
    const CRUISE: u16 = 1870; // 10 %

    fn scheduler(flags: &InterruptFlags) -> TestScheduler<'_> {
        Scheduler::new(
            DEFAULT_CONFIG,
            flags,
            MockInputs::new(),
            MockOutputs::new(),
            MockDelay::default(),
        )
        .unwrap()
    }

    /// Raise the tick flag with a fresh ring of `raw` samples and dispatch.
    fn tick(s: &mut TestScheduler<'_>, flags: &InterruptFlags, raw: u16) {
        s.inputs_mut().queue_samples(raw, ALTITUDE_BUFFER_DEPTH);
        flags.raise(Flag::Tick);
        s.dispatch().unwrap();
    }

    fn calibrated(flags: &InterruptFlags) -> TestScheduler<'_> {
        let mut s = scheduler(flags);
        tick(&mut s, flags, GROUND);
        assert!(s.aircraft().is_some());
        s
    }

    fn flip_switch(s: &mut TestScheduler<'_>, flags: &InterruptFlags, position: SwitchPosition) {
        s.inputs_mut().switch = position;
        flags.raise(Flag::ModeSwitch);
    }

    fn state(s: &TestScheduler<'_>) -> FlightState {
        s.aircraft().unwrap().fsm().state()
    }

    fn flying(flags: &InterruptFlags) -> TestScheduler<'_> {
        let mut s = calibrated(flags);
        flip_switch(&mut s, flags, SwitchPosition::Up);
        tick(&mut s, flags, HOVER);
        tick(&mut s, flags, HOVER);
        flags.raise(Flag::YawReference);
        s.dispatch().unwrap();
        assert_eq!(state(&s), FlightState::Flying);
        s
    }

    #[test]
    fn test_rejects_invalid_config() {
        let flags = InterruptFlags::new();
        let mut config = DEFAULT_CONFIG;
        config.control.gain_divisor = 0;
        let result: Result<TestScheduler<'_>, _> = Scheduler::new(
            config,
            &flags,
            MockInputs::new(),
            MockOutputs::new(),
            MockDelay::default(),
        );
        assert_eq!(result.err(), Some(ConfigError::Divisor));
    }

    #[test]
    fn test_calibration_waits_for_full_ring() {
        let flags = InterruptFlags::new();
        let mut s = scheduler(&flags);

        s.inputs_mut().queue_samples(GROUND, ALTITUDE_BUFFER_DEPTH - 1);
        flags.raise(Flag::Tick);
        s.dispatch().unwrap();
        assert!(s.aircraft().is_none());

        s.inputs_mut().queue_samples(GROUND, 1);
        flags.raise(Flag::Tick);
        s.dispatch().unwrap();
        let aircraft = s.aircraft().unwrap();
        assert_eq!(aircraft.estimator().reference().raw(), GROUND);
        assert_eq!(aircraft.fsm().state(), FlightState::Landed);
    }

    #[test]
    fn test_boot_switch_edge_is_discarded() {
        let flags = InterruptFlags::new();
        let mut s = scheduler(&flags);
        flip_switch(&mut s, &flags, SwitchPosition::Up);
        s.dispatch().unwrap();
        // Deferred while calibrating
        assert!(flags.is_raised(Flag::ModeSwitch));

        tick(&mut s, &flags, GROUND);
        assert!(!flags.is_raised(Flag::ModeSwitch));
        s.dispatch().unwrap();
        assert_eq!(state(&s), FlightState::Landed);
    }

    #[test]
    fn test_landed_ticks_keep_rotors_off() {
        let flags = InterruptFlags::new();
        let mut s = calibrated(&flags);
        for _ in 0..5 {
            tick(&mut s, &flags, GROUND);
        }
        assert!(s.outputs().duty_writes.is_empty());
        assert_eq!(s.aircraft().unwrap().status().phase, FlightPhase::Landed);
    }

    #[test]
    fn test_takeoff_sequence() {
        let flags = InterruptFlags::new();
        let mut s = calibrated(&flags);

        flip_switch(&mut s, &flags, SwitchPosition::Up);
        tick(&mut s, &flags, GROUND);
        assert_eq!(state(&s), FlightState::TakingOff(Maneuver::AwaitingAltitude));
        assert_eq!(s.aircraft().unwrap().control().altitude_setpoint, 5);
        assert_eq!(s.inputs().switch_reads, 1);
        // The switch is serviced after the tick, so nothing was driven yet
        assert!(s.outputs().duty_writes.is_empty());

        // A stale marker from before the search must not count
        flags.raise(Flag::YawReference);
        tick(&mut s, &flags, HOVER);
        assert!(s.outputs().last_duty(Rotor::Main).unwrap() >= 20);
        assert_eq!(state(&s), FlightState::TakingOff(Maneuver::SearchingPivot));
        assert!(!flags.is_raised(Flag::YawReference));

        // The search leads the yaw setpoint by the pivot step
        s.inputs_mut().code = 0b10;
        flags.raise(Flag::QuadratureEdge);
        tick(&mut s, &flags, HOVER);
        assert_eq!(s.tracker().position(), 1);
        tick(&mut s, &flags, HOVER);
        assert_eq!(s.aircraft().unwrap().control().yaw_setpoint, 11);

        flags.raise(Flag::YawReference);
        s.dispatch().unwrap();
        let aircraft = s.aircraft().unwrap();
        assert_eq!(aircraft.fsm().state(), FlightState::Flying);
        assert_eq!(aircraft.fsm().user_access(), UserAccess::Enabled);
        assert!(aircraft.fsm().landing_permitted());
        assert_eq!(aircraft.control().altitude_setpoint, 10);
        assert_eq!(aircraft.control().yaw_setpoint, 0);
        assert_eq!(s.tracker().position(), 0);
    }

    #[test]
    fn test_buttons_ignored_during_takeoff() {
        let flags = InterruptFlags::new();
        let mut s = calibrated(&flags);
        flip_switch(&mut s, &flags, SwitchPosition::Up);
        tick(&mut s, &flags, GROUND);

        s.inputs_mut().press(Button::Up);
        tick(&mut s, &flags, GROUND);
        assert_eq!(s.aircraft().unwrap().control().altitude_setpoint, 5);
        assert!(s.inputs().is_latched(Button::Up));
    }

    #[test]
    fn test_buttons_adjust_setpoints_in_flight() {
        let flags = InterruptFlags::new();
        let mut s = flying(&flags);
        s.inputs_mut().press(Button::Up);
        s.dispatch().unwrap();
        assert_eq!(s.aircraft().unwrap().control().altitude_setpoint, 20);

        s.inputs_mut().press(Button::Right);
        s.dispatch().unwrap();
        let control = s.aircraft().unwrap().control();
        assert_eq!(control.yaw_setpoint, 448 - 19);
        assert_eq!(control.yaw_increment, -15);
    }

    #[test]
    fn test_landing_sequence() {
        let flags = InterruptFlags::new();
        let mut s = flying(&flags);
        tick(&mut s, &flags, CRUISE);

        flip_switch(&mut s, &flags, SwitchPosition::Down);
        s.dispatch().unwrap();
        assert_eq!(state(&s), FlightState::Landing(Maneuver::AwaitingAltitude));
        assert_eq!(s.aircraft().unwrap().fsm().user_access(), UserAccess::Disabled);
        assert_eq!(s.aircraft().unwrap().status().phase, FlightPhase::Landing);

        tick(&mut s, &flags, CRUISE);
        assert_eq!(state(&s), FlightState::Landing(Maneuver::AwaitingAltitude));
        tick(&mut s, &flags, LOW);
        assert_eq!(state(&s), FlightState::Landing(Maneuver::SearchingPivot));

        flags.raise(Flag::YawReference);
        s.dispatch().unwrap();
        let aircraft = s.aircraft().unwrap();
        assert_eq!(aircraft.fsm().state(), FlightState::Landed);
        assert!(!aircraft.fsm().landing_permitted());
        assert_eq!(s.outputs().last_duty(Rotor::Main), Some(0));
        assert_eq!(s.outputs().last_duty(Rotor::Tail), Some(0));

        let writes = s.outputs().duty_writes.len();
        tick(&mut s, &flags, LOW);
        assert_eq!(s.outputs().duty_writes.len(), writes);
    }

    #[test]
    fn test_switch_down_without_permission_stops_rotors() {
        let flags = InterruptFlags::new();
        let mut s = calibrated(&flags);
        flip_switch(&mut s, &flags, SwitchPosition::Down);
        s.dispatch().unwrap();
        assert_eq!(state(&s), FlightState::Landed);
        assert_eq!(
            s.outputs().duty_writes,
            [(Rotor::Main, 0), (Rotor::Tail, 0)]
        );
    }

    #[test]
    fn test_switch_during_takeoff_is_deferred() {
        let flags = InterruptFlags::new();
        let mut s = calibrated(&flags);
        flip_switch(&mut s, &flags, SwitchPosition::Up);
        tick(&mut s, &flags, GROUND);

        flip_switch(&mut s, &flags, SwitchPosition::Down);
        tick(&mut s, &flags, GROUND);
        assert!(flags.is_raised(Flag::ModeSwitch));
        assert_eq!(s.inputs().switch_reads, 1);
        assert_eq!(state(&s), FlightState::TakingOff(Maneuver::AwaitingAltitude));

        // Finish the takeoff, the pending edge is then serviced and lands
        tick(&mut s, &flags, HOVER);
        flags.raise(Flag::YawReference);
        s.dispatch().unwrap();
        assert_eq!(state(&s), FlightState::Flying);
        s.dispatch().unwrap();
        assert_eq!(s.inputs().switch_reads, 2);
        assert!(matches!(state(&s), FlightState::Landing(_)));
    }

    #[test]
    fn test_settle_delay_before_reading_switch() {
        let flags = InterruptFlags::new();
        let mut s = calibrated(&flags);
        flip_switch(&mut s, &flags, SwitchPosition::Up);
        s.dispatch().unwrap();
        let (_, _, delay) = s.into_parts();
        assert_eq!(delay.total_ns, 50_000);
    }

    #[test]
    fn test_reset_ends_run_without_changes() {
        let flags = InterruptFlags::new();
        let mut s = flying(&flags);
        let before = *s.aircraft().unwrap().control();
        let writes = s.outputs().duty_writes.len();

        s.inputs_mut().reset = true;
        s.inputs_mut().press(Button::Up);
        s.inputs_mut().queue_samples(HOVER, ALTITUDE_BUFFER_DEPTH);
        flags.raise(Flag::Tick);
        flags.raise(Flag::QuadratureEdge);
        assert_eq!(s.dispatch(), Err(Restart));

        assert_eq!(*s.aircraft().unwrap().control(), before);
        assert_eq!(s.outputs().duty_writes.len(), writes);
        assert!(flags.is_raised(Flag::Tick));
        assert!(flags.is_raised(Flag::QuadratureEdge));
        assert!(s.inputs().is_latched(Button::Up));
        assert_eq!(s.run(), Restart);
    }

    fn assert_reset_leaves_state(s: &mut TestScheduler<'_>, flags: &InterruptFlags) {
        let before = *s.aircraft().unwrap().control();
        let phase = state(s);
        let position = s.tracker().position();

        s.inputs_mut().reset = true;
        s.inputs_mut().queue_samples(HOVER, ALTITUDE_BUFFER_DEPTH);
        flags.raise(Flag::Tick);
        flags.raise(Flag::YawReference);
        assert_eq!(s.dispatch(), Err(Restart));

        assert_eq!(*s.aircraft().unwrap().control(), before);
        assert_eq!(state(s), phase);
        assert_eq!(s.tracker().position(), position);
        assert!(flags.is_raised(Flag::Tick));
        assert!(flags.is_raised(Flag::YawReference));
    }

    #[test]
    fn test_reset_during_takeoff_pivot_search() {
        let flags = InterruptFlags::new();
        let mut s = calibrated(&flags);
        flip_switch(&mut s, &flags, SwitchPosition::Up);
        tick(&mut s, &flags, GROUND);
        tick(&mut s, &flags, HOVER);
        assert_eq!(state(&s), FlightState::TakingOff(Maneuver::SearchingPivot));

        assert_reset_leaves_state(&mut s, &flags);
    }

    #[test]
    fn test_reset_during_landing_descent() {
        let flags = InterruptFlags::new();
        let mut s = flying(&flags);
        tick(&mut s, &flags, CRUISE);
        flip_switch(&mut s, &flags, SwitchPosition::Down);
        s.dispatch().unwrap();
        assert_eq!(state(&s), FlightState::Landing(Maneuver::AwaitingAltitude));

        assert_reset_leaves_state(&mut s, &flags);
    }

    #[test]
    fn test_software_reset_request() {
        let flags = InterruptFlags::new();
        let mut s = scheduler(&flags);
        s.dispatch().unwrap();
        flags.raise(Flag::ResetRequested);
        assert_eq!(s.run(), Restart);
        assert!(s.aircraft().is_none());
    }

    #[test]
    fn test_telemetry_at_slow_rate() {
        let flags = InterruptFlags::new();
        let mut s = calibrated(&flags);
        for _ in 0..24 {
            tick(&mut s, &flags, GROUND);
        }
        let frames = &s.outputs().frames;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].phase, FlightPhase::Landed);
        assert_eq!(frames[0].altitude, 0);
    }

    #[test]
    fn test_telemetry_failure_does_not_stop_control() {
        let flags = InterruptFlags::new();
        let mut s = flying(&flags);
        s.outputs_mut().fail_telemetry = true;
        for _ in 0..12 {
            tick(&mut s, &flags, HOVER);
        }
        assert_eq!(s.reporter().dropped(), 1);
        assert_eq!(state(&s), FlightState::Flying);
    }
}
