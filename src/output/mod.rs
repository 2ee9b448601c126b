//! Output shims: rotor PWM and the telemetry link.

mod pwm;
mod uart;

pub use pwm::{compare_for, RotorPwm, PWM_DIVIDER, PWM_TOP};
pub use uart::{
    LinkError, StatusChannel, StatusQueue, TelemetryUart, STATUS_QUEUE_DEPTH, TELEMETRY_BAUDRATE,
};

use heli_core::{Actuator, OutputError, Rotor, TelemetrySink};
use heli_proto::StatusFrame;

/// Everything the scheduler writes.
pub struct PanelOutputs<'d> {
    rotors: RotorPwm<'d>,
    status: StatusQueue,
}

impl<'d> PanelOutputs<'d> {
    pub fn new(rotors: RotorPwm<'d>, status: StatusQueue) -> Self {
        Self { rotors, status }
    }
}

impl Actuator for PanelOutputs<'_> {
    fn set_duty(&mut self, rotor: Rotor, percent: u8) -> Result<(), OutputError> {
        self.rotors.set_duty(rotor, percent)
    }
}

impl TelemetrySink for PanelOutputs<'_> {
    fn send_status(&mut self, frame: &StatusFrame) -> Result<(), OutputError> {
        self.status.send_status(frame)
    }
}
