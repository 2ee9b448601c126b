//! Mock collaborators for host tests.

extern crate std;

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use heli_proto::StatusFrame;

use crate::input::{
    Button, ButtonSource, ModeSwitchSource, QuadratureSource, ResetSource, SensorSource,
    SwitchPosition,
};
use crate::output::{Actuator, OutputError, Rotor, TelemetrySink};

/// Scripted rig inputs.
pub struct MockInputs {
    pub samples: VecDeque<u16>,
    pub code: u8,
    pub switch: SwitchPosition,
    pub reset: bool,
    latched: [bool; 4],
    pub switch_reads: usize,
}

impl MockInputs {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::new(),
            code: 0,
            switch: SwitchPosition::Down,
            reset: false,
            latched: [false; 4],
            switch_reads: 0,
        }
    }

    /// Queue `count` copies of one raw sample.
    pub fn queue_samples(&mut self, raw: u16, count: usize) {
        self.samples.extend(core::iter::repeat(raw).take(count));
    }

    pub fn press(&mut self, button: Button) {
        self.latched[button as usize] = true;
    }

    pub fn is_latched(&self, button: Button) -> bool {
        self.latched[button as usize]
    }
}

impl SensorSource for MockInputs {
    fn poll_sample(&mut self) -> Option<u16> {
        self.samples.pop_front()
    }
}

impl QuadratureSource for MockInputs {
    fn read_code(&mut self) -> u8 {
        self.code
    }
}

impl ButtonSource for MockInputs {
    fn take_press(&mut self, button: Button) -> bool {
        core::mem::take(&mut self.latched[button as usize])
    }
}

impl ModeSwitchSource for MockInputs {
    fn position(&mut self) -> SwitchPosition {
        self.switch_reads += 1;
        self.switch
    }
}

impl ResetSource for MockInputs {
    fn is_asserted(&mut self) -> bool {
        self.reset
    }
}

/// Recording rotor and telemetry outputs.
pub struct MockOutputs {
    pub duty_writes: Vec<(Rotor, u8)>,
    pub frames: Vec<StatusFrame>,
    pub fail_actuator: bool,
    pub fail_telemetry: bool,
}

impl MockOutputs {
    pub fn new() -> Self {
        Self {
            duty_writes: Vec::new(),
            frames: Vec::new(),
            fail_actuator: false,
            fail_telemetry: false,
        }
    }

    /// Most recent duty written to `rotor`.
    pub fn last_duty(&self, rotor: Rotor) -> Option<u8> {
        self.duty_writes
            .iter()
            .rev()
            .find(|(r, _)| *r == rotor)
            .map(|(_, duty)| *duty)
    }
}

impl Actuator for MockOutputs {
    fn set_duty(&mut self, rotor: Rotor, percent: u8) -> Result<(), OutputError> {
        if self.fail_actuator {
            return Err(OutputError::Io);
        }
        self.duty_writes.push((rotor, percent));
        Ok(())
    }
}

impl TelemetrySink for MockOutputs {
    fn send_status(&mut self, frame: &StatusFrame) -> Result<(), OutputError> {
        if self.fail_telemetry {
            return Err(OutputError::Dropped);
        }
        self.frames.push(*frame);
        Ok(())
    }
}

/// Delay that only adds up the requested time.
#[derive(Default)]
pub struct MockDelay {
    pub total_ns: u64,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}
