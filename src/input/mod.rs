//! Input shims and the scheduler's view of them.

mod adc;
mod buttons;
mod quadrature;
mod switches;

pub use adc::{SampleChannel, SampleQueue, Sampler, SAMPLE_QUEUE_DEPTH};
pub use buttons::{ButtonLatch, ButtonPanel, DEBOUNCE_POLLS};
pub use quadrature::{CodeLatch, EncoderPins, IndexPin};
pub use switches::{SwitchLevel, SwitchPin};

use embassy_rp::gpio::Input;
use heli_core::{
    Button, ButtonSource, ModeSwitchSource, QuadratureSource, ResetSource, SensorSource,
    SwitchPosition,
};

/// Everything the scheduler reads, gathered from the shims' shared state.
pub struct PanelInputs<'d> {
    samples: SampleQueue,
    code: &'static CodeLatch,
    switch: &'static SwitchLevel,
    buttons: &'static ButtonLatch,
    reset: Input<'d>,
}

impl<'d> PanelInputs<'d> {
    pub fn new(
        samples: SampleQueue,
        code: &'static CodeLatch,
        switch: &'static SwitchLevel,
        buttons: &'static ButtonLatch,
        reset: Input<'d>,
    ) -> Self {
        Self {
            samples,
            code,
            switch,
            buttons,
            reset,
        }
    }
}

impl SensorSource for PanelInputs<'_> {
    fn poll_sample(&mut self) -> Option<u16> {
        self.samples.poll_sample()
    }
}

impl QuadratureSource for PanelInputs<'_> {
    fn read_code(&mut self) -> u8 {
        self.code.load()
    }
}

impl ButtonSource for PanelInputs<'_> {
    fn take_press(&mut self, button: Button) -> bool {
        self.buttons.take(button)
    }
}

impl ModeSwitchSource for PanelInputs<'_> {
    fn position(&mut self) -> SwitchPosition {
        self.switch.load()
    }
}

impl ResetSource for PanelInputs<'_> {
    fn is_asserted(&mut self) -> bool {
        self.reset.is_low()
    }
}
