//! Rotor PWM on two RP2040 slices.

use embassy_rp::pwm::{Config, Pwm};
use fixed::types::U12F4;
use fixed_macro::fixed;
use heli_core::{Actuator, OutputError, Rotor};

/// System clock divider: 125 MHz / 125 = 1 MHz counter.
pub const PWM_DIVIDER: U12F4 = fixed!(125: U12F4);
/// Counter wrap for a 250 Hz period at 1 MHz.
pub const PWM_TOP: u16 = 3_999;

/// Compare value for `percent` of the period.
#[must_use]
pub const fn compare_for(percent: u8) -> u16 {
    ((PWM_TOP as u32 + 1) * percent as u32 / 100) as u16
}

/// Main and tail rotor outputs, both on channel A of their slice.
pub struct RotorPwm<'d> {
    main: Pwm<'d>,
    main_config: Config,
    tail: Pwm<'d>,
    tail_config: Config,
}

impl<'d> RotorPwm<'d> {
    /// Base configuration: 250 Hz, output low.
    #[must_use]
    pub fn config() -> Config {
        let mut config = Config::default();
        config.divider = PWM_DIVIDER;
        config.top = PWM_TOP;
        config.compare_a = 0;
        config
    }

    /// Both outputs must have been created with [`RotorPwm::config`].
    pub fn new(main: Pwm<'d>, tail: Pwm<'d>) -> Self {
        Self {
            main,
            main_config: Self::config(),
            tail,
            tail_config: Self::config(),
        }
    }
}

impl Actuator for RotorPwm<'_> {
    fn set_duty(&mut self, rotor: Rotor, percent: u8) -> Result<(), OutputError> {
        if percent > 100 {
            return Err(OutputError::OutOfRange);
        }
        let (pwm, config) = match rotor {
            Rotor::Main => (&mut self.main, &mut self.main_config),
            Rotor::Tail => (&mut self.tail, &mut self.tail_config),
        };
        config.compare_a = compare_for(percent);
        pwm.set_config(config);
        Ok(())
    }
}
