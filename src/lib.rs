//! Flight controller firmware for the tethered helicopter rig on RP2040.
//!
//! This crate provides the peripheral side of the rig: thin shims that
//! capture one sample, code or level and raise a flag, plus the PWM and UART
//! outputs. All flight logic lives in [`heli_core`].
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Samples the height sensor into a bounded queue
//! 2. Captures yaw encoder edges, the reference marker and the mode switch
//! 3. Debounces the four panel buttons into latched presses
//! 4. Runs the [`Scheduler`](heli_core::Scheduler) in the foreground task
//! 5. Drives both rotors through PWM and streams status records over UART
//!
//! # Hardware Configuration
//!
//! | Function     | GPIO | Description |
//! |--------------|------|-------------|
//! | UART0 TX     | 0    | Status telemetry (9600 baud, 8N1) |
//! | UART0 RX     | 1    | Unused |
//! | Yaw A        | 2    | Encoder channel A (pull-up) |
//! | Yaw B        | 3    | Encoder channel B (pull-up) |
//! | Yaw index    | 4    | Reference marker, active low |
//! | Mode switch  | 5    | High = take off, low = land |
//! | Reset        | 6    | Restart request, active low |
//! | Button Up    | 10   | Active low |
//! | Button Down  | 11   | Active low |
//! | Button Right | 12   | Active low |
//! | Button Left  | 13   | Active low |
//! | Main rotor   | 16   | PWM slice 0 A, 250 Hz |
//! | Tail rotor   | 18   | PWM slice 1 A, 250 Hz |
//! | Height       | 26   | ADC0 |
//!
//! # Architecture
//!
//! Peripheral tasks only capture and signal:
//!
//! - **Sampler Task**: reads ADC0 at the sample rate into [`SampleChannel`]
//! - **Tick Task**: raises [`Flag::Tick`](heli_core::Flag::Tick) at the control rate
//! - **Edge Tasks**: quadrature, reference marker and mode switch
//! - **Button Task**: polls and debounces the panel into [`ButtonLatch`]
//! - **Telemetry Task**: drains [`StatusChannel`] onto UART0
//!
//! The control task owns the scheduler and yields between dispatch passes.
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent reset)
//! - **`text-telemetry`**: Send the human-readable report line instead of the checksummed frame

#![no_std]

pub mod input;
pub mod output;

pub use input::{
    ButtonLatch, ButtonPanel, CodeLatch, EncoderPins, IndexPin, PanelInputs, SampleChannel,
    SampleQueue, Sampler, SwitchLevel, SwitchPin,
};
pub use output::{PanelOutputs, RotorPwm, StatusChannel, StatusQueue, TelemetryUart};

// Re-export core types for convenience
pub use heli_core::{Flag, InterruptFlags, RigConfig, Scheduler, DEFAULT_CONFIG};
