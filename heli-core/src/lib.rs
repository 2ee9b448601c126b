//! Platform-agnostic flight control core for a tethered two-rotor helicopter.
//!
//! This crate holds everything that does not touch a peripheral: altitude
//! and yaw estimation, the two PID loops, the flight mode state machine and
//! the flag-driven dispatcher that ties them together. It is `no_std` with no
//! heap allocation, and runs unchanged on the rig and on the host.
//!
//! # Overview
//!
//! - [`altitude`]: sample ring, calibration and altitude in percent
//! - [`yaw`]: quadrature decoding and degree conversion
//! - [`control`]: dual PID with gravity and coupling feed-forward
//! - [`flight`]: takeoff / flight / landing sequencing
//! - [`aircraft`]: the calibrated aggregate the above live in
//! - [`flags`]: sticky flags raised by interrupt shims
//! - [`input`], [`output`]: traits the firmware implements
//! - [`scheduler`]: the foreground dispatch loop
//! - [`config`]: rig parameters ([`DEFAULT_CONFIG`])
//!
//! # Example
//!
//! ```rust
//! use heli_core::{InterruptFlags, Flag, RigConfig, DEFAULT_CONFIG};
//!
//! static FLAGS: InterruptFlags = InterruptFlags::new();
//!
//! // Interrupt side
//! FLAGS.raise(Flag::Tick);
//!
//! // Dispatcher side
//! assert!(FLAGS.take(Flag::Tick));
//! assert!(!FLAGS.take(Flag::Tick));
//!
//! let config: RigConfig = DEFAULT_CONFIG;
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through defmt and derive `defmt::Format`
//! - **`log`**: Log through the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod macros;

pub mod aircraft;
pub mod altitude;
pub mod config;
pub mod control;
pub mod flags;
pub mod flight;
pub mod input;
pub mod output;
pub mod scheduler;
pub mod telemetry;
pub mod yaw;

#[cfg(test)]
mod test_utils;

// Re-export main types at crate root
pub use aircraft::Aircraft;
pub use altitude::{
    AltitudeBuffer, AltitudeEstimator, AltitudeReference, CalibrationError, ALTITUDE_BUFFER_DEPTH,
};
pub use config::{ConfigError, RigConfig, DEFAULT_CONFIG};
pub use control::{ControlEngine, ControlState, DutyCommand, RotorChannel};
pub use flags::{Flag, InterruptFlags};
pub use flight::{FlightEffect, FlightModeFsm, FlightState, Maneuver, UserAccess};
pub use heli_proto::{FlightPhase, StatusFrame};
pub use input::{
    Button, ButtonSource, ModeSwitchSource, QuadratureSource, ResetSource, RigInputs,
    SensorSource, SwitchPosition,
};
pub use output::{Actuator, OutputError, RigOutputs, Rotor, TelemetrySink};
pub use scheduler::{Restart, Scheduler, Stage};
pub use telemetry::{SlowTick, StatusReporter};
pub use yaw::{YawScale, YawTracker};
