//! Output collaborator traits and error types.

use heli_proto::StatusFrame;

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// Peripheral I/O error.
    Io,
    /// Queue full, the record was dropped.
    Dropped,
    /// Value outside what the peripheral accepts.
    OutOfRange,
}

impl core::fmt::Display for OutputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::Dropped => write!(f, "dropped"),
            Self::OutOfRange => write!(f, "value out of range"),
        }
    }
}

/// The two rotors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotor {
    Main,
    Tail,
}

/// PWM drive for the rotors.
pub trait Actuator {
    /// Apply a duty cycle in percent.
    fn set_duty(&mut self, rotor: Rotor, percent: u8) -> Result<(), OutputError>;
}

/// Destination for status records.
///
/// Implementations must not block; drop the record if the link is busy.
pub trait TelemetrySink {
    fn send_status(&mut self, frame: &StatusFrame) -> Result<(), OutputError>;
}

/// Every output the scheduler writes.
pub trait RigOutputs: Actuator + TelemetrySink {}

impl<T> RigOutputs for T where T: Actuator + TelemetrySink {}
