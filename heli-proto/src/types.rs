//! Status record types: FlightPhase, StatusFrame.

use core::fmt;

/// Flight phase as reported to the ground terminal.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FlightPhase {
    /// On the ground, rotors stopped.
    #[default]
    Landed = 0,
    /// Climbing to hover height and searching for the yaw reference.
    TakingOff = 1,
    /// User setpoint control enabled.
    Flying = 2,
    /// Descending to hover height and searching for the yaw reference.
    Landing = 3,
}

impl FlightPhase {
    /// Wire digit for this phase.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decode a wire digit.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Landed),
            1 => Some(Self::TakingOff),
            2 => Some(Self::Flying),
            3 => Some(Self::Landing),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Landed => "LANDED",
            Self::TakingOff => "TAKEOFF",
            Self::Flying => "FLY",
            Self::Landing => "LANDING",
        }
    }
}

/// One status record, emitted at the telemetry rate.
///
/// Altitudes are percent of the calibrated range, yaw values are degrees
/// in [-180, 180), duties are percent of the PWM period.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFrame {
    pub altitude_setpoint: i16,
    pub altitude: i16,
    pub yaw_setpoint: i16,
    pub yaw: i16,
    pub main_duty: u8,
    pub tail_duty: u8,
    pub phase: FlightPhase,
}

/// Human-readable report line, as printed on the rig's serial terminal.
impl fmt::Display for StatusFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Alt Desired (%): {:3}, Alt Actual (%): {:3}, Yaw Desired (deg): {:4}, \
             Yaw Actual (deg): {:4}, M-Rot (%): {:2}, T-Rot (%): {:2}, Mode: {}",
            self.altitude_setpoint,
            self.altitude,
            self.yaw_setpoint,
            self.yaw,
            self.main_duty,
            self.tail_duty,
            self.phase.name(),
        )
    }
}
