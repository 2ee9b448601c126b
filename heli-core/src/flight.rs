//! Flight mode state machine: takeoff, flight, landing.
//!
//! ```text
//!            switch up                    altitude >= hover
//!   Landed ------------> TakingOff(Await) ----------------> TakingOff(Pivot)
//!     ^                                                            |
//!     | reference found                                            | reference found
//!     |                                                            v
//!   Landing(Pivot) <---- Landing(Await) <------------------------ Flying
//!           altitude <= hover          switch down (permitted)
//! ```
//!
//! Takeoff and landing are transient: buttons and the mode switch are not
//! serviced until they finish. The machine only moves setpoints around; the
//! caller owns the rotors and acts on the returned [`FlightEffect`].

use heli_proto::FlightPhase;

use crate::config::FlightProfile;
use crate::control::ControlState;
use crate::input::SwitchPosition;
use crate::yaw::YawScale;

/// Progress within a takeoff or landing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Maneuver {
    /// Climbing or descending towards the hover altitude.
    AwaitingAltitude,
    /// Rotating slowly until the yaw reference marker is seen.
    SearchingPivot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlightState {
    Landed,
    TakingOff(Maneuver),
    Flying,
    Landing(Maneuver),
}

/// Whether the panel buttons adjust the setpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UserAccess {
    Enabled,
    Disabled,
}

/// Action the caller must take after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub enum FlightEffect {
    None,
    /// A pivot search started: discard any stale reference marker.
    BeginPivotSearch,
    /// Cut both rotors and clear the integrators.
    StopRotors,
}

/// Takeoff, flight and landing sequencing.
///
/// Holds the flight state, whether the panel buttons are live, and the
/// one-shot permission to land. Transitions edit the [`ControlState`]
/// setpoints and return a [`FlightEffect`] for the caller to carry out.
#[derive(Debug, Clone, Copy)]
pub struct FlightModeFsm {
    state: FlightState,
    access: UserAccess,
    landing_permitted: bool,
    profile: FlightProfile,
    pivot_step: i32,
}

impl FlightModeFsm {
    /// Start landed with user access disabled. `pivot_step` is how far
    /// ahead of the yaw reading the setpoint leads during a pivot search.
    #[must_use]
    pub const fn new(profile: FlightProfile, pivot_step: i32) -> Self {
        Self {
            state: FlightState::Landed,
            access: UserAccess::Disabled,
            landing_permitted: false,
            profile,
            pivot_step,
        }
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> FlightState {
        self.state
    }

    #[inline]
    #[must_use]
    pub const fn user_access(&self) -> UserAccess {
        self.access
    }

    #[inline]
    #[must_use]
    pub const fn landing_permitted(&self) -> bool {
        self.landing_permitted
    }

    #[must_use]
    pub const fn phase(&self) -> FlightPhase {
        match self.state {
            FlightState::Landed => FlightPhase::Landed,
            FlightState::TakingOff(_) => FlightPhase::TakingOff,
            FlightState::Flying => FlightPhase::Flying,
            FlightState::Landing(_) => FlightPhase::Landing,
        }
    }

    /// Takeoff or landing in progress.
    #[inline]
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self.state,
            FlightState::TakingOff(_) | FlightState::Landing(_)
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_searching_pivot(&self) -> bool {
        matches!(
            self.state,
            FlightState::TakingOff(Maneuver::SearchingPivot)
                | FlightState::Landing(Maneuver::SearchingPivot)
        )
    }

    /// The rotors are under closed-loop control.
    #[inline]
    #[must_use]
    pub const fn is_airborne(&self) -> bool {
        !matches!(self.state, FlightState::Landed)
    }

    fn enter(&mut self, state: FlightState) {
        if self.state != state {
            debug!("flight state {:?} -> {:?}", self.state, state);
        }
        self.state = state;
    }

    /// Handle a settled mode switch level.
    pub fn on_switch(&mut self, position: SwitchPosition, control: &mut ControlState) -> FlightEffect {
        match position {
            SwitchPosition::Up => {
                if self.state != FlightState::Landed {
                    return FlightEffect::None;
                }
                control.altitude_setpoint = self.profile.hover_altitude;
                self.enter(FlightState::TakingOff(Maneuver::AwaitingAltitude));
                self.check_threshold(control)
            }
            SwitchPosition::Down if !self.landing_permitted => {
                self.access = UserAccess::Disabled;
                self.enter(FlightState::Landed);
                FlightEffect::StopRotors
            }
            SwitchPosition::Down => {
                self.access = UserAccess::Disabled;
                control.altitude_setpoint = self.profile.hover_altitude;
                self.enter(FlightState::Landing(Maneuver::AwaitingAltitude));
                self.check_threshold(control)
            }
        }
    }

    /// Move to the pivot search once the hover altitude is reached.
    pub fn check_threshold(&mut self, control: &ControlState) -> FlightEffect {
        let reached = match self.state {
            FlightState::TakingOff(Maneuver::AwaitingAltitude) => {
                control.altitude >= control.altitude_setpoint
            }
            FlightState::Landing(Maneuver::AwaitingAltitude) => {
                control.altitude <= control.altitude_setpoint
            }
            _ => false,
        };
        if !reached {
            return FlightEffect::None;
        }

        let next = match self.state {
            FlightState::Landing(_) => FlightState::Landing(Maneuver::SearchingPivot),
            _ => FlightState::TakingOff(Maneuver::SearchingPivot),
        };
        self.enter(next);
        FlightEffect::BeginPivotSearch
    }

    /// While searching, lead the yaw setpoint ahead of the reading.
    pub fn update_setpoints(&self, control: &mut ControlState, scale: &YawScale) {
        if self.is_searching_pivot() {
            control.yaw_setpoint = scale.wrap(control.yaw + self.pivot_step);
        }
    }

    /// Finish the current maneuver after the reference marker was captured.
    pub fn on_reference_captured(&mut self, control: &mut ControlState) -> FlightEffect {
        match self.state {
            FlightState::TakingOff(Maneuver::SearchingPivot) => {
                control.altitude_setpoint = self.profile.cruise_altitude;
                self.access = UserAccess::Enabled;
                self.landing_permitted = true;
                self.enter(FlightState::Flying);
                FlightEffect::None
            }
            FlightState::Landing(Maneuver::SearchingPivot) => {
                self.landing_permitted = false;
                self.enter(FlightState::Landed);
                FlightEffect::StopRotors
            }
            _ => FlightEffect::None,
        }
    }
}
