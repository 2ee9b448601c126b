//! Input collaborator traits.
//!
//! The firmware implements these on top of its interrupt shims. All methods
//! are non-blocking: they report what the shim has already captured.

/// Logical push buttons on the rig's control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Raise the altitude setpoint.
    Up,
    /// Lower the altitude setpoint.
    Down,
    /// Turn clockwise (yaw setpoint decreases).
    Right,
    /// Turn counter-clockwise (yaw setpoint increases).
    Left,
}

impl Button {
    /// All buttons in polling priority order.
    pub const ALL: [Button; 4] = [Button::Up, Button::Down, Button::Right, Button::Left];
}

/// Position of the flight mode slider switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchPosition {
    /// Take off.
    Up,
    /// Land.
    Down,
}

/// Source of raw height sensor samples.
pub trait SensorSource {
    /// Next queued sample, if any.
    fn poll_sample(&mut self) -> Option<u16>;
}

/// Source of the yaw encoder's 2-bit channel code.
pub trait QuadratureSource {
    /// Code captured at the most recent edge (`A << 1 | B`).
    fn read_code(&mut self) -> u8;
}

/// Debounced button presses.
pub trait ButtonSource {
    /// Consume a latched press of `button`. Presses of other buttons stay
    /// latched.
    fn take_press(&mut self, button: Button) -> bool;
}

/// Mode switch level. Edges arrive through
/// [`Flag::ModeSwitch`](crate::flags::Flag::ModeSwitch).
pub trait ModeSwitchSource {
    fn position(&mut self) -> SwitchPosition;
}

/// Hardware reset request line.
pub trait ResetSource {
    fn is_asserted(&mut self) -> bool;
}

/// Every input the scheduler reads.
pub trait RigInputs:
    SensorSource + QuadratureSource + ButtonSource + ModeSwitchSource + ResetSource
{
}

impl<T> RigInputs for T where
    T: SensorSource + QuadratureSource + ButtonSource + ModeSwitchSource + ResetSource
{
}
