//! Tracked input identities

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Inputs on the kit that carry their own debounce history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InputName {
    LeftButtonDown,
    RightButtonDown,
    LeftSwitchLeft,
    RightSwitchLeft,
    LeftSwitchRight,
    RightSwitchRight,
    /// Whole keypad, usually as a bit-vector of pressed keys
    Keypad,
    /// Expansion input
    InputX,
    /// Expansion input
    InputY,
}

impl InputName {
    /// Number of tracked inputs
    pub const COUNT: usize = 9;

    /// Every tracked input, in index order
    pub const ALL: [InputName; Self::COUNT] = [
        InputName::LeftButtonDown,
        InputName::RightButtonDown,
        InputName::LeftSwitchLeft,
        InputName::RightSwitchLeft,
        InputName::LeftSwitchRight,
        InputName::RightSwitchRight,
        InputName::Keypad,
        InputName::InputX,
        InputName::InputY,
    ];

    /// Slot of this input in per-input tables
    pub const fn index(self) -> usize {
        self as usize
    }
}
