//! # Dispatch Context
//!
//! Payload handed to an action's callback, describing the input that
//! triggered it.

use super::sample::{ButtonSample, GamepadSample};

/// Information about the binding that caused a dispatch.
///
/// Every dispatch builds a fresh context; callbacks receive it by reference
/// and may clone what they need to keep.
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    /// No input involved (programmatic trigger).
    None,

    /// A keyboard binding matched. Carries no payload.
    Keyboard,

    /// A `gamepad` binding matched on an ordinary controller.
    Gamepad {
        /// Enumeration slot of the device.
        slot: usize,
        /// Identifying string of the device.
        id: String,
        /// Copy of the current sample.
        sample: GamepadSample,
    },

    /// A button was newly pressed.
    GamepadButton {
        slot: usize,
        id: String,
        index: usize,
    },

    /// An axis changed value.
    GamepadAxis {
        slot: usize,
        id: String,
        index: usize,
        /// New axis value.
        value: f32,
    },

    /// A SpaceMouse reported a frame.
    ///
    /// The arrays are copies taken at dispatch time.
    Spacemouse {
        slot: usize,
        id: String,
        axes: Vec<f32>,
        buttons: Vec<ButtonSample>,
    },
}

impl Context {
    /// Slot of the device that triggered the dispatch, if any.
    #[must_use]
    pub fn slot(&self) -> Option<usize> {
        match self {
            Context::None | Context::Keyboard => None,
            Context::Gamepad { slot, .. }
            | Context::GamepadButton { slot, .. }
            | Context::GamepadAxis { slot, .. }
            | Context::Spacemouse { slot, .. } => Some(*slot),
        }
    }

    /// Identifying string of the triggering device, if any.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Context::None | Context::Keyboard => None,
            Context::Gamepad { id, .. }
            | Context::GamepadButton { id, .. }
            | Context::GamepadAxis { id, .. }
            | Context::Spacemouse { id, .. } => Some(id),
        }
    }
}
