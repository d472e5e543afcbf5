//! # Device Samples
//!
//! Raw per-frame readings of a game controller, independent of the backend
//! that produced them.
//!
//! A [`GamepadSample`] is an owned snapshot: axes as floating point values,
//! buttons as [`ButtonSample`]s, plus the identifying string of the device and
//! a monotonic timestamp.
//!
//! ## Usage
//!
//! ```
//! use teleop_input::input::sample::{ButtonSample, GamepadSample};
//! use std::time::Duration;
//!
//! let sample = GamepadSample::new(
//!     "Xbox Wireless Controller",
//!     vec![0.0, 0.5],
//!     vec![ButtonSample::pressed(), ButtonSample::Value(0.0)],
//!     Duration::from_millis(16),
//! );
//!
//! assert_eq!(sample.axis(1), Some(0.5));
//! assert!(sample.button_pressed(0, 0.1));
//! assert!(!sample.button_pressed(1, 0.1));
//! assert!(!sample.button_pressed(7, 0.1)); // out of range
//! ```

use std::time::Duration;

/// Default analog value above which a button counts as pressed.
pub const DEFAULT_BUTTON_THRESHOLD: f32 = 0.1;

/// A single button reading.
///
/// Hosts report buttons either as a bare intensity or as a digital flag
/// paired with an analog value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ButtonSample {
    /// Intensity only (0.0 = released, 1.0 = fully pressed).
    Value(f32),
    /// Digital flag and analog value.
    State {
        /// Whether the host considers the button pressed.
        pressed: bool,
        /// Analog value (0.0 to 1.0).
        value: f32,
    },
}

impl ButtonSample {
    /// A fully pressed digital button.
    #[must_use]
    pub fn pressed() -> Self {
        ButtonSample::State {
            pressed: true,
            value: 1.0,
        }
    }

    /// A released digital button.
    #[must_use]
    pub fn released() -> Self {
        ButtonSample::State {
            pressed: false,
            value: 0.0,
        }
    }

    /// Returns true when the flag is set or the value exceeds `threshold`.
    #[must_use]
    pub fn is_pressed(&self, threshold: f32) -> bool {
        match *self {
            ButtonSample::Value(value) => value > threshold,
            ButtonSample::State { pressed, value } => pressed || value > threshold,
        }
    }
}

/// Snapshot of one game controller at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct GamepadSample {
    /// Identifying string reported by the host (product name).
    pub id: String,
    /// Axis values, in host order.
    pub axes: Vec<f32>,
    /// Button readings, in host order.
    pub buttons: Vec<ButtonSample>,
    /// Monotonic capture time.
    pub timestamp: Duration,
}

impl GamepadSample {
    /// Creates a new sample.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        axes: Vec<f32>,
        buttons: Vec<ButtonSample>,
        timestamp: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            axes,
            buttons,
            timestamp,
        }
    }

    /// Returns the value of axis `index`, or `None` if the device has no such axis.
    #[must_use]
    pub fn axis(&self, index: usize) -> Option<f32> {
        self.axes.get(index).copied()
    }

    /// Returns the reading of button `index`, if present.
    #[must_use]
    pub fn button(&self, index: usize) -> Option<ButtonSample> {
        self.buttons.get(index).copied()
    }

    /// Returns true if button `index` exists and is pressed.
    ///
    /// A button absent from the sample counts as not pressed.
    #[must_use]
    pub fn button_pressed(&self, index: usize, threshold: f32) -> bool {
        self.button(index)
            .map(|button| button.is_pressed(threshold))
            .unwrap_or(false)
    }

    /// Returns true if the device reports no axes and no buttons.
    ///
    /// Such devices are placeholders and never take part in binding evaluation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty() && self.buttons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(axes: Vec<f32>, buttons: Vec<ButtonSample>) -> GamepadSample {
        GamepadSample::new("Test Pad", axes, buttons, Duration::ZERO)
    }

    // ==================== ButtonSample Tests ====================

    #[test]
    fn test_value_button_uses_threshold() {
        assert!(!ButtonSample::Value(0.0).is_pressed(DEFAULT_BUTTON_THRESHOLD));
        assert!(!ButtonSample::Value(0.1).is_pressed(DEFAULT_BUTTON_THRESHOLD));
        assert!(ButtonSample::Value(0.11).is_pressed(DEFAULT_BUTTON_THRESHOLD));
        assert!(ButtonSample::Value(1.0).is_pressed(DEFAULT_BUTTON_THRESHOLD));
    }

    #[test]
    fn test_state_button_flag_wins() {
        let flagged = ButtonSample::State {
            pressed: true,
            value: 0.0,
        };
        assert!(flagged.is_pressed(DEFAULT_BUTTON_THRESHOLD));

        let analog = ButtonSample::State {
            pressed: false,
            value: 0.8,
        };
        assert!(analog.is_pressed(DEFAULT_BUTTON_THRESHOLD));

        assert!(!ButtonSample::released().is_pressed(DEFAULT_BUTTON_THRESHOLD));
    }

    // ==================== GamepadSample Tests ====================

    #[test]
    fn test_axis_lookup() {
        let s = sample(vec![0.25, -1.0], vec![]);
        assert_eq!(s.axis(0), Some(0.25));
        assert_eq!(s.axis(1), Some(-1.0));
        assert_eq!(s.axis(2), None);
    }

    #[test]
    fn test_out_of_range_button_not_pressed() {
        let s = sample(vec![], vec![ButtonSample::pressed()]);
        assert!(s.button_pressed(0, DEFAULT_BUTTON_THRESHOLD));
        assert!(!s.button_pressed(1, DEFAULT_BUTTON_THRESHOLD));
        assert!(!s.button_pressed(usize::MAX, DEFAULT_BUTTON_THRESHOLD));
    }

    #[test]
    fn test_is_empty() {
        assert!(sample(vec![], vec![]).is_empty());
        assert!(!sample(vec![0.0], vec![]).is_empty());
        assert!(!sample(vec![], vec![ButtonSample::released()]).is_empty());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = sample(vec![0.1], vec![ButtonSample::released()]);
        let copy = original.clone();

        original.axes[0] = 0.9;
        original.buttons[0] = ButtonSample::pressed();

        assert_eq!(copy.axes[0], 0.1);
        assert_eq!(copy.buttons[0], ButtonSample::released());
    }
}
