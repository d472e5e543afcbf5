//! # Input Bindings
//!
//! A [`Binding`] is a condition over a single input source that an action
//! listens for. Evaluation is a pure function of the binding, the current
//! device sample and the previous one.
//!
//! ## Binding Kinds
//!
//! | Kind | Source | Matches when |
//! |------|--------|--------------|
//! | `keyboard` | key events | key code equal and edge (down/up) equal |
//! | `gamepad_button` | polled | button newly pressed (rising edge) |
//! | `gamepad_axis` | polled | axis value differs from previous frame |
//! | `gamepad` | polled | every frame of an ordinary controller |
//! | `spacemouse` | polled | every frame of a SpaceMouse |
//!
//! Buttons only dispatch on the rising edge: holding a button does not
//! repeat, and releasing it dispatches nothing.
//!
//! ## Configuration Format
//!
//! Bindings deserialize from internally tagged tables:
//!
//! ```
//! use teleop_input::input::binding::Binding;
//!
//! #[derive(serde::Deserialize)]
//! struct Doc { bindings: Vec<Binding> }
//!
//! let doc: Doc = toml::from_str(r#"
//! bindings = [
//!     { kind = "keyboard", code = "Space" },
//!     { kind = "gamepad_button", index = 0 },
//!     { kind = "spacemouse" },
//! ]
//! "#).unwrap();
//!
//! assert_eq!(doc.bindings[0], Binding::key_down("Space"));
//! assert_eq!(doc.bindings[1], Binding::GamepadButton { index: 0 });
//! assert_eq!(doc.bindings[2], Binding::Spacemouse);
//! ```

use serde::Deserialize;

use super::context::Context;
use super::sample::GamepadSample;

/// Direction of a keyboard transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEdge {
    Down,
    Up,
}

/// A key transition delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key code in web `KeyboardEvent.code` form (e.g. `"Space"`, `"KeyW"`).
    pub code: String,
    /// Whether the key went down or up.
    pub edge: KeyEdge,
}

impl KeyEvent {
    /// A key-down event for `code`.
    #[must_use]
    pub fn down(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            edge: KeyEdge::Down,
        }
    }

    /// A key-up event for `code`.
    #[must_use]
    pub fn up(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            edge: KeyEdge::Up,
        }
    }
}

fn default_on_key_down() -> bool {
    true
}

/// Condition over one input source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Binding {
    /// A key transition. `on_key_down = false` listens for the release.
    Keyboard {
        code: String,
        #[serde(default = "default_on_key_down")]
        on_key_down: bool,
    },
    /// Rising edge of a gamepad button.
    GamepadButton { index: usize },
    /// Any change of a gamepad axis.
    GamepadAxis { index: usize },
    /// Any frame of an ordinary (non-SpaceMouse) controller.
    Gamepad,
    /// Any frame of a SpaceMouse.
    Spacemouse,
}

/// Everything a binding may look at while a frame is processed for one device.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Enumeration slot of the device.
    pub slot: usize,
    /// Sample taken this frame.
    pub current: &'a GamepadSample,
    /// Sample from the preceding frame, if the device was seen then.
    pub previous: Option<&'a GamepadSample>,
    /// Whether the device is a SpaceMouse.
    pub specialized: bool,
    /// Analog value above which a button counts as pressed.
    pub button_threshold: f32,
}

impl<'a> FrameContext<'a> {
    fn id(&self) -> String {
        self.current.id.clone()
    }

    /// Previous value of axis `index`. `None` when the device has no
    /// previous sample; an axis missing from a previous sample reads as 0.0.
    fn previous_axis(&self, index: usize) -> Option<f32> {
        self.previous
            .map(|sample| sample.axis(index).unwrap_or(0.0))
    }

    fn previously_pressed(&self, index: usize) -> bool {
        self.previous
            .map(|sample| sample.button_pressed(index, self.button_threshold))
            .unwrap_or(false)
    }
}

impl Binding {
    /// Key-down binding for `code`.
    #[must_use]
    pub fn key_down(code: impl Into<String>) -> Self {
        Binding::Keyboard {
            code: code.into(),
            on_key_down: true,
        }
    }

    /// Key-up binding for `code`.
    #[must_use]
    pub fn key_up(code: impl Into<String>) -> Self {
        Binding::Keyboard {
            code: code.into(),
            on_key_down: false,
        }
    }

    /// Evaluates a polled binding against one device's frame.
    ///
    /// Returns the context to dispatch when the condition is newly true.
    /// Keyboard bindings never match here; they are driven by key events.
    #[must_use]
    pub fn evaluate(&self, frame: &FrameContext<'_>) -> Option<Context> {
        match self {
            Binding::Keyboard { .. } => None,

            Binding::Gamepad => (!frame.specialized).then(|| Context::Gamepad {
                slot: frame.slot,
                id: frame.id(),
                sample: frame.current.clone(),
            }),

            Binding::GamepadAxis { index } => {
                let value = frame.current.axis(*index)?;
                // First sight only seeds history
                let before = frame.previous_axis(*index)?;
                // Raw comparison; dead zones belong to the consumer
                (value != before).then(|| Context::GamepadAxis {
                    slot: frame.slot,
                    id: frame.id(),
                    index: *index,
                    value,
                })
            }

            Binding::GamepadButton { index } => {
                let pressed = frame.current.button_pressed(*index, frame.button_threshold);
                (pressed && !frame.previously_pressed(*index)).then(|| Context::GamepadButton {
                    slot: frame.slot,
                    id: frame.id(),
                    index: *index,
                })
            }

            Binding::Spacemouse => frame.specialized.then(|| Context::Spacemouse {
                slot: frame.slot,
                id: frame.id(),
                axes: frame.current.axes.clone(),
                buttons: frame.current.buttons.clone(),
            }),
        }
    }

    /// Returns true if this is a keyboard binding listening for `event`.
    #[must_use]
    pub fn matches_key(&self, event: &KeyEvent) -> bool {
        match self {
            Binding::Keyboard { code, on_key_down } => {
                let wanted = if *on_key_down { KeyEdge::Down } else { KeyEdge::Up };
                wanted == event.edge && *code == event.code
            }
            _ => false,
        }
    }
}
