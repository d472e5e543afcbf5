//! # Actions
//!
//! An [`Action`] is a named unit of behavior: one or more bindings and a
//! callback invoked whenever any of them matches.

use std::fmt;

use tracing::trace;

use super::binding::{Binding, FrameContext, KeyEvent};
use super::context::Context;
use crate::error::{Result, TeleopInputError};

/// Callback invoked with the context of the matching binding.
pub type Perform = Box<dyn FnMut(&Context) + Send>;

/// Named set of bindings with a callback.
///
/// # Examples
///
/// ```
/// use teleop_input::input::action::Action;
/// use teleop_input::input::binding::Binding;
///
/// let action = Action::new("estop", vec![Binding::key_down("Space")], |_ctx| {
///     println!("emergency stop");
/// })?;
/// assert_eq!(action.name(), "estop");
/// # Ok::<(), teleop_input::error::TeleopInputError>(())
/// ```
pub struct Action {
    name: String,
    bindings: Vec<Binding>,
    perform: Perform,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

impl Action {
    /// Creates an action.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAction` if `name` is empty or `bindings` is empty.
    pub fn new<F>(name: impl Into<String>, bindings: Vec<Binding>, perform: F) -> Result<Self>
    where
        F: FnMut(&Context) + Send + 'static,
    {
        let name = name.into();

        if name.is_empty() {
            return Err(TeleopInputError::InvalidAction(
                "action name cannot be empty".to_string(),
            ));
        }

        if bindings.is_empty() {
            return Err(TeleopInputError::InvalidAction(format!(
                "action '{}' has no bindings",
                name
            )));
        }

        Ok(Self {
            name,
            bindings,
            perform: Box::new(perform),
        })
    }

    /// Name of the action.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bindings of the action, in evaluation order.
    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Invokes the callback directly.
    pub fn perform(&mut self, context: &Context) {
        (self.perform)(context);
    }

    /// Evaluates every binding against one device's frame and performs for
    /// each match. Returns the number of dispatches.
    pub(crate) fn dispatch_frame(&mut self, frame: &FrameContext<'_>) -> usize {
        let mut dispatched = 0;

        for binding in &self.bindings {
            if let Some(context) = binding.evaluate(frame) {
                trace!("Action '{}' matched {:?} on slot {}", self.name, binding, frame.slot);
                (self.perform)(&context);
                dispatched += 1;
            }
        }

        dispatched
    }

    /// Performs once per keyboard binding listening for `event`.
    pub(crate) fn dispatch_key(&mut self, event: &KeyEvent) -> usize {
        let mut dispatched = 0;

        for binding in &self.bindings {
            if binding.matches_key(event) {
                trace!("Action '{}' matched key {:?}", self.name, event);
                (self.perform)(&Context::Keyboard);
                dispatched += 1;
            }
        }

        dispatched
    }
}
