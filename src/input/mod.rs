//! # Input Module
//!
//! Frame-polled input handling for teleoperation.
//!
//! This module handles:
//! - Device samples and per-slot history
//! - Bindings, their evaluation and the contexts they produce
//! - Named actions with callbacks
//! - The [`InputPoller`](poller::InputPoller) state machine
//! - Host abstractions (controllers, events, frame scheduling)

pub mod action;
pub mod binding;
pub mod context;
pub mod frame_clock;
pub mod history;
pub mod host;
pub mod poller;
pub mod sample;

pub use action::Action;
pub use binding::{Binding, KeyEdge, KeyEvent};
pub use context::Context;
pub use poller::{InputPoller, PollerSettings, PollerState};
pub use sample::{ButtonSample, GamepadSample};
