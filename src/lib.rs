//! # Teleop Input Library
//!
//! Keyboard, gamepad and SpaceMouse input for teleoperation stations.
//!
//! This library polls game controllers once per display frame, detects
//! button presses and axis changes, and dispatches named actions whose
//! bindings match. Keyboard events are dispatched as they arrive.

pub mod config;
pub mod devices;
pub mod error;
pub mod input;
pub mod joy;
