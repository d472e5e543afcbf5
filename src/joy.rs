//! # Joy Messages
//!
//! Converts controller samples into joystick messages and publishes them as
//! JSON Lines.
//!
//! ## Message Format
//!
//! ```text
//! {"header":{"stamp":{"sec":1718000000,"nanosec":250000000},"frame_id":"teleop"},
//!  "axes":[0.0,-0.5],"buttons":[1,0]}
//! ```
//!
//! Buttons are `1` when pressed under the usual press rule (digital flag, or
//! analog value above the threshold) and `0` otherwise.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::input::context::Context;
use crate::input::sample::{ButtonSample, GamepadSample};

/// Wall-clock time split into seconds and nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stamp {
    pub sec: i64,
    pub nanosec: u32,
}

impl Stamp {
    /// Stamp for the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self::from(Utc::now())
    }
}

impl From<DateTime<Utc>> for Stamp {
    fn from(time: DateTime<Utc>) -> Self {
        Self {
            sec: time.timestamp(),
            nanosec: time.timestamp_subsec_nanos(),
        }
    }
}

/// Message header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoyHeader {
    pub stamp: Stamp,
    pub frame_id: String,
}

/// Joystick state message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoyMessage {
    pub header: JoyHeader,
    pub axes: Vec<f32>,
    pub buttons: Vec<i32>,
}

impl JoyMessage {
    /// Builds a message from raw axes and buttons with an explicit stamp.
    #[must_use]
    pub fn new(
        stamp: Stamp,
        frame_id: impl Into<String>,
        axes: &[f32],
        buttons: &[ButtonSample],
        threshold: f32,
    ) -> Self {
        Self {
            header: JoyHeader {
                stamp,
                frame_id: frame_id.into(),
            },
            axes: axes.to_vec(),
            buttons: buttons
                .iter()
                .map(|button| i32::from(button.is_pressed(threshold)))
                .collect(),
        }
    }

    /// Builds a message from a controller sample, stamped now.
    ///
    /// # Examples
    ///
    /// ```
    /// use teleop_input::joy::JoyMessage;
    /// use teleop_input::input::sample::{ButtonSample, GamepadSample};
    /// use std::time::Duration;
    ///
    /// let sample = GamepadSample::new(
    ///     "Pad",
    ///     vec![0.25],
    ///     vec![ButtonSample::Value(0.5), ButtonSample::Value(0.05)],
    ///     Duration::ZERO,
    /// );
    /// let msg = JoyMessage::from_sample(&sample, "teleop", 0.1);
    /// assert_eq!(msg.buttons, vec![1, 0]);
    /// assert_eq!(msg.header.frame_id, "teleop");
    /// ```
    #[must_use]
    pub fn from_sample(sample: &GamepadSample, frame_id: &str, threshold: f32) -> Self {
        Self::new(Stamp::now(), frame_id, &sample.axes, &sample.buttons, threshold)
    }

    /// Builds a message from a dispatch context.
    ///
    /// Only `Gamepad` and `Spacemouse` contexts carry a full device state;
    /// every other context yields `None`.
    #[must_use]
    pub fn from_context(context: &Context, frame_id: &str, threshold: f32) -> Option<Self> {
        match context {
            Context::Gamepad { sample, .. } => Some(Self::from_sample(sample, frame_id, threshold)),
            Context::Spacemouse { axes, buttons, .. } => {
                Some(Self::new(Stamp::now(), frame_id, axes, buttons, threshold))
            }
            _ => None,
        }
    }
}

/// Writes [`JoyMessage`]s as JSON Lines.
pub struct JoyPublisher<W: Write> {
    writer: W,
    frame_id: String,
    threshold: f32,
    published: u64,
}

impl<W: Write> JoyPublisher<W> {
    /// Creates a publisher writing to `writer`.
    pub fn new(writer: W, frame_id: impl Into<String>, threshold: f32) -> Self {
        Self {
            writer,
            frame_id: frame_id.into(),
            threshold,
            published: 0,
        }
    }

    /// Number of messages written so far.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Writes one message followed by a newline, then flushes.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` or `Io` if the message cannot be written.
    pub fn publish(&mut self, message: &JoyMessage) -> Result<()> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.published += 1;
        Ok(())
    }

    /// Publishes the state carried by `context`.
    ///
    /// Returns `Ok(false)` without writing for contexts that carry no device
    /// state.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` or `Io` if the message cannot be written.
    pub fn publish_context(&mut self, context: &Context) -> Result<bool> {
        match JoyMessage::from_context(context, &self.frame_id, self.threshold) {
            Some(message) => {
                self.publish(&message)?;
                Ok(true)
            }
            None => {
                debug!("No joystick state in {:?}, nothing published", context);
                Ok(false)
            }
        }
    }

    /// Consumes the publisher, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
