//! # Device History
//!
//! Last processed sample per device slot, used for edge detection.
//!
//! Entries are created on first observation of a slot and removed when the
//! device disconnects (or the slot is observed empty), so a device that comes
//! back starts from "not pressed" again, and its axes only dispatch once a
//! previous sample exists.

use std::collections::HashMap;
use std::time::Duration;

use super::sample::GamepadSample;

/// Previous-frame samples keyed by device slot.
#[derive(Debug, Default, Clone)]
pub struct DeviceHistory {
    entries: HashMap<usize, GamepadSample>,
}

impl DeviceHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample recorded for `slot` on the preceding frame.
    #[must_use]
    pub fn previous(&self, slot: usize) -> Option<&GamepadSample> {
        self.entries.get(&slot)
    }

    /// Timestamp of the sample recorded for `slot`.
    #[must_use]
    pub fn timestamp(&self, slot: usize) -> Option<Duration> {
        self.entries.get(&slot).map(|sample| sample.timestamp)
    }

    /// Sample recorded for `slot`, only if it came from the device `id`.
    ///
    /// A slot reused by another device has no usable history.
    #[must_use]
    pub fn previous_for(&self, slot: usize, id: &str) -> Option<&GamepadSample> {
        self.previous(slot).filter(|sample| sample.id == id)
    }

    /// Replaces the entry for `slot` with this frame's sample.
    pub fn record(&mut self, slot: usize, sample: GamepadSample) {
        self.entries.insert(slot, sample);
    }

    /// Drops the entry for `slot`. Returns true if one existed.
    pub fn forget(&mut self, slot: usize) -> bool {
        self.entries.remove(&slot).is_some()
    }

    /// Drops the entry for `slot` if it was recorded for the device `id`.
    /// Returns true if one was removed.
    pub fn forget_device(&mut self, slot: usize, id: &str) -> bool {
        if self.previous_for(slot, id).is_none() {
            return false;
        }
        self.forget(slot)
    }

    /// Number of slots with history.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no slot has history.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
