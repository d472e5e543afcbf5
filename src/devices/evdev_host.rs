//! # Evdev Gamepad Host
//!
//! [`GamepadHost`] implementation over Linux evdev.
//!
//! ## Detection
//!
//! A device is a gamepad when it reports joystick or gamepad buttons
//! (`BTN_0..BTN_9`, `BTN_JOYSTICK..BTN_THUMBR`) and is not a pointer
//! (`BTN_LEFT`, `BTN_TOUCH`). SpaceMice report `BTN_0`/`BTN_1` and are
//! picked up the same way; the poller tells them apart by name.
//!
//! ## Slots
//!
//! Devices are assigned slots in path order. A slot is kept while its device
//! stays connected and is reused by the next device plugged in after it
//! disconnects, so the slot list may be sparse.
//!
//! ## Sampling
//!
//! - Axes: absolute axes below `ABS_MISC`, normalized to `[-1.0, 1.0]`
//! - Buttons: supported button keys in code order (including the d-pad
//!   buttons), as `ButtonSample::State`

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use evdev::{AbsoluteAxisType, AttributeSetRef, Device, Key};
use tracing::{debug, info, warn};

use super::event_device_paths;
use crate::error::Result;
use crate::input::host::{DeviceInfo, GamepadHost, HostEvent, HostEvents};
use crate::input::sample::{ButtonSample, GamepadSample};

/// Default interval between hot-plug rescans
pub const DEFAULT_RESCAN_INTERVAL: Duration = Duration::from_millis(1000);

/// Normalizes a raw absolute axis value to `[-1.0, 1.0]` over its range.
///
/// A degenerate range yields `0.0`.
///
/// # Examples
///
/// ```
/// use teleop_input::devices::evdev_host::normalize_axis;
///
/// assert_eq!(normalize_axis(0, 0, 255), -1.0);
/// assert_eq!(normalize_axis(255, 0, 255), 1.0);
/// assert_eq!(normalize_axis(0, -1, 1), 0.0);
/// ```
#[must_use]
pub fn normalize_axis(value: i32, minimum: i32, maximum: i32) -> f32 {
    if maximum <= minimum {
        return 0.0;
    }

    let span = f64::from(maximum) - f64::from(minimum);
    let normalized = (f64::from(value) - f64::from(minimum)) / span * 2.0 - 1.0;
    normalized.clamp(-1.0, 1.0) as f32
}

/// `BTN_0..BTN_9` and `BTN_JOYSTICK..BTN_THUMBR`
fn is_joystick_button(key: Key) -> bool {
    matches!(key.code(), 0x100..=0x109 | 0x120..=0x13e)
}

/// Joystick buttons plus `BTN_DPAD_UP..BTN_DPAD_RIGHT`
fn is_sampled_button(key: Key) -> bool {
    is_joystick_button(key) || matches!(key.code(), 0x220..=0x223)
}

/// Returns true if a device with these keys should be sampled as a gamepad.
#[must_use]
pub fn is_gamepad_like(keys: &AttributeSetRef<Key>) -> bool {
    let pointer = keys.contains(Key::BTN_LEFT) || keys.contains(Key::BTN_TOUCH);
    !pointer && keys.iter().any(is_joystick_button)
}

/// Button keys sampled for a device, in code order.
#[must_use]
pub fn sampled_buttons(keys: &AttributeSetRef<Key>) -> Vec<Key> {
    keys.iter().filter(|key| is_sampled_button(*key)).collect()
}

/// Absolute axes sampled for a device, in code order.
#[must_use]
pub fn sampled_axes(axes: &AttributeSetRef<AbsoluteAxisType>) -> Vec<AbsoluteAxisType> {
    axes.iter()
        .filter(|axis| axis.0 < AbsoluteAxisType::ABS_MISC.0)
        .collect()
}

/// First free slot, or a new one past the end.
fn free_slot<T>(slots: &[Option<T>]) -> usize {
    slots
        .iter()
        .position(Option::is_none)
        .unwrap_or(slots.len())
}

/// An open controller occupying a slot.
struct OpenGamepad {
    device: Device,
    path: PathBuf,
    id: String,
    axes: Vec<AbsoluteAxisType>,
    buttons: Vec<Key>,
}

impl OpenGamepad {
    /// Opens `path` if it is a gamepad. Returns `Ok(None)` for other devices.
    fn open(path: &Path) -> io::Result<Option<Self>> {
        let device = Device::open(path)?;

        let Some(keys) = device.supported_keys() else {
            return Ok(None);
        };
        if !is_gamepad_like(keys) {
            return Ok(None);
        }

        let buttons = sampled_buttons(keys);
        let axes = device
            .supported_absolute_axes()
            .map(sampled_axes)
            .unwrap_or_default();

        let input_id = device.input_id();
        let id = format!(
            "{} (Vendor: {:04x} Product: {:04x})",
            device.name().unwrap_or("Unknown Device"),
            input_id.vendor(),
            input_id.product()
        );

        Ok(Some(Self {
            device,
            path: path.to_path_buf(),
            id,
            axes,
            buttons,
        }))
    }

    fn info(&self, slot: usize) -> DeviceInfo {
        DeviceInfo {
            slot,
            id: self.id.clone(),
            path: self.path.display().to_string(),
        }
    }

    fn sample(&self, timestamp: Duration) -> io::Result<GamepadSample> {
        let axes = if self.axes.is_empty() {
            Vec::new()
        } else {
            let state = self.device.get_abs_state()?;
            self.axes
                .iter()
                .map(|axis| {
                    let info = &state[usize::from(axis.0)];
                    normalize_axis(info.value, info.minimum, info.maximum)
                })
                .collect()
        };

        let keys = self.device.get_key_state()?;
        let buttons = self
            .buttons
            .iter()
            .map(|key| {
                if keys.contains(*key) {
                    ButtonSample::pressed()
                } else {
                    ButtonSample::released()
                }
            })
            .collect();

        Ok(GamepadSample::new(self.id.clone(), axes, buttons, timestamp))
    }
}

/// Gamepad slots backed by evdev devices under an input directory.
pub struct EvdevGamepads {
    input_dir: PathBuf,
    rescan_interval: Duration,
    last_scan: Option<Instant>,
    created: Instant,
    slots: Vec<Option<OpenGamepad>>,
    skipped: HashSet<PathBuf>,
    events: HostEvents,
}

impl EvdevGamepads {
    /// Creates a host scanning `input_dir`. Devices are opened on first use.
    #[must_use]
    pub fn new(input_dir: impl Into<PathBuf>, events: HostEvents) -> Self {
        Self {
            input_dir: input_dir.into(),
            rescan_interval: DEFAULT_RESCAN_INTERVAL,
            last_scan: None,
            created: Instant::now(),
            slots: Vec::new(),
            skipped: HashSet::new(),
            events,
        }
    }

    /// Sets the minimum time between hot-plug rescans.
    #[must_use]
    pub fn with_rescan_interval(mut self, interval: Duration) -> Self {
        self.rescan_interval = interval;
        self
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn connected(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    fn rescan_due(&self) -> bool {
        self.last_scan
            .map(|at| at.elapsed() >= self.rescan_interval)
            .unwrap_or(true)
    }

    fn disconnect(&mut self, slot: usize) {
        if let Some(gamepad) = self.slots.get_mut(slot).and_then(Option::take) {
            info!("Gamepad removed from slot {}: {}", slot, gamepad.id);
            self.events
                .emit(HostEvent::GamepadDisconnected(gamepad.info(slot)));
        }
    }

    fn rescan(&mut self) {
        self.last_scan = Some(Instant::now());

        let paths = match event_device_paths(&self.input_dir) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Gamepad rescan failed: {}", e);
                return;
            }
        };
        let present: HashSet<&PathBuf> = paths.iter().collect();

        // Devices whose node vanished
        let gone: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| match entry {
                Some(gamepad) if !present.contains(&gamepad.path) => Some(slot),
                _ => None,
            })
            .collect();
        for slot in gone {
            self.disconnect(slot);
        }
        self.skipped.retain(|path| present.contains(path));

        for path in &paths {
            let known = self
                .slots
                .iter()
                .flatten()
                .any(|gamepad| &gamepad.path == path);
            if known || self.skipped.contains(path) {
                continue;
            }

            match OpenGamepad::open(path) {
                Ok(Some(gamepad)) => {
                    let slot = free_slot(&self.slots);
                    if slot == self.slots.len() {
                        self.slots.push(None);
                    }
                    info!("Gamepad in slot {}: {} at {}", slot, gamepad.id, path.display());
                    self.events
                        .emit(HostEvent::GamepadConnected(gamepad.info(slot)));
                    self.slots[slot] = Some(gamepad);
                }
                Ok(None) => {
                    debug!("Ignoring non-gamepad device {}", path.display());
                    self.skipped.insert(path.clone());
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                    self.skipped.insert(path.clone());
                }
            }
        }
    }
}

impl GamepadHost for EvdevGamepads {
    fn check_support(&self) -> Result<()> {
        event_device_paths(&self.input_dir).map(|_| ())
    }

    fn gamepads(&mut self) -> Vec<Option<GamepadSample>> {
        if self.rescan_due() {
            self.rescan();
        }

        let timestamp = self.created.elapsed();
        let mut failed = Vec::new();
        let samples = self
            .slots
            .iter()
            .enumerate()
            .map(|(slot, entry)| {
                let gamepad = entry.as_ref()?;
                match gamepad.sample(timestamp) {
                    Ok(sample) => Some(sample),
                    Err(e) => {
                        warn!("Failed to sample {}: {}", gamepad.path.display(), e);
                        failed.push(slot);
                        None
                    }
                }
            })
            .collect();

        for slot in failed {
            self.disconnect(slot);
        }

        samples
    }
}
