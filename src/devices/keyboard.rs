//! # Keyboard Readers
//!
//! Reads evdev keyboards and forwards key transitions as
//! [`HostEvent::Key`] events.
//!
//! Key names follow the web `KeyboardEvent.code` convention (`KeyA`,
//! `Digit1`, `Space`, `ArrowUp`, `ShiftLeft`, `F1`), so bindings read the
//! same whichever host delivers them. Keys without a conventional name keep
//! their evdev name (`KEY_VOLUMEUP`).

use std::path::{Path, PathBuf};

use evdev::{Device, InputEventKind, Key};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::event_device_paths;
use crate::error::Result;
use crate::input::binding::KeyEvent;
use crate::input::host::{HostEvent, HostEvents};

/// evdev key value for a release
const KEY_RELEASE: i32 = 0;
/// evdev key value for a press
const KEY_PRESS: i32 = 1;
/// evdev key value for autorepeat
const KEY_REPEAT: i32 = 2;

/// Web-style code for an evdev key.
///
/// # Examples
///
/// ```
/// use evdev::Key;
/// use teleop_input::devices::keyboard::key_code_name;
///
/// assert_eq!(key_code_name(Key::KEY_W), "KeyW");
/// assert_eq!(key_code_name(Key::KEY_SPACE), "Space");
/// assert_eq!(key_code_name(Key::KEY_7), "Digit7");
/// ```
#[must_use]
pub fn key_code_name(key: Key) -> String {
    let named = match key {
        Key::KEY_SPACE => "Space",
        Key::KEY_ENTER => "Enter",
        Key::KEY_ESC => "Escape",
        Key::KEY_TAB => "Tab",
        Key::KEY_BACKSPACE => "Backspace",
        Key::KEY_DELETE => "Delete",
        Key::KEY_INSERT => "Insert",
        Key::KEY_HOME => "Home",
        Key::KEY_END => "End",
        Key::KEY_PAGEUP => "PageUp",
        Key::KEY_PAGEDOWN => "PageDown",
        Key::KEY_UP => "ArrowUp",
        Key::KEY_DOWN => "ArrowDown",
        Key::KEY_LEFT => "ArrowLeft",
        Key::KEY_RIGHT => "ArrowRight",
        Key::KEY_LEFTSHIFT => "ShiftLeft",
        Key::KEY_RIGHTSHIFT => "ShiftRight",
        Key::KEY_LEFTCTRL => "ControlLeft",
        Key::KEY_RIGHTCTRL => "ControlRight",
        Key::KEY_LEFTALT => "AltLeft",
        Key::KEY_RIGHTALT => "AltRight",
        Key::KEY_LEFTMETA => "MetaLeft",
        Key::KEY_RIGHTMETA => "MetaRight",
        Key::KEY_CAPSLOCK => "CapsLock",
        Key::KEY_MINUS => "Minus",
        Key::KEY_EQUAL => "Equal",
        Key::KEY_LEFTBRACE => "BracketLeft",
        Key::KEY_RIGHTBRACE => "BracketRight",
        Key::KEY_SEMICOLON => "Semicolon",
        Key::KEY_APOSTROPHE => "Quote",
        Key::KEY_GRAVE => "Backquote",
        Key::KEY_BACKSLASH => "Backslash",
        Key::KEY_COMMA => "Comma",
        Key::KEY_DOT => "Period",
        Key::KEY_SLASH => "Slash",
        _ => "",
    };
    if !named.is_empty() {
        return named.to_string();
    }

    let raw = format!("{:?}", key);
    let Some(suffix) = raw.strip_prefix("KEY_") else {
        return raw;
    };

    let mut chars = suffix.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => format!("Key{}", c),
        (Some(c), None) if c.is_ascii_digit() => format!("Digit{}", c),
        (Some('F'), Some(_)) if suffix[1..].chars().all(|c| c.is_ascii_digit()) => {
            suffix.to_string()
        }
        _ => raw,
    }
}

/// Key event for an evdev key value, or `None` for values that are not
/// transitions. Autorepeat counts as a key-down.
#[must_use]
pub fn key_event(key: Key, value: i32) -> Option<KeyEvent> {
    match value {
        KEY_PRESS | KEY_REPEAT => Some(KeyEvent::down(key_code_name(key))),
        KEY_RELEASE => Some(KeyEvent::up(key_code_name(key))),
        _ => None,
    }
}

/// Returns true if `device` looks like a full keyboard.
fn is_keyboard(device: &Device) -> bool {
    device
        .supported_keys()
        .map(|keys| {
            keys.contains(Key::KEY_A) && keys.contains(Key::KEY_Z) && keys.contains(Key::KEY_SPACE)
        })
        .unwrap_or(false)
}

/// Keyboards under `input_dir`, in path order.
///
/// # Errors
///
/// Returns `EnvironmentUnsupported` if the directory cannot be listed.
pub fn find_keyboards(input_dir: &Path) -> Result<Vec<(PathBuf, Device)>> {
    let mut keyboards = Vec::new();

    for path in event_device_paths(input_dir)? {
        match Device::open(&path) {
            Ok(device) if is_keyboard(&device) => {
                info!(
                    "Found keyboard at {}: {}",
                    path.display(),
                    device.name().unwrap_or("unnamed")
                );
                keyboards.push((path, device));
            }
            Ok(_) => {}
            Err(e) => debug!("Could not open {}: {}", path.display(), e),
        }
    }

    Ok(keyboards)
}

/// Spawns one reader task per keyboard found under `input_dir`.
///
/// Each task ends when its device disappears or the event receiver closes.
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns `EnvironmentUnsupported` if the directory cannot be listed.
pub fn spawn_keyboard_readers(input_dir: &Path, events: HostEvents) -> Result<Vec<JoinHandle<()>>> {
    let keyboards = find_keyboards(input_dir)?;
    if keyboards.is_empty() {
        warn!("No keyboards found under {}", input_dir.display());
    }

    Ok(keyboards
        .into_iter()
        .map(|(path, device)| tokio::spawn(read_keyboard(path, device, events.clone())))
        .collect())
}

async fn read_keyboard(path: PathBuf, device: Device, events: HostEvents) {
    let mut stream = match device.into_event_stream() {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Cannot stream events from {}: {}", path.display(), e);
            return;
        }
    };

    loop {
        match stream.next_event().await {
            Ok(event) => {
                let InputEventKind::Key(key) = event.kind() else {
                    continue;
                };
                if let Some(key_event) = key_event(key, event.value()) {
                    events.emit(HostEvent::Key(key_event));
                }
            }
            Err(e) => {
                warn!("Keyboard {} stopped: {}", path.display(), e);
                break;
            }
        }
    }
}
