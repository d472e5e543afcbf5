//! # Devices Module
//!
//! Linux evdev backends for the input poller.
//!
//! This module handles:
//! - Enumerating `/dev/input/event*` devices
//! - Sampling gamepads and SpaceMice into fixed slots ([`evdev_host`])
//! - Reading keyboards into key-down / key-up events ([`keyboard`])

pub mod evdev_host;
pub mod keyboard;

use std::path::{Path, PathBuf};

use crate::error::{Result, TeleopInputError};

/// Lists `event*` device nodes under `input_dir`, sorted by path.
///
/// # Errors
///
/// Returns `EnvironmentUnsupported` if the directory does not exist or
/// cannot be read.
pub fn event_device_paths(input_dir: &Path) -> Result<Vec<PathBuf>> {
    if !input_dir.exists() {
        return Err(TeleopInputError::EnvironmentUnsupported(format!(
            "{} directory not found",
            input_dir.display()
        )));
    }

    let entries = std::fs::read_dir(input_dir).map_err(|e| {
        TeleopInputError::EnvironmentUnsupported(format!(
            "Failed to read {}: {}",
            input_dir.display(),
            e
        ))
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().starts_with("event"))
                .unwrap_or(false)
        })
        .collect();

    // Deterministic slot assignment across runs
    paths.sort();
    Ok(paths)
}
