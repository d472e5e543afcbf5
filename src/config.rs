//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, TeleopInputError};
use crate::input::binding::Binding;
use crate::input::poller::{PollerSettings, DEFAULT_IGNORED_MARKERS, DEFAULT_SPACEMOUSE_MARKERS};
use crate::input::sample::DEFAULT_BUTTON_THRESHOLD;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub input: InputConfig,
    pub devices: DevicesConfig,
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

/// Polling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_frame_rate_hz")]
    pub frame_rate_hz: u32,

    #[serde(default = "default_button_threshold")]
    pub button_threshold: f32,

    #[serde(default = "default_spacemouse_markers")]
    pub spacemouse_markers: Vec<String>,

    #[serde(default = "default_ignored_markers")]
    pub ignored_markers: Vec<String>,
}

/// Device backend configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DevicesConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    #[serde(default = "default_rescan_interval_ms")]
    pub rescan_interval_ms: u64,

    #[serde(default = "default_keyboard")]
    pub keyboard: bool,
}

/// Joy message output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_frame_id")]
    pub frame_id: String,
}

/// Log file configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for daily-rotated log files. Console only when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// What an action does when one of its bindings matches
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Log the action name and context
    #[default]
    Log,
    /// Publish the device state as a Joy message on stdout
    PublishJoy,
}

/// One `[[actions]]` entry
#[derive(Debug, Deserialize, Clone)]
pub struct ActionConfig {
    pub name: String,

    #[serde(default)]
    pub effect: Effect,

    pub bindings: Vec<Binding>,
}

// Default value functions
fn default_frame_rate_hz() -> u32 { 60 }
fn default_button_threshold() -> f32 { DEFAULT_BUTTON_THRESHOLD }
fn default_spacemouse_markers() -> Vec<String> {
    DEFAULT_SPACEMOUSE_MARKERS.iter().map(|m| m.to_string()).collect()
}
fn default_ignored_markers() -> Vec<String> {
    DEFAULT_IGNORED_MARKERS.iter().map(|m| m.to_string()).collect()
}

fn default_input_dir() -> PathBuf { PathBuf::from("/dev/input") }
fn default_rescan_interval_ms() -> u64 { 1000 }
fn default_keyboard() -> bool { true }

fn default_frame_id() -> String { "teleop".to_string() }

fn config_error(msg: impl std::fmt::Display) -> TeleopInputError {
    TeleopInputError::Config(toml::de::Error::custom(msg))
}

impl InputConfig {
    /// Poller settings described by this section
    pub fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            button_threshold: self.button_threshold,
            spacemouse_markers: self.spacemouse_markers.clone(),
            ignored_markers: self.ignored_markers.clone(),
        }
    }
}

impl DevicesConfig {
    /// Minimum time between gamepad hot-plug rescans
    pub fn rescan_interval(&self) -> Duration {
        Duration::from_millis(self.rescan_interval_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails (including unknown binding kinds)
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use teleop_input::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns `Config` if parsing or validation fails.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range or an
    /// action is malformed
    fn validate(&self) -> Result<()> {
        // Validate input configuration
        if self.input.frame_rate_hz == 0 || self.input.frame_rate_hz > 240 {
            return Err(config_error("frame_rate_hz must be between 1 and 240"));
        }

        if !(0.0..1.0).contains(&self.input.button_threshold) {
            return Err(config_error("button_threshold must be between 0.0 and 1.0"));
        }

        for (name, markers) in [
            ("spacemouse_markers", &self.input.spacemouse_markers),
            ("ignored_markers", &self.input.ignored_markers),
        ] {
            if markers.iter().any(String::is_empty) {
                // An empty marker would match every device
                return Err(config_error(format!("{} cannot contain empty strings", name)));
            }
        }

        // Validate device configuration
        if self.devices.input_dir.as_os_str().is_empty() {
            return Err(config_error("input_dir cannot be empty"));
        }

        if self.devices.rescan_interval_ms < 100 || self.devices.rescan_interval_ms > 60000 {
            return Err(config_error("rescan_interval_ms must be between 100 and 60000"));
        }

        // Validate output configuration
        if self.output.frame_id.is_empty() {
            return Err(config_error("frame_id cannot be empty"));
        }

        // Validate actions
        let mut names = HashSet::new();
        for action in &self.actions {
            if action.name.is_empty() {
                return Err(config_error("action name cannot be empty"));
            }

            if !names.insert(action.name.as_str()) {
                return Err(config_error(format!("duplicate action name '{}'", action.name)));
            }

            if action.bindings.is_empty() {
                return Err(config_error(format!("action '{}' has no bindings", action.name)));
            }

            for binding in &action.bindings {
                if let Binding::Keyboard { code, .. } = binding {
                    if code.is_empty() {
                        return Err(config_error(format!(
                            "action '{}' has a keyboard binding with an empty code",
                            action.name
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
