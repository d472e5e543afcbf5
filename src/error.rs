//! # Error Types
//!
//! Custom error types for Teleop Input using `thiserror`.

use thiserror::Error;

/// Main error type for Teleop Input
#[derive(Debug, Error)]
pub enum TeleopInputError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The host cannot enumerate game controllers
    #[error("Gamepad enumeration not supported: {0}")]
    EnvironmentUnsupported(String),

    /// Action definition errors
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Message serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for Teleop Input
pub type Result<T> = std::result::Result<T, TeleopInputError>;
