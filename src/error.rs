//! # Error Types
//!
//! Custom error types for Handbrake Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for Handbrake Bridge
#[derive(Debug, Error)]
pub enum HandbrakeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Analog lever read failed
    #[error("Analog input error: {0}")]
    AnalogInput(String),

    /// Calibration button read failed
    #[error("Button input error: {0}")]
    ButtonInput(String),

    /// HID sink rejected an axis write
    #[error("HID output error: {0}")]
    HidOutput(String),

    /// Replay trace could not be parsed
    #[error("Replay trace error: {0}")]
    Replay(String),

    /// Diagnostics record serialization failed
    #[error("Diagnostics error: {0}")]
    Diagnostics(#[from] serde_json::Error),
}

/// Result type alias for Handbrake Bridge
pub type Result<T> = std::result::Result<T, HandbrakeError>;
