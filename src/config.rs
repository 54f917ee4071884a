//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below, which match a 12-bit ADC lever sending to a 0-127
//! gamepad axis.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::device::HidAxis;
use crate::error::{HandbrakeError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub lever: LeverConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub device: DeviceConfig,
}

/// Lever signal conditioning configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LeverConfig {
    #[serde(default = "default_full_scale")]
    pub full_scale: u16,

    #[serde(default = "default_tolerance_fraction")]
    pub tolerance_fraction: f64,

    #[serde(default = "default_initial_span")]
    pub initial_span: f64,

    #[serde(default = "default_deadzone")]
    pub deadzone: f64,
}

/// HID output axis configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default)]
    pub axis: HidAxis,

    #[serde(default = "default_axis_min")]
    pub axis_min: i32,

    #[serde(default = "default_axis_max")]
    pub axis_max: i32,
}

/// Control loop timing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_connect_poll_ms")]
    pub connect_poll_ms: u64,
}

/// Periodic diagnostics configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_interval_ticks")]
    pub interval_ticks: u64,

    #[serde(default)]
    pub record_enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

/// Which collaborators back the lever, button and HID sink
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceBackend {
    /// Synthetic pull/release cycle
    #[default]
    Simulated,
    /// Raw samples replayed from a trace file
    Replay,
}

/// Device backend configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    #[serde(default)]
    pub backend: DeviceBackend,

    #[serde(default)]
    pub replay_path: String,

    #[serde(default = "default_button_level")]
    pub button_level: bool,

    #[serde(default = "default_connect_delay_ms")]
    pub connect_delay_ms: u64,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

// Default value functions
fn default_full_scale() -> u16 { 4095 }
fn default_tolerance_fraction() -> f64 { 0.02 }
fn default_initial_span() -> f64 { 100.0 }
fn default_deadzone() -> f64 { 0.10 }

fn default_axis_min() -> i32 { 0 }
fn default_axis_max() -> i32 { 127 }

fn default_tick_interval_ms() -> u64 { 10 }
fn default_connect_timeout_ms() -> u64 { 5000 }
fn default_connect_poll_ms() -> u64 { 100 }

fn default_interval_ticks() -> u64 { 2000 }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

fn default_button_level() -> bool { true }
fn default_connect_delay_ms() -> u64 { 1500 }
fn default_seed() -> u64 { 0x5eed }

impl Default for LeverConfig {
    fn default() -> Self {
        Self {
            full_scale: default_full_scale(),
            tolerance_fraction: default_tolerance_fraction(),
            initial_span: default_initial_span(),
            deadzone: default_deadzone(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            axis: HidAxis::default(),
            axis_min: default_axis_min(),
            axis_max: default_axis_max(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            connect_poll_ms: default_connect_poll_ms(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            interval_ticks: default_interval_ticks(),
            record_enabled: false,
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            backend: DeviceBackend::default(),
            replay_path: String::new(),
            button_level: default_button_level(),
            connect_delay_ms: default_connect_delay_ms(),
            seed: default_seed(),
        }
    }
}

impl LeverConfig {
    /// Noise tolerance in raw units (`tolerance_fraction` of full scale)
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        f64::from(self.full_scale) * self.tolerance_fraction
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use handbrake_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.lever.full_scale == 0 {
            return Err(invalid("full_scale must be greater than 0"));
        }

        if !(self.lever.tolerance_fraction > 0.0 && self.lever.tolerance_fraction <= 0.25) {
            return Err(invalid("tolerance_fraction must be between 0.0 (exclusive) and 0.25"));
        }

        // The fresh range has to be wider than one jitter step
        if !(self.lever.initial_span > self.lever.tolerance()) {
            return Err(invalid(format!(
                "initial_span must be greater than the noise tolerance ({:.1} raw units)",
                self.lever.tolerance()
            )));
        }

        if !(self.lever.deadzone >= 0.0 && self.lever.deadzone < 0.5) {
            return Err(invalid("deadzone must be between 0.0 and 0.5 (exclusive)"));
        }

        if self.output.axis_min >= self.output.axis_max {
            return Err(invalid("axis_min must be less than axis_max"));
        }

        if self.timing.tick_interval_ms == 0 || self.timing.tick_interval_ms > 1000 {
            return Err(invalid("tick_interval_ms must be between 1 and 1000"));
        }

        if self.timing.connect_timeout_ms > 60000 {
            return Err(invalid("connect_timeout_ms must be at most 60000"));
        }

        if self.timing.connect_poll_ms == 0 || self.timing.connect_poll_ms > 10000 {
            return Err(invalid("connect_poll_ms must be between 1 and 10000"));
        }

        if self.diagnostics.interval_ticks == 0 {
            return Err(invalid("interval_ticks must be greater than 0"));
        }

        if self.diagnostics.record_enabled && self.diagnostics.log_dir.is_empty() {
            return Err(invalid("diagnostics log_dir cannot be empty when recording is enabled"));
        }

        if self.diagnostics.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.diagnostics.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.device.backend == DeviceBackend::Replay && self.device.replay_path.is_empty() {
            return Err(invalid("replay_path is required for the replay backend"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> HandbrakeError {
    HandbrakeError::Config(toml::de::Error::custom(msg))
}
