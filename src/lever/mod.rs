//! # Lever Module
//!
//! Signal conditioning and auto-calibration for a spring-loaded analog lever.
//!
//! This module handles:
//! - Switching between `Setup` and `Run` from the calibration button
//! - Discovering the lever's working range while it is used
//! - Filtering jitter, applying the deadzone and scaling to the HID axis
//! - Running the whole pipeline once per tick

pub mod calibration;
pub mod conditioner;
pub mod controller;
pub mod mode;

pub use calibration::{CalibrationRange, CalibrationTracker};
pub use conditioner::{AxisRange, ConditionedOutput, SignalConditioner};
pub use controller::{HandbrakeController, LeverState, TickOutcome};
pub use mode::{ModeController, ModeTransition, OperatingMode};

use crate::config::Config;

impl HandbrakeController {
    /// Builds a controller from the `[lever]` and `[output]` config sections.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let conditioner = SignalConditioner::new(
            config.lever.tolerance(),
            config.lever.deadzone,
            AxisRange::new(config.output.axis_min, config.output.axis_max),
        );
        Self::new(conditioner, config.lever.initial_span, config.output.axis)
    }
}
