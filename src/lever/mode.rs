//! # Operating Mode
//!
//! The calibration button selects between normal operation and recalibration.
//! The button is sampled once per tick: a HIGH level means [`OperatingMode::Run`],
//! anything else means [`OperatingMode::Setup`].
//!
//! Calibration resets on the edge into `Setup`, not while the level is held.

use serde::Serialize;
use std::fmt;

/// Operating mode selected by the calibration button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperatingMode {
    /// Recalibration / idle. No lever output is produced.
    Setup,
    /// Normal operation.
    Run,
}

impl OperatingMode {
    /// Maps a digital button level to a mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use handbrake_bridge::lever::mode::OperatingMode;
    ///
    /// assert_eq!(OperatingMode::from_level(true), OperatingMode::Run);
    /// assert_eq!(OperatingMode::from_level(false), OperatingMode::Setup);
    /// ```
    #[must_use]
    pub fn from_level(level: bool) -> Self {
        if level {
            Self::Run
        } else {
            Self::Setup
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => f.write_str("SETUP"),
            Self::Run => f.write_str("RUN"),
        }
    }
}

/// Mode change observed on a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    /// Same mode as the previous tick.
    Unchanged,
    /// Just switched into `Setup`; calibration must be reset.
    EnteredSetup,
    /// Just switched into `Run`.
    EnteredRun,
}

/// Tracks the current mode and reports edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeController {
    current: OperatingMode,
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeController {
    /// Starts in `Run`, so a button held LOW at power-up resets on the first tick.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: OperatingMode::Run,
        }
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> OperatingMode {
        self.current
    }

    /// Applies a button level sample and returns the resulting transition.
    ///
    /// # Examples
    ///
    /// ```
    /// use handbrake_bridge::lever::mode::{ModeController, ModeTransition};
    ///
    /// let mut modes = ModeController::new();
    /// assert_eq!(modes.resolve(true), ModeTransition::Unchanged);
    /// assert_eq!(modes.resolve(false), ModeTransition::EnteredSetup);
    /// assert_eq!(modes.resolve(false), ModeTransition::Unchanged);
    /// assert_eq!(modes.resolve(true), ModeTransition::EnteredRun);
    /// ```
    pub fn resolve(&mut self, level: bool) -> ModeTransition {
        let next = OperatingMode::from_level(level);
        if next == self.current {
            return ModeTransition::Unchanged;
        }

        self.current = next;
        match next {
            OperatingMode::Setup => ModeTransition::EnteredSetup,
            OperatingMode::Run => ModeTransition::EnteredRun,
        }
    }
}
