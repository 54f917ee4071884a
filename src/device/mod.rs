//! # Device Module
//!
//! Trait abstractions for the hardware the control loop talks to.
//!
//! This module handles:
//! - Reading the raw analog lever position
//! - Reading the calibration button level
//! - Writing axis values to a wireless HID gamepad
//!
//! The traits are synchronous: a tick never suspends between reading the
//! lever and writing the axis.

use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
use mockall::automock;

use crate::error::Result;

pub mod replay;
pub mod simulated;
pub mod sink;

pub use replay::ReplayLever;
pub use simulated::{FixedButton, SimulatedLever};
pub use sink::LoggingHidSink;

/// Gamepad axes a HID sink can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HidAxis {
    X,
    #[default]
    Y,
    Z,
    Rx,
    Ry,
    Rz,
    Slider1,
    Slider2,
}

impl fmt::Display for HidAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
            Self::Rx => "Rx",
            Self::Ry => "Ry",
            Self::Rz => "Rz",
            Self::Slider1 => "Slider1",
            Self::Slider2 => "Slider2",
        };
        f.write_str(name)
    }
}

/// Source of raw lever samples.
#[cfg_attr(test, automock)]
pub trait AnalogInput {
    /// Read one sample in `[0, full_scale]`.
    fn read(&mut self) -> Result<u16>;
}

/// Source of the calibration button level.
#[cfg_attr(test, automock)]
pub trait DigitalButton {
    /// Read the current level. `true` is HIGH.
    fn read(&mut self) -> Result<bool>;
}

/// Wireless HID gamepad that accepts axis values.
#[cfg_attr(test, automock)]
pub trait HidSink {
    /// Whether the host link is currently up.
    fn is_connected(&self) -> bool;

    /// Write an axis value. Only called while connected; not retried.
    fn set_axis(&mut self, axis: HidAxis, value: i32) -> Result<()>;
}

/// The three collaborators one control loop drives.
#[derive(Debug)]
pub struct Devices<A, B, H> {
    pub lever: A,
    pub button: B,
    pub hid: H,
}

impl<A, B, H> Devices<A, B, H>
where
    A: AnalogInput,
    B: DigitalButton,
    H: HidSink,
{
    pub fn new(lever: A, button: B, hid: H) -> Self {
        Self { lever, button, hid }
    }
}
