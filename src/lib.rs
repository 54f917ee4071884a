//! # Handbrake Bridge Library
//!
//! Turn a spring-loaded analog handbrake lever into a calibrated gamepad axis.
//!
//! This library provides the signal conditioning and auto-calibration state
//! machine, the device traits it drives, periodic diagnostics, and the
//! fixed-cadence control loop that ties them together.

pub mod config;
pub mod device;
pub mod diagnostics;
pub mod error;
pub mod lever;
pub mod runtime;
