//! # Handbrake Controller
//!
//! Runs one read–condition–emit pass per tick.
//!
//! ## Tick Order
//!
//! 1. Sample the calibration button and resolve the mode
//! 2. On the edge into `Setup`, reset calibration against the current lever sample
//! 3. In `Setup`, stop; nothing is read or sent
//! 4. Sample the lever and apply the tolerance filter
//! 5. Expand the calibration range, normalize, deadzone, quantize
//! 6. Send the axis value if the HID link is up
//!
//! ## Fault Handling
//!
//! Every collaborator call returns a `Result`. A tick works on a copy of
//! [`LeverState`] and only commits it once every call has succeeded, so a
//! failed tick leaves no trace and the next tick simply tries again.

use tracing::{debug, info};

use super::calibration::{CalibrationRange, CalibrationTracker};
use super::conditioner::{ConditionedOutput, SignalConditioner};
use super::mode::{ModeController, ModeTransition, OperatingMode};
use crate::device::{AnalogInput, DigitalButton, Devices, HidAxis, HidSink};
use crate::error::Result;

/// All state carried from one tick to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeverState {
    pub modes: ModeController,
    pub tracker: CalibrationTracker,
    /// Last position accepted by the tolerance filter.
    pub last_stable: Option<f64>,
    /// Last raw sample read, accepted or not.
    pub last_raw: Option<u16>,
    /// Last output computed, whether or not it was sent.
    pub last_output: Option<ConditionedOutput>,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Entered `Setup` and reset calibration with `rest` as the new minimum.
    Recalibrated { rest: u16 },
    /// Still in `Setup`; nothing read.
    Idle,
    /// Reading within tolerance of the last stable position.
    Steady,
    /// Reading accepted but the calibration range is not usable.
    RangeInvalid,
    /// Output computed; `sent` is false when the HID link was down.
    Conditioned { output: ConditionedOutput, sent: bool },
}

/// Owns the lever state and drives the collaborators each tick.
#[derive(Debug, Clone)]
pub struct HandbrakeController {
    conditioner: SignalConditioner,
    axis: HidAxis,
    state: LeverState,
}

impl HandbrakeController {
    /// Creates a controller in `Run` mode with an uncalibrated range.
    ///
    /// Call [`HandbrakeController::calibrate_at_rest`] before the first tick.
    #[must_use]
    pub fn new(conditioner: SignalConditioner, initial_span: f64, axis: HidAxis) -> Self {
        Self {
            conditioner,
            axis,
            state: LeverState {
                modes: ModeController::new(),
                tracker: CalibrationTracker::new(initial_span),
                last_stable: None,
                last_raw: None,
                last_output: None,
            },
        }
    }

    /// Resets calibration against one lever sample, assuming the lever is at rest.
    ///
    /// # Errors
    ///
    /// Returns error if the lever cannot be read.
    pub fn calibrate_at_rest<A: AnalogInput>(&mut self, lever: &mut A) -> Result<u16> {
        let rest = lever.read()?;
        self.state.tracker.reset(f64::from(rest));
        self.state.last_raw = Some(rest);
        info!(
            "Calibration reset at rest position {} (range {:.0} - {:.0})",
            rest,
            self.state.tracker.range().min_pos,
            self.state.tracker.range().max_pos
        );
        Ok(rest)
    }

    /// Sends the axis minimum if the link is up.
    ///
    /// Returns whether a value was sent.
    ///
    /// # Errors
    ///
    /// Returns error if the sink rejects the write.
    pub fn send_released<H: HidSink>(&self, hid: &mut H) -> Result<bool> {
        if !hid.is_connected() {
            return Ok(false);
        }
        let low = self.conditioner.axis().low;
        hid.set_axis(self.axis, low)?;
        debug!("Sent released value {} on axis {}", low, self.axis);
        Ok(true)
    }

    /// Runs one tick.
    ///
    /// # Errors
    ///
    /// Returns the first collaborator error. State is left untouched in that case.
    pub fn tick<A, B, H>(&mut self, devices: &mut Devices<A, B, H>) -> Result<TickOutcome>
    where
        A: AnalogInput,
        B: DigitalButton,
        H: HidSink,
    {
        let mut next = self.state;

        let level = devices.button.read()?;
        match next.modes.resolve(level) {
            ModeTransition::EnteredSetup => {
                let rest = devices.lever.read()?;
                next.tracker.reset(f64::from(rest));
                next.last_raw = Some(rest);
                self.state = next;
                info!("Entered SETUP, calibration reset at rest position {}", rest);
                return Ok(TickOutcome::Recalibrated { rest });
            }
            ModeTransition::EnteredRun => {
                let range = next.tracker.range();
                info!(
                    "Entered RUN (range {:.0} - {:.0})",
                    range.min_pos, range.max_pos
                );
            }
            ModeTransition::Unchanged => {}
        }

        if next.modes.mode() == OperatingMode::Setup {
            self.state = next;
            return Ok(TickOutcome::Idle);
        }

        let raw = devices.lever.read()?;
        next.last_raw = Some(raw);
        let position = f64::from(raw);

        if !self.conditioner.exceeds_tolerance(next.last_stable, position) {
            self.state = next;
            return Ok(TickOutcome::Steady);
        }

        next.last_stable = Some(position);
        if next.tracker.observe(position) {
            debug!("Calibration max expanded to {}", raw);
        }

        let Some(output) = self.conditioner.condition(&next.tracker.range(), position) else {
            self.state = next;
            return Ok(TickOutcome::RangeInvalid);
        };
        next.last_output = Some(output);

        let sent = if devices.hid.is_connected() {
            devices.hid.set_axis(self.axis, output.quantized)?;
            debug!("Axis {} = {} ({:.1}%)", self.axis, output.quantized, output.normalized * 100.0);
            true
        } else {
            false
        };

        self.state = next;
        Ok(TickOutcome::Conditioned { output, sent })
    }

    #[must_use]
    pub fn state(&self) -> &LeverState {
        &self.state
    }

    #[must_use]
    pub fn mode(&self) -> OperatingMode {
        self.state.modes.mode()
    }

    #[must_use]
    pub fn range(&self) -> CalibrationRange {
        self.state.tracker.range()
    }

    #[must_use]
    pub fn axis(&self) -> HidAxis {
        self.axis
    }

    #[must_use]
    pub fn conditioner(&self) -> &SignalConditioner {
        &self.conditioner
    }
}
