//! # Signal Conditioning
//!
//! Turns an accepted lever position into an axis value.
//!
//! ## Tolerance Filter
//!
//! Analog readings jitter by a few percent even when the lever is still. A new
//! reading is only accepted when it differs from the last accepted position by
//! more than the tolerance; everything else is treated as noise and dropped
//! for the whole tick.
//!
//! ## Deadzone
//!
//! A lever that springs back to *almost* its rest position would otherwise
//! report a few percent of brake. Normalized values below the deadzone are
//! forced to exactly `0.0`. Values at or above it pass through unscaled.
//!
//! ## Quantization
//!
//! The normalized value is mapped linearly onto the HID axis range and rounded
//! to the nearest integer:
//!
//! `out = round(low + (high - low) * n)`
//!
//! ## Usage
//!
//! ```
//! use handbrake_bridge::lever::calibration::CalibrationRange;
//! use handbrake_bridge::lever::conditioner::{AxisRange, SignalConditioner};
//!
//! let conditioner = SignalConditioner::new(81.9, 0.10, AxisRange::new(0, 127));
//! let range = CalibrationRange { min_pos: 1000.0, max_pos: 2000.0 };
//!
//! // Resting slightly above min: inside the deadzone
//! assert_eq!(conditioner.condition(&range, 1050.0).unwrap().quantized, 0);
//!
//! // Full pull
//! assert_eq!(conditioner.condition(&range, 2000.0).unwrap().quantized, 127);
//! ```

use serde::Serialize;

use super::calibration::CalibrationRange;

/// Integer range of the target HID axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisRange {
    /// Value reported for a released lever.
    pub low: i32,
    /// Value reported for a fully pulled lever.
    pub high: i32,
}

impl AxisRange {
    #[must_use]
    pub fn new(low: i32, high: i32) -> Self {
        Self { low, high }
    }

    /// Maps a normalized value onto the axis, rounding to nearest.
    ///
    /// Inputs outside `[0.0, 1.0]` are clamped first.
    ///
    /// # Examples
    ///
    /// ```
    /// use handbrake_bridge::lever::conditioner::AxisRange;
    ///
    /// let axis = AxisRange::new(-32767, 32767);
    /// assert_eq!(axis.quantize(0.0), -32767);
    /// assert_eq!(axis.quantize(0.5), 0);
    /// assert_eq!(axis.quantize(1.0), 32767);
    /// ```
    #[must_use]
    pub fn quantize(&self, normalized: f64) -> i32 {
        let n = if normalized.is_nan() {
            0.0
        } else {
            normalized.clamp(0.0, 1.0)
        };
        let low = f64::from(self.low);
        let high = f64::from(self.high);
        let value = (low + (high - low) * n).round();
        (value as i32).clamp(self.low, self.high)
    }
}

/// Output produced for an accepted lever position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConditionedOutput {
    /// Position within the calibration range after deadzone, in `[0.0, 1.0]`.
    pub normalized: f64,
    /// Value for the HID axis.
    pub quantized: i32,
}

/// Tolerance, deadzone and quantization settings for one lever.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalConditioner {
    tolerance: f64,
    deadzone: f64,
    axis: AxisRange,
}

impl SignalConditioner {
    /// Creates a conditioner.
    ///
    /// # Arguments
    ///
    /// * `tolerance` - Minimum change in raw units before a reading is accepted
    /// * `deadzone` - Normalized values below this are reported as zero
    /// * `axis` - Target HID axis range
    #[must_use]
    pub fn new(tolerance: f64, deadzone: f64, axis: AxisRange) -> Self {
        Self {
            tolerance,
            deadzone,
            axis,
        }
    }

    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    #[must_use]
    pub fn deadzone(&self) -> f64 {
        self.deadzone
    }

    #[must_use]
    pub fn axis(&self) -> AxisRange {
        self.axis
    }

    /// Decides whether `raw` replaces the last accepted position.
    ///
    /// With no previous position the reading is always accepted.
    ///
    /// # Examples
    ///
    /// ```
    /// use handbrake_bridge::lever::conditioner::{AxisRange, SignalConditioner};
    ///
    /// let conditioner = SignalConditioner::new(81.9, 0.10, AxisRange::new(0, 127));
    /// assert!(conditioner.exceeds_tolerance(None, 1000.0));
    /// assert!(!conditioner.exceeds_tolerance(Some(1000.0), 1025.0));
    /// assert!(conditioner.exceeds_tolerance(Some(1000.0), 1200.0));
    /// ```
    #[must_use]
    pub fn exceeds_tolerance(&self, last_stable: Option<f64>, raw: f64) -> bool {
        match last_stable {
            Some(previous) => (previous - raw).abs() > self.tolerance,
            None => true,
        }
    }

    /// Forces values below the deadzone to zero.
    #[inline]
    #[must_use]
    pub fn apply_deadzone(&self, normalized: f64) -> f64 {
        if normalized < self.deadzone {
            0.0
        } else {
            normalized
        }
    }

    /// Normalizes, applies the deadzone and quantizes an accepted position.
    ///
    /// Returns `None` while the calibration range is not valid.
    #[must_use]
    pub fn condition(&self, range: &CalibrationRange, position: f64) -> Option<ConditionedOutput> {
        let normalized = self.apply_deadzone(range.normalize(position)?);
        Some(ConditionedOutput {
            normalized,
            quantized: self.axis.quantize(normalized),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn conditioner() -> SignalConditioner {
        SignalConditioner::new(81.9, 0.10, AxisRange::new(0, 127))
    }

    // ==================== Tolerance Tests ====================

    #[test]
    fn test_tolerance_boundary_is_rejected() {
        let c = SignalConditioner::new(80.0, 0.10, AxisRange::new(0, 127));
        assert!(!c.exceeds_tolerance(Some(1000.0), 1080.0));
        assert!(!c.exceeds_tolerance(Some(1000.0), 920.0));
        assert!(c.exceeds_tolerance(Some(1000.0), 1080.5));
        assert!(c.exceeds_tolerance(Some(1000.0), 919.5));
    }

    #[test]
    fn test_first_reading_always_accepted() {
        assert!(conditioner().exceeds_tolerance(None, 0.0));
    }

    // ==================== Deadzone Tests ====================

    #[test]
    fn test_deadzone_forces_zero() {
        let c = conditioner();
        assert_eq!(c.apply_deadzone(0.05), 0.0);
        assert_eq!(c.apply_deadzone(0.0999), 0.0);
    }

    #[test]
    fn test_deadzone_passes_values_unscaled() {
        let c = conditioner();
        assert_eq!(c.apply_deadzone(0.10), 0.10);
        assert_eq!(c.apply_deadzone(0.55), 0.55);
        assert_eq!(c.apply_deadzone(1.0), 1.0);
    }

    // ==================== Quantization Tests ====================

    #[test]
    fn test_quantize_endpoints() {
        let axis = AxisRange::new(0, 127);
        assert_eq!(axis.quantize(0.0), 0);
        assert_eq!(axis.quantize(1.0), 127);
    }

    #[test]
    fn test_quantize_rounds_to_nearest() {
        let axis = AxisRange::new(0, 127);
        // 127 * 0.5 = 63.5
        assert_eq!(axis.quantize(0.5), 64);
        // 127 * 0.25 = 31.75
        assert_eq!(axis.quantize(0.25), 32);
        // 127 * 0.1 = 12.7
        assert_eq!(axis.quantize(0.1), 13);
    }

    #[test]
    fn test_quantize_clamps() {
        let axis = AxisRange::new(-127, 127);
        assert_eq!(axis.quantize(-0.5), -127);
        assert_eq!(axis.quantize(1.5), 127);
        assert_eq!(axis.quantize(f64::NAN), -127);
    }

    // ==================== Full Conditioning Tests ====================

    #[test]
    fn test_condition_full_pull() {
        let range = CalibrationRange {
            min_pos: 1000.0,
            max_pos: 1200.0,
        };
        let out = conditioner().condition(&range, 1200.0).unwrap();
        assert_eq!(out.normalized, 1.0);
        assert_eq!(out.quantized, 127);
    }

    #[test]
    fn test_condition_near_rest_is_zero() {
        let range = CalibrationRange {
            min_pos: 1000.0,
            max_pos: 1200.0,
        };
        // n = 10 / 200 = 0.05
        let out = conditioner().condition(&range, 1010.0).unwrap();
        assert_eq!(out.normalized, 0.0);
        assert_eq!(out.quantized, 0);
    }

    #[test]
    fn test_condition_below_rest_clamps_to_zero() {
        let range = CalibrationRange {
            min_pos: 1000.0,
            max_pos: 2000.0,
        };
        let out = conditioner().condition(&range, 400.0).unwrap();
        assert_eq!(out.normalized, 0.0);
        assert_eq!(out.quantized, 0);
    }

    #[test]
    fn test_condition_invalid_range() {
        let range = CalibrationRange {
            min_pos: 1000.0,
            max_pos: 1000.0,
        };
        assert_eq!(conditioner().condition(&range, 1500.0), None);
    }

    #[test]
    fn test_condition_asymmetric_axis_zero_equivalent() {
        let c = SignalConditioner::new(81.9, 0.10, AxisRange::new(-32767, 32767));
        let range = CalibrationRange {
            min_pos: 0.0,
            max_pos: 4095.0,
        };
        assert_eq!(c.condition(&range, 100.0).unwrap().quantized, -32767);
    }

    proptest! {
        #[test]
        fn prop_quantize_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0, low in -40000i32..0, width in 1i32..80000) {
            let axis = AxisRange::new(low, low + width);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(axis.quantize(lo) <= axis.quantize(hi));
        }

        #[test]
        fn prop_output_zero_below_deadzone(
            min in 0.0f64..3000.0,
            width in 100.0f64..1000.0,
            fraction in 0.0f64..0.0999,
        ) {
            let range = CalibrationRange { min_pos: min, max_pos: min + width };
            let out = conditioner().condition(&range, min + width * fraction).unwrap();
            prop_assert_eq!(out.normalized, 0.0);
            prop_assert_eq!(out.quantized, 0);
        }

        #[test]
        fn prop_normalized_in_unit_interval(
            min in 0.0f64..3000.0,
            width in 1.0f64..1000.0,
            position in 0.0f64..4095.0,
        ) {
            let range = CalibrationRange { min_pos: min, max_pos: min + width };
            let out = conditioner().condition(&range, position).unwrap();
            prop_assert!((0.0..=1.0).contains(&out.normalized));
            prop_assert!((0..=127).contains(&out.quantized));
        }
    }
}
