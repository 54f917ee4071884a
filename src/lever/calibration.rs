//! # Calibration Module
//!
//! Tracks the working range of a spring-loaded lever.
//!
//! ## Range Discovery
//!
//! A spring-return lever rests at its zero position whenever it is not being
//! pulled, so the lower bound is taken from a single sample at reset time.
//! The upper bound is not known in advance: it starts a fixed span above the
//! rest position and grows every time the lever is pulled further than ever
//! before.
//!
//! The range is one-sided. `min_pos` only changes on [`CalibrationTracker::reset`],
//! and `max_pos` never shrinks, so a single outlier sample widens the range
//! until the next recalibration.
//!
//! ## Usage
//!
//! ```
//! use handbrake_bridge::lever::calibration::CalibrationTracker;
//!
//! let mut tracker = CalibrationTracker::new(100.0);
//! tracker.reset(1000.0);
//! assert_eq!(tracker.range().max_pos, 1100.0);
//!
//! tracker.observe(1800.0);
//! assert_eq!(tracker.range().max_pos, 1800.0);
//!
//! // Smaller pulls never shrink the range
//! tracker.observe(1400.0);
//! assert_eq!(tracker.range().max_pos, 1800.0);
//! ```

use serde::Serialize;

/// Empirically discovered `[rest, full pull]` bounds in raw units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationRange {
    /// Resting position captured at reset.
    pub min_pos: f64,
    /// Furthest position observed since reset.
    pub max_pos: f64,
}

impl CalibrationRange {
    /// Returns `true` when the range can be used for normalization.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.max_pos > self.min_pos
    }

    /// Width of the range in raw units.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.max_pos - self.min_pos
    }

    /// Maps a raw position onto `[0.0, 1.0]`.
    ///
    /// Returns `None` while the range is not valid.
    ///
    /// # Examples
    ///
    /// ```
    /// use handbrake_bridge::lever::calibration::CalibrationRange;
    ///
    /// let range = CalibrationRange { min_pos: 1000.0, max_pos: 2000.0 };
    /// assert_eq!(range.normalize(1500.0), Some(0.5));
    /// assert_eq!(range.normalize(500.0), Some(0.0));
    /// assert_eq!(range.normalize(2500.0), Some(1.0));
    ///
    /// let collapsed = CalibrationRange { min_pos: 1000.0, max_pos: 1000.0 };
    /// assert_eq!(collapsed.normalize(1500.0), None);
    /// ```
    #[must_use]
    pub fn normalize(&self, position: f64) -> Option<f64> {
        if !self.is_valid() {
            return None;
        }
        Some(((position - self.min_pos) / self.span()).clamp(0.0, 1.0))
    }
}

/// Owns the calibration range and applies the reset/expand rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationTracker {
    range: CalibrationRange,
    initial_span: f64,
}

impl CalibrationTracker {
    /// Creates a tracker whose range is `[0, initial_span]` until the first reset.
    ///
    /// # Arguments
    ///
    /// * `initial_span` - Distance above the rest position assumed right after reset
    #[must_use]
    pub fn new(initial_span: f64) -> Self {
        Self {
            range: CalibrationRange {
                min_pos: 0.0,
                max_pos: initial_span,
            },
            initial_span,
        }
    }

    /// Replaces the range with `[rest, rest + initial_span]`.
    pub fn reset(&mut self, rest_position: f64) {
        self.range = CalibrationRange {
            min_pos: rest_position,
            max_pos: rest_position + self.initial_span,
        };
    }

    /// Widens the upper bound if `position` exceeds it.
    ///
    /// Returns `true` when the range changed.
    pub fn observe(&mut self, position: f64) -> bool {
        if position > self.range.max_pos {
            self.range.max_pos = position;
            true
        } else {
            false
        }
    }

    /// Current calibration range.
    #[must_use]
    pub fn range(&self) -> CalibrationRange {
        self.range
    }

    /// Span applied on reset.
    #[must_use]
    pub fn initial_span(&self) -> f64 {
        self.initial_span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reset_sets_rest_and_span() {
        let mut tracker = CalibrationTracker::new(50.0);
        tracker.reset(1000.0);
        assert_eq!(tracker.range().min_pos, 1000.0);
        assert_eq!(tracker.range().max_pos, 1050.0);
        assert!(tracker.range().is_valid());
    }

    #[test]
    fn test_reset_replaces_expanded_range() {
        let mut tracker = CalibrationTracker::new(100.0);
        tracker.reset(500.0);
        tracker.observe(3500.0);
        tracker.reset(800.0);
        assert_eq!(
            tracker.range(),
            CalibrationRange {
                min_pos: 800.0,
                max_pos: 900.0
            }
        );
    }

    #[test]
    fn test_observe_expands_upper_bound() {
        let mut tracker = CalibrationTracker::new(100.0);
        tracker.reset(1000.0);
        assert!(tracker.observe(1200.0));
        assert_eq!(tracker.range().max_pos, 1200.0);
    }

    #[test]
    fn test_observe_below_max_is_ignored() {
        let mut tracker = CalibrationTracker::new(100.0);
        tracker.reset(1000.0);
        assert!(!tracker.observe(1050.0));
        assert!(!tracker.observe(1100.0));
        assert_eq!(tracker.range().max_pos, 1100.0);
    }

    #[test]
    fn test_observe_below_rest_keeps_min() {
        let mut tracker = CalibrationTracker::new(100.0);
        tracker.reset(1000.0);
        tracker.observe(200.0);
        assert_eq!(tracker.range().min_pos, 1000.0);
    }

    #[test]
    fn test_outlier_widens_range_until_reset() {
        let mut tracker = CalibrationTracker::new(100.0);
        tracker.reset(1000.0);
        tracker.observe(4095.0);
        tracker.observe(2000.0);
        assert_eq!(tracker.range().max_pos, 4095.0);

        tracker.reset(1000.0);
        assert_eq!(tracker.range().max_pos, 1100.0);
    }

    #[test]
    fn test_normalize_collapsed_range() {
        let range = CalibrationRange {
            min_pos: 1000.0,
            max_pos: 900.0,
        };
        assert!(!range.is_valid());
        assert_eq!(range.normalize(950.0), None);
    }

    proptest! {
        #[test]
        fn prop_max_non_decreasing_and_min_constant(
            rest in 0.0f64..4095.0,
            samples in prop::collection::vec(0.0f64..4095.0, 0..64),
        ) {
            let mut tracker = CalibrationTracker::new(100.0);
            tracker.reset(rest);
            let mut previous = tracker.range();
            for sample in samples {
                tracker.observe(sample);
                let current = tracker.range();
                prop_assert!(current.max_pos >= previous.max_pos);
                prop_assert_eq!(current.min_pos, rest);
                previous = current;
            }
        }

        #[test]
        fn prop_normalized_within_unit_interval(
            min in 0.0f64..4000.0,
            width in 1.0f64..4000.0,
            position in -1000.0f64..9000.0,
        ) {
            let range = CalibrationRange { min_pos: min, max_pos: min + width };
            let n = range.normalize(position).unwrap();
            prop_assert!((0.0..=1.0).contains(&n));
        }
    }
}
