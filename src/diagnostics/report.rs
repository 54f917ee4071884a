//! Periodic status snapshot of the control loop.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::lever::{CalibrationRange, HandbrakeController, OperatingMode};

/// Cells in the engagement bar.
const BAR_CELLS: usize = 10;

/// Snapshot of the controller taken every N ticks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsReport {
    /// RFC 3339 UTC timestamp.
    pub timestamp: String,
    pub tick: u64,
    pub faults: u64,
    pub connected: bool,
    pub mode: OperatingMode,
    pub raw: Option<u16>,
    pub stable: Option<f64>,
    pub range: CalibrationRange,
    pub normalized: Option<f64>,
    pub output: Option<i32>,
}

impl DiagnosticsReport {
    /// Captures the controller state.
    #[must_use]
    pub fn capture(controller: &HandbrakeController, connected: bool, tick: u64, faults: u64) -> Self {
        let state = controller.state();
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            tick,
            faults,
            connected,
            mode: controller.mode(),
            raw: state.last_raw,
            stable: state.last_stable,
            range: controller.range(),
            normalized: state.last_output.map(|o| o.normalized),
            output: state.last_output.map(|o| o.quantized),
        }
    }

    /// Ten-cell `#`/`-` bar showing how far the lever is engaged.
    ///
    /// # Examples
    ///
    /// ```
    /// use handbrake_bridge::diagnostics::DiagnosticsReport;
    ///
    /// assert_eq!(DiagnosticsReport::engagement_bar(0.0), "----------");
    /// assert_eq!(DiagnosticsReport::engagement_bar(0.5), "#####-----");
    /// assert_eq!(DiagnosticsReport::engagement_bar(1.0), "##########");
    /// ```
    #[must_use]
    pub fn engagement_bar(normalized: f64) -> String {
        let filled = (normalized.clamp(0.0, 1.0) * BAR_CELLS as f64).round() as usize;
        (0..BAR_CELLS)
            .map(|i| if i < filled { '#' } else { '-' })
            .collect()
    }

    /// Human-readable status lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let normalized = self.normalized.unwrap_or(0.0);
        let fmt_opt = |v: Option<String>| v.unwrap_or_else(|| "n/a".to_string());

        vec![
            format!(
                "HID {} | mode {} | tick {} | faults {}",
                if self.connected { "connected" } else { "not connected" },
                self.mode,
                self.tick,
                self.faults
            ),
            format!(
                "Raw: {}  Stable: {}  (Range: {:.0} - {:.0})",
                fmt_opt(self.raw.map(|r| r.to_string())),
                fmt_opt(self.stable.map(|s| format!("{:.0}", s))),
                self.range.min_pos,
                self.range.max_pos
            ),
            format!(
                "Output: {} ({:.1}%) [{}]",
                fmt_opt(self.output.map(|o| o.to_string())),
                normalized * 100.0,
                Self::engagement_bar(normalized)
            ),
        ]
    }
}
