//! # Diagnostics Module
//!
//! Periodic status reporting for the control loop.
//!
//! This module handles:
//! - Snapshotting controller state every N ticks
//! - Logging human-readable status lines
//! - Optionally appending reports to rotating JSONL files
//!
//! Diagnostics are purely observational. Nothing here feeds back into the
//! control path, and a recorder failure never stops the loop.

use tracing::{info, warn};

pub mod recorder;
pub mod report;

pub use recorder::JsonlRecorder;
pub use report::DiagnosticsReport;

use crate::config::DiagnosticsConfig;
use crate::error::Result;

/// Decides when to report and where reports go.
#[derive(Debug)]
pub struct Diagnostics {
    interval_ticks: u64,
    recorder: Option<JsonlRecorder>,
}

impl Diagnostics {
    /// Creates a diagnostics emitter that logs only.
    #[must_use]
    pub fn new(interval_ticks: u64) -> Self {
        Self {
            interval_ticks: interval_ticks.max(1),
            recorder: None,
        }
    }

    /// Builds from the `[diagnostics]` config section.
    ///
    /// # Errors
    ///
    /// Returns error if recording is enabled and the log directory cannot be created.
    pub fn from_config(config: &DiagnosticsConfig) -> Result<Self> {
        let mut diagnostics = Self::new(config.interval_ticks);
        if config.record_enabled {
            diagnostics.recorder = Some(JsonlRecorder::new(
                &config.log_dir,
                config.max_records_per_file,
                config.max_files_to_keep,
            )?);
        }
        Ok(diagnostics)
    }

    /// Attaches a recorder.
    #[must_use]
    pub fn with_recorder(mut self, recorder: JsonlRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Whether a report is due on `tick` (counted from 0).
    #[must_use]
    pub fn is_due(&self, tick: u64) -> bool {
        tick % self.interval_ticks == 0
    }

    /// Logs the report and records it if a recorder is attached.
    pub fn emit(&mut self, report: &DiagnosticsReport) {
        for line in report.lines() {
            info!("{}", line);
        }

        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(e) = recorder.record(report) {
                warn!("Failed to record diagnostics: {}", e);
            }
        }
    }

    #[must_use]
    pub fn recorder(&self) -> Option<&JsonlRecorder> {
        self.recorder.as_ref()
    }
}
