//! Replays a captured lever trace.
//!
//! Trace format is plain text with one raw sample per line. Blank lines and
//! lines starting with `#` are skipped. The trace loops when exhausted.

use std::fs;
use std::path::Path;
use tracing::info;

use super::AnalogInput;
use crate::error::{HandbrakeError, Result};

/// Lever backed by a recorded sample trace.
#[derive(Debug, Clone)]
pub struct ReplayLever {
    samples: Vec<u16>,
    cursor: usize,
}

impl ReplayLever {
    /// Loads a trace file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, a line is not an integer,
    /// or the trace contains no samples.
    pub fn load<P: AsRef<Path>>(path: P, full_scale: u16) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let lever = Self::parse(&contents, full_scale)?;
        info!(
            "Loaded {} lever samples from {}",
            lever.samples.len(),
            path.display()
        );
        Ok(lever)
    }

    /// Parses trace text. Samples above `full_scale` are clamped to it.
    ///
    /// # Examples
    ///
    /// ```
    /// use handbrake_bridge::device::{AnalogInput, ReplayLever};
    ///
    /// let mut lever = ReplayLever::parse("# rest\n1000\n\n2400\n", 4095)?;
    /// assert_eq!(lever.read()?, 1000);
    /// assert_eq!(lever.read()?, 2400);
    /// assert_eq!(lever.read()?, 1000);
    /// # Ok::<(), handbrake_bridge::error::HandbrakeError>(())
    /// ```
    pub fn parse(contents: &str, full_scale: u16) -> Result<Self> {
        let mut samples = Vec::new();

        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let value: u32 = line.parse().map_err(|e| {
                HandbrakeError::Replay(format!("line {}: '{}': {}", line_no + 1, line, e))
            })?;
            samples.push(value.min(u32::from(full_scale)) as u16);
        }

        if samples.is_empty() {
            return Err(HandbrakeError::Replay("trace contains no samples".to_string()));
        }

        Ok(Self { samples, cursor: 0 })
    }

    /// Number of samples in one pass of the trace.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl AnalogInput for ReplayLever {
    fn read(&mut self) -> Result<u16> {
        let sample = self
            .samples
            .get(self.cursor)
            .copied()
            .ok_or_else(|| HandbrakeError::AnalogInput("replay cursor out of range".to_string()))?;
        self.cursor = (self.cursor + 1) % self.samples.len();
        Ok(sample)
    }
}
