//! HID sink that logs axis writes instead of transmitting them.

use std::collections::HashMap;
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

use super::{HidAxis, HidSink};
use crate::error::Result;

/// Stand-in for a wireless gamepad link.
///
/// Reports itself connected once `pair_delay` has elapsed since creation,
/// mimicking a host pairing after power-up.
#[derive(Debug)]
pub struct LoggingHidSink {
    name: String,
    connected_at: Instant,
    last_values: HashMap<HidAxis, i32>,
    writes: u64,
}

impl LoggingHidSink {
    /// Creates a sink named `name` that pairs after `pair_delay`.
    #[must_use]
    pub fn new(name: impl Into<String>, pair_delay: Duration) -> Self {
        let name = name.into();
        info!("HID sink '{}' advertising, pairing in {:?}", name, pair_delay);
        Self {
            name,
            connected_at: Instant::now() + pair_delay,
            last_values: HashMap::new(),
            writes: 0,
        }
    }

    /// Last value written to `axis`, if any.
    #[must_use]
    pub fn last_value(&self, axis: HidAxis) -> Option<i32> {
        self.last_values.get(&axis).copied()
    }

    /// Total number of axis writes accepted.
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl HidSink for LoggingHidSink {
    fn is_connected(&self) -> bool {
        Instant::now() >= self.connected_at
    }

    fn set_axis(&mut self, axis: HidAxis, value: i32) -> Result<()> {
        debug!("{}: axis {} = {}", self.name, axis, value);
        self.last_values.insert(axis, value);
        self.writes += 1;
        Ok(())
    }
}
