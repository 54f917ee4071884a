//! # Runtime Module
//!
//! Startup sequence and the fixed-cadence control loop.
//!
//! ## Startup
//!
//! 1. Reset calibration against the first lever sample (the lever is assumed at rest)
//! 2. Poll the HID sink until it reports connected or the connect timeout passes
//! 3. If connected, send the released axis value once
//!
//! ## Main Loop
//!
//! One [`HandbrakeController::tick`] per scheduler period. A failed tick is
//! logged and counted, and the loop carries on. Every N ticks a diagnostics
//! report is emitted.

use std::future::Future;
use tokio::time::{sleep, Duration, Instant};
use tracing::{info, warn};

pub mod scheduler;

pub use scheduler::TickScheduler;

use crate::config::TimingConfig;
use crate::device::{AnalogInput, Devices, DigitalButton, HidSink};
use crate::diagnostics::{Diagnostics, DiagnosticsReport};
use crate::error::Result;
use crate::lever::{HandbrakeController, TickOutcome};

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Ticks executed.
    pub ticks: u64,
    /// Ticks that failed with a collaborator error.
    pub faults: u64,
    /// Axis values sent to the HID sink.
    pub sent: u64,
}

/// Owns the controller, its devices and diagnostics for the process lifetime.
#[derive(Debug)]
pub struct Runtime<A, B, H> {
    controller: HandbrakeController,
    devices: Devices<A, B, H>,
    diagnostics: Diagnostics,
    tick_period: Duration,
    connect_timeout: Duration,
    connect_poll: Duration,
    summary: RunSummary,
}

impl<A, B, H> Runtime<A, B, H>
where
    A: AnalogInput,
    B: DigitalButton,
    H: HidSink,
{
    /// Creates a runtime using the `[timing]` config section.
    pub fn new(
        controller: HandbrakeController,
        devices: Devices<A, B, H>,
        diagnostics: Diagnostics,
        timing: &TimingConfig,
    ) -> Self {
        Self {
            controller,
            devices,
            diagnostics,
            tick_period: Duration::from_millis(timing.tick_interval_ms),
            connect_timeout: Duration::from_millis(timing.connect_timeout_ms),
            connect_poll: Duration::from_millis(timing.connect_poll_ms),
            summary: RunSummary::default(),
        }
    }

    /// Runs the startup sequence.
    ///
    /// Returns whether the HID sink connected within the timeout. A sink that
    /// is still down is not an error; the loop will send once it comes up.
    ///
    /// # Errors
    ///
    /// Returns error if the initial lever sample cannot be read.
    pub async fn start(&mut self) -> Result<bool> {
        self.controller.calibrate_at_rest(&mut self.devices.lever)?;

        info!(
            "Waiting up to {:?} for HID connection",
            self.connect_timeout
        );
        let connected = self.wait_for_connection().await;

        if connected {
            info!("HID connected");
            if let Err(e) = self.controller.send_released(&mut self.devices.hid) {
                warn!("Failed to send released value: {}", e);
            }
        } else {
            warn!("HID not connected after {:?}, continuing", self.connect_timeout);
        }

        Ok(connected)
    }

    async fn wait_for_connection(&self) -> bool {
        let deadline = Instant::now() + self.connect_timeout;
        loop {
            if self.devices.hid.is_connected() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            sleep(self.connect_poll.min(deadline - now)).await;
        }
    }

    /// Executes one tick with fault containment and diagnostics.
    ///
    /// Returns the tick outcome, or `None` if the tick failed.
    pub fn step(&mut self) -> Option<TickOutcome> {
        let tick = self.summary.ticks;

        let outcome = match self.controller.tick(&mut self.devices) {
            Ok(outcome) => {
                if let TickOutcome::Conditioned { sent: true, .. } = outcome {
                    self.summary.sent += 1;
                }
                Some(outcome)
            }
            Err(e) => {
                self.summary.faults += 1;
                warn!("Tick {} failed: {}", tick, e);
                None
            }
        };

        if self.diagnostics.is_due(tick) {
            let report = DiagnosticsReport::capture(
                &self.controller,
                self.devices.hid.is_connected(),
                tick,
                self.summary.faults,
            );
            self.diagnostics.emit(&report);
        }

        self.summary.ticks += 1;
        outcome
    }

    /// Runs ticks at the configured period until `shutdown` completes or
    /// `max_ticks` ticks have run.
    pub async fn run_until<F>(&mut self, shutdown: F, max_ticks: Option<u64>) -> RunSummary
    where
        F: Future,
    {
        let mut scheduler = TickScheduler::new(self.tick_period);
        tokio::pin!(shutdown);

        info!(
            "Starting control loop at {}Hz",
            1000 / self.tick_period.as_millis().max(1)
        );

        loop {
            if max_ticks.is_some_and(|max| self.summary.ticks >= max) {
                info!("Tick limit reached");
                break;
            }

            tokio::select! {
                _ = scheduler.wait() => {
                    self.step();
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        info!(
            "Control loop stopped: {} ticks, {} faults, {} values sent",
            self.summary.ticks, self.summary.faults, self.summary.sent
        );
        self.summary
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    #[must_use]
    pub fn controller(&self) -> &HandbrakeController {
        &self.controller
    }

    #[must_use]
    pub fn devices(&self) -> &Devices<A, B, H> {
        &self.devices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{
        FixedButton, HidAxis, LoggingHidSink, MockAnalogInput, ReplayLever,
    };
    use crate::error::HandbrakeError;
    use crate::lever::{AxisRange, OperatingMode, SignalConditioner};
    use std::future::pending;

    fn controller() -> HandbrakeController {
        let conditioner = SignalConditioner::new(81.9, 0.10, AxisRange::new(0, 127));
        HandbrakeController::new(conditioner, 100.0, HidAxis::Y)
    }

    fn timing(tick_ms: u64, timeout_ms: u64, poll_ms: u64) -> TimingConfig {
        TimingConfig {
            tick_interval_ms: tick_ms,
            connect_timeout_ms: timeout_ms,
            connect_poll_ms: poll_ms,
        }
    }

    fn replay_runtime(
        trace: &str,
        pair_delay: Duration,
        timing: &TimingConfig,
    ) -> Runtime<ReplayLever, FixedButton, LoggingHidSink> {
        let devices = Devices::new(
            ReplayLever::parse(trace, 4095).unwrap(),
            FixedButton::new(true),
            LoggingHidSink::new("test", pair_delay),
        );
        Runtime::new(controller(), devices, Diagnostics::new(1000), timing)
    }

    // ==================== Startup Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_start_waits_for_connection_then_sends_released() {
        let mut runtime = replay_runtime(
            "1000\n",
            Duration::from_millis(300),
            &timing(10, 5000, 100),
        );

        let start = Instant::now();
        assert!(runtime.start().await.unwrap());
        assert_eq!(start.elapsed(), Duration::from_millis(300));

        assert_eq!(runtime.controller().range().min_pos, 1000.0);
        assert_eq!(runtime.devices().hid.last_value(HidAxis::Y), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_gives_up_after_timeout() {
        let mut runtime = replay_runtime(
            "1000\n",
            Duration::from_secs(10),
            &timing(10, 1000, 300),
        );

        let start = Instant::now();
        assert!(!runtime.start().await.unwrap());
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
        assert_eq!(runtime.devices().hid.writes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_fails_when_lever_unreadable() {
        let mut lever = MockAnalogInput::new();
        lever
            .expect_read()
            .returning(|| Err(HandbrakeError::AnalogInput("no adc".to_string())));
        let devices = Devices::new(
            lever,
            FixedButton::new(true),
            LoggingHidSink::new("test", Duration::ZERO),
        );
        let mut runtime = Runtime::new(
            controller(),
            devices,
            Diagnostics::new(1000),
            &timing(10, 100, 10),
        );

        assert!(runtime.start().await.is_err());
    }

    // ==================== Loop Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_loop_runs_at_fixed_cadence() {
        let mut runtime = replay_runtime("1000\n", Duration::ZERO, &timing(10, 0, 10));
        runtime.start().await.unwrap();

        let start = Instant::now();
        let summary = runtime.run_until(pending::<()>(), Some(5)).await;

        assert_eq!(summary.ticks, 5);
        assert_eq!(start.elapsed(), Duration::from_millis(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stops_on_shutdown() {
        let mut runtime = replay_runtime("1000\n", Duration::ZERO, &timing(10, 0, 10));
        runtime.start().await.unwrap();

        let summary = runtime
            .run_until(sleep(Duration::from_millis(95)), None)
            .await;

        // Ticks at 0, 10, ..., 90
        assert_eq!(summary.ticks, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pull_and_release_reaches_sink() {
        let trace = "1000\n1000\n1500\n2500\n3000\n3000\n1500\n1000\n1000\n";
        let mut runtime = replay_runtime(trace, Duration::ZERO, &timing(10, 0, 10));
        runtime.start().await.unwrap();

        // Startup consumed the first sample
        let summary = runtime.run_until(pending::<()>(), Some(8)).await;

        assert_eq!(summary.faults, 0);
        assert_eq!(runtime.controller().range().max_pos, 3000.0);
        assert_eq!(runtime.controller().mode(), OperatingMode::Run);
        assert_eq!(runtime.devices().hid.last_value(HidAxis::Y), Some(0));
        // released at startup, then first reading, 1500, 2500, 3000, 1500, 1000
        assert_eq!(runtime.devices().hid.writes(), 7);
        assert_eq!(summary.sent, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_faults_do_not_stop_the_loop() {
        let mut lever = MockAnalogInput::new();
        lever
            .expect_read()
            .returning(|| Err(HandbrakeError::AnalogInput("adc timeout".to_string())));
        let devices = Devices::new(
            lever,
            FixedButton::new(true),
            LoggingHidSink::new("test", Duration::ZERO),
        );
        let mut runtime = Runtime::new(
            controller(),
            devices,
            Diagnostics::new(2),
            &timing(10, 0, 10),
        );

        let summary = runtime.run_until(pending::<()>(), Some(6)).await;

        assert_eq!(summary.ticks, 6);
        assert_eq!(summary.faults, 6);
        assert_eq!(summary.sent, 0);
    }

    #[test]
    fn test_step_counts_sent_values() {
        let mut runtime = replay_runtime("1000\n3000\n", Duration::ZERO, &timing(10, 0, 10));

        let first = runtime.step();
        assert!(matches!(first, Some(TickOutcome::Conditioned { sent: true, .. })));
        let second = runtime.step();
        assert!(matches!(second, Some(TickOutcome::Conditioned { sent: true, .. })));

        assert_eq!(runtime.summary().ticks, 2);
        assert_eq!(runtime.summary().sent, 2);
    }
}
