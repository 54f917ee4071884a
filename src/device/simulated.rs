//! Simulated lever and button for bench runs without hardware.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{AnalogInput, DigitalButton};
use crate::error::Result;

/// Samples per pull/release cycle of the simulated lever.
const DEFAULT_CYCLE_SAMPLES: u32 = 400;

/// Lever that is pulled and released in a repeating cycle.
///
/// Each cycle rests for half its length, ramps up to the full pull over an
/// eighth, holds for an eighth and ramps back down over an eighth. Every
/// sample has seeded uniform jitter added, so runs are reproducible.
#[derive(Debug)]
pub struct SimulatedLever {
    rest: u16,
    full_pull: u16,
    full_scale: u16,
    cycle_samples: u32,
    jitter: i32,
    sample_index: u32,
    rng: StdRng,
}

impl SimulatedLever {
    /// Creates a lever resting at `rest` and reaching `full_pull`.
    ///
    /// # Arguments
    ///
    /// * `rest` - Raw value while released
    /// * `full_pull` - Raw value at the end of travel
    /// * `full_scale` - ADC full-scale; samples are clamped to it
    /// * `jitter` - Maximum noise amplitude in raw units
    /// * `seed` - RNG seed for the noise
    #[must_use]
    pub fn new(rest: u16, full_pull: u16, full_scale: u16, jitter: u16, seed: u64) -> Self {
        Self {
            rest,
            full_pull,
            full_scale,
            cycle_samples: DEFAULT_CYCLE_SAMPLES,
            jitter: i32::from(jitter),
            sample_index: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Builds a lever for a given ADC full-scale: rests at 10%, pulls to 85%,
    /// with jitter at a quarter of `tolerance`.
    #[must_use]
    pub fn for_full_scale(full_scale: u16, tolerance: f64, seed: u64) -> Self {
        let scale = f64::from(full_scale);
        let jitter = (tolerance / 4.0).clamp(0.0, f64::from(u16::MAX)) as u16;
        Self::new(
            (scale * 0.10) as u16,
            (scale * 0.85) as u16,
            full_scale,
            jitter,
            seed,
        )
    }

    /// Overrides the cycle length (minimum 8 samples).
    #[must_use]
    pub fn with_cycle_samples(mut self, cycle_samples: u32) -> Self {
        self.cycle_samples = cycle_samples.max(8);
        self
    }

    /// Noise-free position for a sample index.
    fn profile(&self, index: u32) -> f64 {
        let rest = f64::from(self.rest);
        let travel = f64::from(self.full_pull) - rest;
        let eighth = f64::from(self.cycle_samples) / 8.0;
        let phase = f64::from(index % self.cycle_samples);

        if phase < 4.0 * eighth {
            rest
        } else if phase < 5.0 * eighth {
            rest + travel * (phase - 4.0 * eighth) / eighth
        } else if phase < 6.0 * eighth {
            rest + travel
        } else if phase < 7.0 * eighth {
            rest + travel * (7.0 * eighth - phase) / eighth
        } else {
            rest
        }
    }
}

impl AnalogInput for SimulatedLever {
    fn read(&mut self) -> Result<u16> {
        let base = self.profile(self.sample_index);
        self.sample_index = self.sample_index.wrapping_add(1);

        let noise = if self.jitter > 0 {
            self.rng.gen_range(-self.jitter..=self.jitter)
        } else {
            0
        };

        let value = (base.round() as i32 + noise).clamp(0, i32::from(self.full_scale));
        Ok(value as u16)
    }
}

/// Button held at a constant level.
#[derive(Debug, Clone, Copy)]
pub struct FixedButton {
    level: bool,
}

impl FixedButton {
    #[must_use]
    pub fn new(level: bool) -> Self {
        Self { level }
    }
}

impl DigitalButton for FixedButton {
    fn read(&mut self) -> Result<bool> {
        Ok(self.level)
    }
}
