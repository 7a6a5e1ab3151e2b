//! Scripted frame driver
//!
//! Stands in for the real display-refresh driver: a manual clock plus a
//! registry, stepped in scripted frames. Jittered stepping uses a seeded
//! RNG so degraded-refresh scenarios stay reproducible.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tempo_ticker::{FrameClock, FrameDriver, ManualClock, TickerRegistry};

/// Nominal 60 fps frame step
pub const FRAME_STEP: Duration = Duration::from_millis(16);

pub struct ScriptedDriver {
    pub clock: Arc<ManualClock>,
    pub driver: Arc<FrameDriver>,
    pub registry: Arc<TickerRegistry>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new());
        let driver = FrameDriver::new(clock.clone());
        let registry = Arc::new(TickerRegistry::new(driver.clone()));
        ScriptedDriver {
            clock,
            driver,
            registry,
        }
    }

    /// Advance the clock by `dt` and fire one refresh
    pub fn step(&self, dt: Duration) {
        self.clock.advance(dt);
        self.driver.tick();
    }

    /// Run `frames` fixed-step refreshes
    pub fn run_frames(&self, frames: usize, dt: Duration) {
        for _ in 0..frames {
            self.step(dt);
        }
    }

    /// Run `frames` refreshes with per-frame jitter of up to `jitter_us`
    /// microseconds around `base`. Returns the total real time advanced.
    pub fn run_jittered(
        &self,
        frames: usize,
        base: Duration,
        jitter_us: i64,
        seed: u64,
    ) -> Duration {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut total = Duration::ZERO;
        for _ in 0..frames {
            let offset = if jitter_us > 0 {
                rng.gen_range(-jitter_us..=jitter_us)
            } else {
                0
            };
            let dt_us = (base.as_micros() as i64 + offset).max(0) as u64;
            let dt = Duration::from_micros(dt_us);
            total += dt;
            self.step(dt);
        }
        total
    }
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}
