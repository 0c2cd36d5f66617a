//! Drifting hardware clock driven by the scheduler.
//!
//! ## Units
//!
//! | Quantity   | Unit                  | Description                                      |
//! |------------|-----------------------|--------------------------------------------------|
//! | advance()  | scheduler ticks       | Ideal time elapsed since the previous advance    |
//! | drift      | fraction (1e-6 = ppm) | Fixed rate error, positive means the clock runs fast |
//! | noise      | fraction              | Redrawn on each advance, zero mean               |
//! | value()    | clock ticks           | 32-bit wrapping counter                          |

use crate::clock::ClockConfig;
use crate::register::Register;
use crate::rng::SimRng;

/// Simulated oscillator feeding a 32-bit counter.
#[derive(Debug, Clone)]
pub struct Clock {
    /// Counter value seen by software
    value: Register,
    /// Sub-tick remainder carried between advances
    fraction: f64,
    /// Fixed drift, drawn once at construction
    drift: f64,
    /// Standard deviation of the per-advance noise, as a fraction
    noise_deviation: f64,
}

impl Clock {
    /// Zero-drift, noise-free clock.
    pub fn reference() -> Self {
        Self::with_drift(0.0, 0.0)
    }

    /// Draws a drift from the configured distribution.
    pub fn drifting(config: &ClockConfig, rng: &mut SimRng) -> Self {
        let drift_ppm = rng.gaussian(config.mean_drift_ppm, config.drift_deviation_ppm);
        Self::with_drift(drift_ppm / 1_000_000.0, config.noise_deviation / 100_000_000.0)
    }

    pub fn with_drift(drift: f64, noise_deviation: f64) -> Self {
        Self {
            value: Register::ZERO,
            fraction: 0.0,
            drift,
            noise_deviation,
        }
    }

    pub fn is_reference(&self) -> bool {
        self.drift == 0.0 && self.noise_deviation == 0.0
    }

    /// Progresses the counter by `ticks + ticks * (drift + noise)`.
    pub fn advance(&mut self, ticks: u64, rng: &mut SimRng) {
        if ticks == 0 {
            return;
        }
        let noise = if self.noise_deviation > 0.0 {
            rng.gaussian(0.0, self.noise_deviation)
        } else {
            0.0
        };

        let amount = ticks as f64;
        let total = self.fraction + amount + amount * (self.drift + noise);
        let whole = total.floor();
        self.fraction = total - whole;
        self.value = self.value.add(Register::from_long(whole as i64 as u64));
    }

    pub fn value(&self) -> Register {
        self.value
    }

    pub fn set_value(&mut self, value: Register) {
        self.value = value;
        self.fraction = 0.0;
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }

    pub fn set_drift(&mut self, drift: f64) {
        self.drift = drift;
    }
}
