//! Seeded randomness shared by every component of one simulation.
//!
//! A single `SimRng` is owned by the simulation context and lent out to
//! clocks (drift and noise draws) and the MAC (wait and backoff jitter). Same
//! seed plus same construction order gives the same run.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct SimRng {
    seed: u64,
    inner: ChaCha8Rng,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.inner.gen()
    }

    pub fn next_i32(&mut self) -> i32 {
        self.inner.gen()
    }

    pub fn next_u32(&mut self) -> u32 {
        self.inner.gen()
    }

    /// Gaussian sample via the Box-Muller transform.
    pub fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1: f64 = self.inner.gen();
        let u2: f64 = self.inner.gen();

        // Avoid log(0)
        let u1 = if u1 == 0.0 { f64::MIN_POSITIVE } else { u1 };

        let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z0
    }

    /// `base + floor(U(0,1) * spread)`, the shape of every MAC delay.
    pub fn jitter(&mut self, base: u64, spread: u64) -> u64 {
        base + (self.next_f64() * spread as f64) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SimRng::new(7);
        let mut b = SimRng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn gaussian_is_centered() {
        let mut rng = SimRng::new(42);
        let samples: Vec<f64> = (0..2000).map(|_| rng.gaussian(50.0, 10.0)).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((mean - 50.0).abs() < 1.5, "sample mean {mean} too far from 50");
    }

    #[test]
    fn jitter_stays_in_window() {
        let mut rng = SimRng::new(1);
        for _ in 0..500 {
            let v = rng.jitter(5_000, 3_200);
            assert!((5_000..8_200).contains(&v));
        }
    }
}
