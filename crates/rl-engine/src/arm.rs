//! A single Bernoulli bandit arm with a running estimate of its win rate.

use rand::Rng;
use serde::Serialize;

/// One reward source. The true probability is ground truth for the
/// simulation only; the policy sees `estimate` and `sample_count`.
#[derive(Debug, Clone, Serialize)]
pub struct Arm {
    true_probability: f64,
    estimate: f64,
    sample_count: u64,
}

impl Arm {
    pub fn new(true_probability: f64) -> Self {
        Self {
            true_probability,
            estimate: 0.0,
            sample_count: 0,
        }
    }

    pub fn true_probability(&self) -> f64 {
        self.true_probability
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Draw once from the arm: 1 with probability `true_probability`, else 0.
    /// Consumes exactly one `f64` from `rng`.
    pub fn pull<R: Rng + ?Sized>(&self, rng: &mut R) -> u8 {
        u8::from(rng.gen::<f64>() < self.true_probability)
    }

    /// Fold one observed outcome into the running mean.
    pub fn update(&mut self, outcome: u8) {
        debug_assert!(outcome <= 1, "outcome must be 0 or 1");
        let n = self.sample_count as f64;
        self.estimate = (self.estimate * n + f64::from(outcome)) / (n + 1.0);
        self.sample_count += 1;
    }
}
