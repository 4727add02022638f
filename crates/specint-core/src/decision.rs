//! Turning an accumulated success probability into a pass/fail verdict

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default threshold for [`RxDecision::Threshold`]
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

/// How the end of a reception maps probability to a verdict
#[derive(Debug, Clone)]
pub enum RxDecision {
    /// Deterministic: success iff probability exceeds the threshold
    Threshold(f64),
    /// Bernoulli draw with the given probability
    Random(StdRng),
}

impl Default for RxDecision {
    fn default() -> Self {
        Self::Threshold(DEFAULT_DECISION_THRESHOLD)
    }
}

impl RxDecision {
    pub fn threshold(threshold: f64) -> Self {
        Self::Threshold(threshold)
    }

    /// Reproducible random draws
    pub fn seeded(seed: u64) -> Self {
        Self::Random(StdRng::seed_from_u64(seed))
    }

    pub fn decide(&mut self, success_probability: f64) -> bool {
        match self {
            RxDecision::Threshold(t) => success_probability > *t,
            RxDecision::Random(rng) => rng.gen::<f64>() < success_probability,
        }
    }

    pub fn is_deterministic(&self) -> bool {
        matches!(self, RxDecision::Threshold(_))
    }
}
