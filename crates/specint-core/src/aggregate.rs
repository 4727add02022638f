//! Running sum of every signal currently active in the medium
//!
//! The aggregate excludes noise and includes the tracked signal. It changes
//! only through matched add/subtract calls; the time of the last change marks
//! the start of the chunk that is currently open.
//!
//! Rounding error in a band grows with the largest values summed into it, not
//! with what is left. Each band therefore keeps the sum of magnitudes added
//! since it was last empty, and residues are judged against that. A band is
//! empty once every signal that put power into it has been removed.

use crate::spectrum::{SpectrumModel, SpectrumValue};
use crate::types::{InterferenceError, InterferenceResult, SimTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Relative size, against the band's running magnitude, below which a
/// negative residue is treated as rounding error
pub const RESIDUE_REL_TOLERANCE: f64 = 1e-9;

/// What to do when a subtraction would leave a band negative
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeResiduePolicy {
    /// Clamp the band to zero and report it
    #[default]
    Clamp,
    /// Refuse the subtraction and leave the aggregate untouched
    Reject,
}

/// Result of a previewed subtraction, applied with [`SignalAggregate::apply`]
#[derive(Debug, Clone)]
pub struct AggregateUpdate {
    values: Vec<f64>,
    magnitude: Vec<f64>,
    contributors: Vec<u32>,
    /// Bands clamped to zero, with the residue they would have held
    pub clamped: Vec<(usize, f64)>,
}

/// Active-signal aggregate with its last-change timestamp
#[derive(Debug, Clone)]
pub struct SignalAggregate {
    total: SpectrumValue,
    /// Per band, sum of |added| since the band was last empty
    magnitude: Vec<f64>,
    /// Per band, number of active signals with power in it
    contributors: Vec<u32>,
    last_change: SimTime,
    policy: NegativeResiduePolicy,
}

impl SignalAggregate {
    pub fn new(model: Arc<SpectrumModel>, policy: NegativeResiduePolicy) -> Self {
        Self {
            magnitude: vec![0.0; model.num_bands()],
            contributors: vec![0; model.num_bands()],
            total: SpectrumValue::zeros(model),
            last_change: SimTime::ZERO,
            policy,
        }
    }

    pub fn total(&self) -> &SpectrumValue {
        &self.total
    }

    pub fn model(&self) -> &Arc<SpectrumModel> {
        self.total.model()
    }

    pub fn last_change(&self) -> SimTime {
        self.last_change
    }

    pub fn policy(&self) -> NegativeResiduePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: NegativeResiduePolicy) {
        self.policy = policy;
    }

    /// Fails if `now` is earlier than the last change
    pub fn check_time(&self, now: SimTime) -> InterferenceResult<()> {
        if now < self.last_change {
            return Err(InterferenceError::TimeRegression {
                now,
                last_change: self.last_change,
            });
        }
        Ok(())
    }

    /// Advance the last-change timestamp without touching the sum
    pub fn mark(&mut self, now: SimTime) {
        self.last_change = now;
    }

    pub fn add(&mut self, signal: &SpectrumValue, now: SimTime) -> InterferenceResult<()> {
        self.total.check_compatible(signal)?;
        self.total += signal;
        for (band, &v) in signal.values().iter().enumerate() {
            if v != 0.0 {
                self.magnitude[band] += v.abs();
                self.contributors[band] += 1;
            }
        }
        self.last_change = now;
        Ok(())
    }

    /// Compute the aggregate after removing `signal` without committing it
    pub fn preview_subtract(&self, signal: &SpectrumValue) -> InterferenceResult<AggregateUpdate> {
        self.total.check_compatible(signal)?;
        let mut values = Vec::with_capacity(self.total.len());
        let mut magnitude = self.magnitude.clone();
        let mut contributors = self.contributors.clone();
        let mut clamped = Vec::new();
        for (band, (&current, &removed)) in self.total.values().iter().zip(signal.values()).enumerate() {
            let mut v = current - removed;
            let tolerance =
                RESIDUE_REL_TOLERANCE * magnitude[band].max(current.abs()).max(removed.abs());
            if v < 0.0 {
                if -v > tolerance {
                    if self.policy == NegativeResiduePolicy::Reject {
                        return Err(InterferenceError::NumericDegeneracy { band, residue: v });
                    }
                    clamped.push((band, v));
                }
                v = 0.0;
            }
            if removed != 0.0 {
                contributors[band] = contributors[band].saturating_sub(1);
            }
            if contributors[band] == 0 {
                magnitude[band] = 0.0;
                // Rounding left behind by the last matched removal
                if v <= tolerance {
                    v = 0.0;
                }
            }
            values.push(v);
        }
        Ok(AggregateUpdate {
            values,
            magnitude,
            contributors,
            clamped,
        })
    }

    pub fn apply(&mut self, update: AggregateUpdate, now: SimTime) {
        for &(band, residue) in &update.clamped {
            tracing::warn!(band, residue, "negative aggregate residue clamped to zero");
        }
        self.total.values_mut().copy_from_slice(&update.values);
        self.magnitude = update.magnitude;
        self.contributors = update.contributors;
        self.last_change = now;
    }

    pub fn subtract(&mut self, signal: &SpectrumValue, now: SimTime) -> InterferenceResult<usize> {
        let update = self.preview_subtract(signal)?;
        let clamped = update.clamped.len();
        self.apply(update, now);
        Ok(clamped)
    }
}
