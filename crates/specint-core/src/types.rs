//! Core types shared by the interference evaluator
//!
//! Simulation time is kept as an exact integer nanosecond offset so that the
//! chunk durations closed during one reception always add up to the reception
//! length without floating point residue.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::time::Duration;

/// Result type for interference operations
pub type InterferenceResult<T> = Result<T, InterferenceError>;

/// Errors that can occur while tracking interference
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterferenceError {
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    #[error("Negative aggregate residue of {residue:e} W/Hz in band {band}")]
    NumericDegeneracy { band: usize, residue: f64 },

    #[error("Spectrum model mismatch: expected {expected} bands, got {actual}")]
    SpectrumMismatch { expected: usize, actual: usize },

    #[error("Band range {start}..{end} is empty or outside the {num_bands}-band spectrum")]
    InvalidBandRange {
        start: usize,
        end: usize,
        num_bands: usize,
    },

    #[error("Time went backwards: {now} is before last change at {last_change}")]
    TimeRegression { now: SimTime, last_change: SimTime },

    #[error("Error model returned {0}, expected a probability in [0, 1]")]
    InvalidProbability(f64),

    #[error("No error model installed")]
    MissingErrorModel,
}

impl InterferenceError {
    /// Check if the simulation can keep running after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, InterferenceError::NumericDegeneracy { .. })
    }

    /// Check if this error reports misuse of the reception lifecycle
    pub fn is_state_error(&self) -> bool {
        matches!(self, InterferenceError::InvalidState(_))
    }
}

/// A point on the simulation timeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTime(Duration);

impl SimTime {
    pub const ZERO: SimTime = SimTime(Duration::ZERO);

    pub fn from_nanos(nanos: u64) -> Self {
        Self(Duration::from_nanos(nanos))
    }

    pub fn from_micros(micros: u64) -> Self {
        Self(Duration::from_micros(micros))
    }

    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// Rounds to the nearest nanosecond. Negative or non-finite inputs saturate to zero.
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            Self::from_nanos((secs * 1e9).round() as u64)
        } else {
            Self::ZERO
        }
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }

    pub fn as_nanos(&self) -> u128 {
        self.0.as_nanos()
    }

    /// Offset from the start of the simulation
    pub fn since_start(&self) -> Duration {
        self.0
    }

    /// Elapsed time since `earlier`, `None` if `earlier` is later than `self`
    pub fn checked_duration_since(&self, earlier: SimTime) -> Option<Duration> {
        self.0.checked_sub(earlier.0)
    }

    /// `self + d`, `None` on overflow
    pub fn checked_add(&self, d: Duration) -> Option<SimTime> {
        self.0.checked_add(d).map(SimTime)
    }
}

/// Panics on overflow, see [`SimTime::checked_add`]
impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl From<Duration> for SimTime {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.9}s", self.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_since() {
        let a = SimTime::from_millis(2);
        let b = SimTime::from_millis(5);
        assert_eq!(b.checked_duration_since(a), Some(Duration::from_millis(3)));
        assert_eq!(a.checked_duration_since(b), None);
        assert_eq!(a.checked_duration_since(a), Some(Duration::ZERO));
    }

    #[test]
    fn test_from_secs_f64_saturates() {
        assert_eq!(SimTime::from_secs_f64(-1.0), SimTime::ZERO);
        assert_eq!(SimTime::from_secs_f64(f64::NAN), SimTime::ZERO);
        assert_eq!(SimTime::from_secs_f64(1.5), SimTime::from_millis(1500));
    }

    #[test]
    fn test_checked_add_overflow() {
        let t = SimTime::from_secs(1);
        assert_eq!(t.checked_add(Duration::from_secs(2)), Some(SimTime::from_secs(3)));
        assert_eq!(t.checked_add(Duration::MAX), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", SimTime::from_millis(1500)), "1.500000000s");
    }

    #[test]
    fn test_error_classification() {
        let e = InterferenceError::NumericDegeneracy { band: 0, residue: -1.0 };
        assert!(e.is_recoverable());
        assert!(!e.is_state_error());
        assert!(InterferenceError::InvalidState("idle").is_state_error());
    }
}
