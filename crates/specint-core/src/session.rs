//! Reception session state machine
//!
//! ```text
//!          start_rx(signal)
//!   Idle ───────────────────► Receiving
//!     ▲                           │
//!     └───────────────────────────┘
//!              end_rx()
//! ```

use crate::spectrum::SpectrumValue;
use crate::types::{InterferenceError, InterferenceResult, SimTime};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A reception attempt in progress
#[derive(Debug, Clone)]
pub struct ActiveReception {
    tracked: SpectrumValue,
    started: SimTime,
    success_probability: f64,
    chunks: usize,
    skipped_chunks: usize,
    covered: Duration,
}

impl ActiveReception {
    fn new(tracked: SpectrumValue, started: SimTime) -> Self {
        Self {
            tracked,
            started,
            success_probability: 1.0,
            chunks: 0,
            skipped_chunks: 0,
            covered: Duration::ZERO,
        }
    }

    pub fn tracked(&self) -> &SpectrumValue {
        &self.tracked
    }

    pub fn started(&self) -> SimTime {
        self.started
    }

    /// Product of the success probabilities of the chunks closed so far
    pub fn success_probability(&self) -> f64 {
        self.success_probability
    }

    /// Chunks scored by the error model
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Zero-length chunks that never reached the error model
    pub fn skipped_chunks(&self) -> usize {
        self.skipped_chunks
    }

    /// Sum of the durations of all chunks scored so far
    pub fn covered(&self) -> Duration {
        self.covered
    }

    pub(crate) fn fold(&mut self, chunk_probability: f64, duration: Duration) {
        self.success_probability *= chunk_probability;
        self.chunks += 1;
        self.covered += duration;
    }

    pub(crate) fn skip(&mut self) {
        self.skipped_chunks += 1;
    }
}

/// Session lifecycle holder
#[derive(Debug, Clone, Default)]
pub enum ReceptionSession {
    #[default]
    Idle,
    Receiving(ActiveReception),
}

impl ReceptionSession {
    pub fn is_receiving(&self) -> bool {
        matches!(self, ReceptionSession::Receiving(_))
    }

    pub fn active(&self) -> Option<&ActiveReception> {
        match self {
            ReceptionSession::Receiving(rx) => Some(rx),
            ReceptionSession::Idle => None,
        }
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut ActiveReception> {
        match self {
            ReceptionSession::Receiving(rx) => Some(rx),
            ReceptionSession::Idle => None,
        }
    }

    /// Enter `Receiving`, tracking an owned copy of `signal`
    pub fn start(&mut self, signal: &SpectrumValue, now: SimTime) -> InterferenceResult<()> {
        if self.is_receiving() {
            return Err(InterferenceError::InvalidState("reception already in progress"));
        }
        *self = ReceptionSession::Receiving(ActiveReception::new(signal.clone(), now));
        Ok(())
    }

    /// Leave `Receiving`, handing back the finished attempt
    pub fn finish(&mut self) -> InterferenceResult<ActiveReception> {
        match std::mem::take(self) {
            ReceptionSession::Receiving(rx) => Ok(rx),
            ReceptionSession::Idle => Err(InterferenceError::InvalidState("no reception in progress")),
        }
    }
}

/// Outcome of one reception attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RxReport {
    pub success: bool,
    pub success_probability: f64,
    pub chunks: usize,
    pub skipped_chunks: usize,
    pub started: SimTime,
    pub ended: SimTime,
    pub covered: Duration,
}

impl RxReport {
    pub fn duration(&self) -> Duration {
        self.ended.checked_duration_since(self.started).unwrap_or_default()
    }
}
