//! Gaussian interference model for one receiver
//!
//! Every signal perceived in the medium, useful or not, is added to a single
//! aggregate. While a reception is in progress each change of the aggregate
//! first closes the chunk that was open against the old value, so every
//! constant-interference interval is scored exactly once.
//!
//! ## Example
//!
//! ```rust
//! use specint_core::prelude::*;
//! use std::time::Duration;
//!
//! let model = SpectrumModel::uniform(2.4e9, 1e6, 2);
//! let wanted = SpectrumValue::from_values(model.clone(), vec![10.0, 0.0]).unwrap();
//! let jammer = SpectrumValue::from_values(model.clone(), vec![4.0, 0.0]).unwrap();
//!
//! let mut rx = SpectrumInterference::new(model.clone());
//! rx.set_noise_psd(&SpectrumValue::constant(model, 1.0)).unwrap();
//! rx.set_error_model(|sinr: &SpectrumValue, _: Duration| if sinr[0] > 5.0 { 1.0 } else { 0.5 });
//!
//! rx.add_signal(&wanted, SimTime::ZERO).unwrap();
//! rx.start_rx(&wanted, SimTime::ZERO).unwrap();
//! rx.add_signal(&jammer, SimTime::from_secs(2)).unwrap();
//! let report = rx.end_rx_report(SimTime::from_secs(5)).unwrap();
//!
//! assert_eq!(report.chunks, 2);
//! assert_eq!(report.success_probability, 0.5);
//! ```

use crate::aggregate::{NegativeResiduePolicy, SignalAggregate};
use crate::chunk::{close_chunk, compute_sinr, ChunkOutcome};
use crate::decision::RxDecision;
use crate::error_model::ErrorModel;
use crate::observe::InterferenceMetrics;
use crate::session::{ReceptionSession, RxReport};
use crate::spectrum::{SpectrumModel, SpectrumValue};
use crate::types::{InterferenceError, InterferenceResult, SimTime};
use std::fmt;
use std::sync::Arc;

/// Interference accumulator and reception evaluator
pub struct SpectrumInterference {
    aggregate: SignalAggregate,
    noise: SpectrumValue,
    session: ReceptionSession,
    error_model: Option<Box<dyn ErrorModel>>,
    decision: RxDecision,
    metrics: InterferenceMetrics,
}

impl SpectrumInterference {
    /// Empty medium with zero noise over `model`
    pub fn new(model: Arc<SpectrumModel>) -> Self {
        Self {
            aggregate: SignalAggregate::new(model.clone(), NegativeResiduePolicy::default()),
            noise: SpectrumValue::zeros(model),
            session: ReceptionSession::default(),
            error_model: None,
            decision: RxDecision::default(),
            metrics: InterferenceMetrics::new(),
        }
    }

    pub fn with_error_model<M: ErrorModel + 'static>(mut self, error_model: M) -> Self {
        self.set_error_model(error_model);
        self
    }

    /// Install or replace the error model
    pub fn set_error_model<M: ErrorModel + 'static>(&mut self, error_model: M) {
        self.set_boxed_error_model(Box::new(error_model));
    }

    pub fn set_boxed_error_model(&mut self, error_model: Box<dyn ErrorModel>) {
        tracing::debug!(model = error_model.name(), "error model installed");
        self.error_model = Some(error_model);
    }

    pub fn set_decision(&mut self, decision: RxDecision) {
        self.decision = decision;
    }

    pub fn set_negative_residue_policy(&mut self, policy: NegativeResiduePolicy) {
        self.aggregate.set_policy(policy);
    }

    /// Replace the noise floor
    ///
    /// Noise is configuration rather than a medium event, so an open chunk is
    /// not closed; the new floor applies to the whole chunk when it closes.
    pub fn set_noise_psd(&mut self, noise: &SpectrumValue) -> InterferenceResult<()> {
        self.noise.check_compatible(noise)?;
        self.noise = noise.clone();
        Ok(())
    }

    /// Begin evaluating a reception of `signal` at `now`
    ///
    /// `signal` is expected to be present in the medium as well, via
    /// [`add_signal`](Self::add_signal).
    pub fn start_rx(&mut self, signal: &SpectrumValue, now: SimTime) -> InterferenceResult<()> {
        if self.error_model.is_none() {
            return Err(InterferenceError::MissingErrorModel);
        }
        self.aggregate.total().check_compatible(signal)?;
        self.aggregate.check_time(now)?;
        self.session.start(signal, now)?;
        self.aggregate.mark(now);
        self.metrics.rx_started.inc();
        tracing::debug!(at = %now, power_dbm = signal.power_dbm(), "reception started");
        Ok(())
    }

    /// End the reception at `now` and return whether it succeeded
    ///
    /// Must also be called when a reception is aborted.
    pub fn end_rx(&mut self, now: SimTime) -> InterferenceResult<bool> {
        self.end_rx_report(now).map(|report| report.success)
    }

    /// Like [`end_rx`](Self::end_rx) but with the full outcome
    pub fn end_rx_report(&mut self, now: SimTime) -> InterferenceResult<RxReport> {
        if !self.session.is_receiving() {
            return Err(InterferenceError::InvalidState("no reception in progress"));
        }
        self.aggregate.check_time(now)?;
        self.close_open_chunk(now)?;

        let rx = self.session.finish()?;
        let success_probability = rx.success_probability();
        let success = self.decision.decide(success_probability);
        if success {
            self.metrics.rx_succeeded.inc();
        } else {
            self.metrics.rx_failed.inc();
        }

        let report = RxReport {
            success,
            success_probability,
            chunks: rx.chunks(),
            skipped_chunks: rx.skipped_chunks(),
            started: rx.started(),
            ended: now,
            covered: rx.covered(),
        };
        tracing::debug!(
            at = %now,
            success,
            success_probability,
            chunks = report.chunks,
            "reception ended"
        );
        Ok(report)
    }

    /// A new signal became perceptible in the medium
    pub fn add_signal(&mut self, signal: &SpectrumValue, now: SimTime) -> InterferenceResult<()> {
        self.aggregate.total().check_compatible(signal)?;
        self.aggregate.check_time(now)?;
        self.close_open_chunk(now)?;
        self.aggregate.add(signal, now)?;
        self.metrics.signals_added.inc();
        Ok(())
    }

    /// A signal previously added with [`add_signal`](Self::add_signal) ended
    pub fn subtract_signal(&mut self, signal: &SpectrumValue, now: SimTime) -> InterferenceResult<()> {
        self.aggregate.check_time(now)?;
        let update = self.aggregate.preview_subtract(signal)?;
        self.close_open_chunk(now)?;
        self.metrics.residues_clamped.inc_by(update.clamped.len() as u64);
        self.aggregate.apply(update, now);
        self.metrics.signals_removed.inc();
        Ok(())
    }

    fn close_open_chunk(&mut self, now: SimTime) -> InterferenceResult<Option<ChunkOutcome>> {
        let Some(rx) = self.session.active_mut() else {
            return Ok(None);
        };
        let error_model = self
            .error_model
            .as_deref()
            .ok_or(InterferenceError::MissingErrorModel)?;
        let outcome = close_chunk(rx, &mut self.aggregate, &self.noise, error_model, now)?;
        match outcome {
            ChunkOutcome::Skipped => self.metrics.chunks_skipped.inc(),
            ChunkOutcome::Scored { duration, .. } => {
                self.metrics.chunks_evaluated.inc();
                self.metrics
                    .chunk_duration_us
                    .observe(duration.as_secs_f64() * 1e6);
            }
        }
        Ok(Some(outcome))
    }

    pub fn is_receiving(&self) -> bool {
        self.session.is_receiving()
    }

    pub fn session(&self) -> &ReceptionSession {
        &self.session
    }

    /// Sum of all active signals, excluding noise
    pub fn aggregate(&self) -> &SpectrumValue {
        self.aggregate.total()
    }

    pub fn noise_psd(&self) -> &SpectrumValue {
        &self.noise
    }

    pub fn last_change(&self) -> SimTime {
        self.aggregate.last_change()
    }

    pub fn model(&self) -> &Arc<SpectrumModel> {
        self.aggregate.model()
    }

    /// SINR the open chunk would be scored with, if receiving
    pub fn current_sinr(&self) -> Option<SpectrumValue> {
        let rx = self.session.active()?;
        compute_sinr(rx.tracked(), self.aggregate.total(), &self.noise).ok()
    }

    pub fn metrics(&self) -> &InterferenceMetrics {
        &self.metrics
    }
}

impl fmt::Debug for SpectrumInterference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumInterference")
            .field("aggregate", &self.aggregate)
            .field("noise", &self.noise)
            .field("session", &self.session)
            .field("error_model", &self.error_model.as_ref().map(|m| m.name()))
            .field("decision", &self.decision)
            .finish()
    }
}
