//! Chunk evaluation
//!
//! Between two medium events the aggregate is constant, so the interval since
//! the last change is scored as a single chunk:
//!
//! ```text
//!   aggregate ─┐      ┌──────┐
//!              └──────┘      └────
//!   chunks   [ c0 ][   c1   ][ c2 ]
//!            t0    t1       t2    now
//! ```
//!
//! Each closed chunk multiplies the running success probability by the error
//! model's verdict for its SINR and duration.

use crate::aggregate::SignalAggregate;
use crate::error_model::ErrorModel;
use crate::session::ActiveReception;
use crate::spectrum::SpectrumValue;
use crate::types::{InterferenceError, InterferenceResult, SimTime};
use std::time::Duration;

/// What happened when a chunk was closed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChunkOutcome {
    /// Zero-length chunk, no effect on the running probability
    Skipped,
    Scored { duration: Duration, probability: f64 },
}

/// SINR of the tracked signal against everything else plus noise
///
/// Per band: `tracked / (aggregate - tracked + noise)`. Bands without tracked
/// power yield 0; tracked power over a zero denominator yields infinity.
pub fn compute_sinr(
    tracked: &SpectrumValue,
    aggregate: &SpectrumValue,
    noise: &SpectrumValue,
) -> InterferenceResult<SpectrumValue> {
    tracked.check_compatible(aggregate)?;
    tracked.check_compatible(noise)?;
    let values = tracked
        .values()
        .iter()
        .zip(aggregate.values())
        .zip(noise.values())
        .map(|((&s, &total), &n)| {
            if s <= 0.0 {
                return 0.0;
            }
            let interference = (total - s).max(0.0);
            let denominator = interference + n;
            if denominator > 0.0 {
                s / denominator
            } else {
                f64::INFINITY
            }
        })
        .collect();
    SpectrumValue::from_values(tracked.model().clone(), values)
}

/// Close the chunk `[aggregate.last_change(), now]` for `rx`
///
/// On error nothing is folded and the last-change timestamp is left alone.
pub fn close_chunk(
    rx: &mut ActiveReception,
    aggregate: &mut SignalAggregate,
    noise: &SpectrumValue,
    error_model: &dyn ErrorModel,
    now: SimTime,
) -> InterferenceResult<ChunkOutcome> {
    let last_change = aggregate.last_change();
    let duration = now
        .checked_duration_since(last_change)
        .ok_or(InterferenceError::TimeRegression { now, last_change })?;

    if duration.is_zero() {
        rx.skip();
        return Ok(ChunkOutcome::Skipped);
    }

    let sinr = compute_sinr(rx.tracked(), aggregate.total(), noise)?;
    let probability = error_model.chunk_success_probability(&sinr, duration);
    if !(0.0..=1.0).contains(&probability) {
        return Err(InterferenceError::InvalidProbability(probability));
    }

    tracing::trace!(
        start = %last_change,
        end = %now,
        probability,
        peak_sinr = sinr.max(),
        model = error_model.name(),
        "chunk closed"
    );

    rx.fold(probability, duration);
    aggregate.mark(now);
    Ok(ChunkOutcome::Scored {
        duration,
        probability,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::NegativeResiduePolicy;
    use crate::session::ReceptionSession;
    use crate::spectrum::SpectrumModel;
    use std::sync::Arc;

    fn model() -> Arc<SpectrumModel> {
        SpectrumModel::uniform(0.0, 1.0, 3)
    }

    fn value(values: Vec<f64>) -> SpectrumValue {
        SpectrumValue::from_values(model(), values).unwrap()
    }

    #[test]
    fn test_sinr_excludes_tracked_signal() {
        let tracked = value(vec![10.0, 0.0, 5.0]);
        let aggregate = value(vec![14.0, 3.0, 5.0]);
        let noise = value(vec![1.0, 1.0, 0.0]);
        let sinr = compute_sinr(&tracked, &aggregate, &noise).unwrap();
        assert!((sinr[0] - 2.0).abs() < 1e-12);
        assert_eq!(sinr[1], 0.0);
        assert!(sinr[2].is_infinite());
    }

    #[test]
    fn test_sinr_no_signal_no_interference() {
        let zero = value(vec![0.0; 3]);
        let sinr = compute_sinr(&zero, &zero, &zero).unwrap();
        assert_eq!(sinr.values(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_sinr_tolerates_drift_below_tracked() {
        // Aggregate slightly below the tracked signal after rounding
        let tracked = value(vec![1.0, 0.0, 0.0]);
        let aggregate = value(vec![1.0 - 1e-15, 0.0, 0.0]);
        let noise = value(vec![0.5, 0.5, 0.5]);
        let sinr = compute_sinr(&tracked, &aggregate, &noise).unwrap();
        assert!((sinr[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_length_chunk_skips_model() {
        let signal = value(vec![1.0, 0.0, 0.0]);
        let mut agg = SignalAggregate::new(model(), NegativeResiduePolicy::Clamp);
        agg.add(&signal, SimTime::from_secs(1)).unwrap();
        let mut session = ReceptionSession::default();
        session.start(&signal, SimTime::from_secs(1)).unwrap();
        let rx = session.active_mut().unwrap();
        let noise = value(vec![1.0; 3]);
        let panicking = |_: &SpectrumValue, _: Duration| -> f64 { panic!("model must not be called") };
        let outcome = close_chunk(rx, &mut agg, &noise, &panicking, SimTime::from_secs(1)).unwrap();
        assert_eq!(outcome, ChunkOutcome::Skipped);
        assert_eq!(rx.success_probability(), 1.0);
        assert_eq!(rx.skipped_chunks(), 1);
    }

    #[test]
    fn test_invalid_probability_leaves_state() {
        let signal = value(vec![1.0, 0.0, 0.0]);
        let mut agg = SignalAggregate::new(model(), NegativeResiduePolicy::Clamp);
        agg.add(&signal, SimTime::ZERO).unwrap();
        let mut session = ReceptionSession::default();
        session.start(&signal, SimTime::ZERO).unwrap();
        let rx = session.active_mut().unwrap();
        let noise = value(vec![1.0; 3]);
        let broken = |_: &SpectrumValue, _: Duration| 1.5;
        let err = close_chunk(rx, &mut agg, &noise, &broken, SimTime::from_secs(1)).unwrap_err();
        assert_eq!(err, InterferenceError::InvalidProbability(1.5));
        assert_eq!(agg.last_change(), SimTime::ZERO);
        assert_eq!(rx.chunks(), 0);

        let nan = |_: &SpectrumValue, _: Duration| f64::NAN;
        assert!(close_chunk(rx, &mut agg, &noise, &nan, SimTime::from_secs(1)).is_err());
    }

    #[test]
    fn test_scored_chunk_advances_last_change() {
        let signal = value(vec![10.0, 0.0, 0.0]);
        let mut agg = SignalAggregate::new(model(), NegativeResiduePolicy::Clamp);
        agg.add(&signal, SimTime::ZERO).unwrap();
        let mut session = ReceptionSession::default();
        session.start(&signal, SimTime::ZERO).unwrap();
        let rx = session.active_mut().unwrap();
        let noise = value(vec![1.0; 3]);
        let model = |s: &SpectrumValue, d: Duration| 1.0 / (1.0 + d.as_secs_f64() / s[0]);
        let outcome = close_chunk(rx, &mut agg, &noise, &model, SimTime::from_secs(2)).unwrap();
        match outcome {
            ChunkOutcome::Scored { duration, probability } => {
                assert_eq!(duration, Duration::from_secs(2));
                assert!((probability - 1.0 / 1.2).abs() < 1e-12);
            }
            ChunkOutcome::Skipped => panic!("expected a scored chunk"),
        }
        assert_eq!(agg.last_change(), SimTime::from_secs(2));
        assert_eq!(rx.covered(), Duration::from_secs(2));
    }
}
