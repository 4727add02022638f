//! Error-evaluation policies
//!
//! An [`ErrorModel`] maps the SINR spectrum seen by the tracked signal during
//! one chunk, and the chunk duration, to the probability that the chunk was
//! received without error. Any `Fn(&SpectrumValue, Duration) -> f64` is an
//! error model, which keeps ad-hoc curves and test doubles cheap.
//!
//! | Model | Chunk success |
//! |-------|---------------|
//! | [`SinrThresholdModel`] | 1 if mean SINR ≥ threshold, else 0 |
//! | [`BpskBerModel`] | Π_k (1 − Q(√(2·sinr_k)))^bits_k |
//! | [`ShannonCapacityModel`] | 1 if Σ B_k·log2(1+sinr_k) ≥ rate, else 0 |

use crate::spectrum::SpectrumValue;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Capability turning a chunk's SINR and duration into a success probability.
///
/// Implementations must be pure: the evaluator may call them any number of
/// times and relies on the result lying in `[0, 1]`.
pub trait ErrorModel: Send + Sync {
    fn chunk_success_probability(&self, sinr: &SpectrumValue, duration: Duration) -> f64;

    /// Short identifier used in logs
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> ErrorModel for F
where
    F: Fn(&SpectrumValue, Duration) -> f64 + Send + Sync,
{
    fn chunk_success_probability(&self, sinr: &SpectrumValue, duration: Duration) -> f64 {
        self(sinr, duration)
    }
}

/// Hard SINR threshold on the bandwidth-weighted mean over occupied bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SinrThresholdModel {
    pub threshold_db: f64,
}

impl SinrThresholdModel {
    pub fn new(threshold_db: f64) -> Self {
        Self { threshold_db }
    }
}

impl ErrorModel for SinrThresholdModel {
    fn chunk_success_probability(&self, sinr: &SpectrumValue, _duration: Duration) -> f64 {
        match mean_occupied_sinr(sinr) {
            Some(mean) if mean >= 10.0_f64.powf(self.threshold_db / 10.0) => 1.0,
            _ => 0.0,
        }
    }

    fn name(&self) -> &str {
        "sinr_threshold"
    }
}

/// Uncoded BPSK over every occupied band
///
/// Each band carries `bits_per_hz_second * width * duration` bits with
/// independent errors at the AWGN BPSK bit error rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BpskBerModel {
    pub bits_per_hz_second: f64,
}

impl BpskBerModel {
    pub fn new(bits_per_hz_second: f64) -> Self {
        Self { bits_per_hz_second }
    }

    /// BER = Q(sqrt(2 * Eb/N0))
    pub fn bit_error_rate(sinr: f64) -> f64 {
        if sinr <= 0.0 {
            return 0.5;
        }
        q_function((2.0 * sinr).sqrt())
    }
}

impl ErrorModel for BpskBerModel {
    fn chunk_success_probability(&self, sinr: &SpectrumValue, duration: Duration) -> f64 {
        let secs = duration.as_secs_f64();
        let mut log_success = 0.0;
        for (&ratio, band) in sinr.values().iter().zip(sinr.model().bands()) {
            if ratio <= 0.0 {
                continue;
            }
            let bits = self.bits_per_hz_second * band.width_hz() * secs;
            let ber = Self::bit_error_rate(ratio);
            log_success += bits * (-ber).ln_1p();
        }
        log_success.exp().clamp(0.0, 1.0)
    }

    fn name(&self) -> &str {
        "bpsk_ber"
    }
}

/// Capacity test against a target bit rate
///
/// The chunk succeeds when the Shannon capacity summed over bands is at least
/// `rate_bps`. Chunk length does not matter since bits needed and bits
/// deliverable both scale with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShannonCapacityModel {
    pub rate_bps: f64,
}

impl ShannonCapacityModel {
    pub fn new(rate_bps: f64) -> Self {
        Self { rate_bps }
    }

    /// Capacity in bit/s summed over bands
    pub fn capacity_bps(sinr: &SpectrumValue) -> f64 {
        sinr.values()
            .iter()
            .zip(sinr.model().bands())
            .map(|(&ratio, band)| band.width_hz() * (1.0 + ratio.max(0.0)).log2())
            .sum()
    }
}

impl ErrorModel for ShannonCapacityModel {
    fn chunk_success_probability(&self, sinr: &SpectrumValue, _duration: Duration) -> f64 {
        if Self::capacity_bps(sinr) >= self.rate_bps {
            1.0
        } else {
            0.0
        }
    }

    fn name(&self) -> &str {
        "shannon"
    }
}

/// Bandwidth-weighted mean SINR over bands where the signal is present
fn mean_occupied_sinr(sinr: &SpectrumValue) -> Option<f64> {
    let (weighted, width) = sinr
        .values()
        .iter()
        .zip(sinr.model().bands())
        .filter(|&(&ratio, _)| ratio > 0.0)
        .fold((0.0, 0.0), |(acc, w), (&ratio, band)| {
            (acc + ratio * band.width_hz(), w + band.width_hz())
        });
    if width > 0.0 {
        Some(weighted / width)
    } else {
        None
    }
}

/// Gaussian tail probability Q(x)
pub fn q_function(x: f64) -> f64 {
    0.5 * erfc(x / std::f64::consts::SQRT_2)
}

fn erfc(x: f64) -> f64 {
    // Abramowitz & Stegun 7.1.26
    if x < 0.0 {
        return 2.0 - erfc(-x);
    }
    if x.is_infinite() {
        return 0.0;
    }
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    poly * (-x * x).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::SpectrumModel;

    fn sinr(values: Vec<f64>) -> SpectrumValue {
        let model = SpectrumModel::uniform(0.0, 1e3, values.len());
        SpectrumValue::from_values(model, values).unwrap()
    }

    #[test]
    fn test_closure_is_error_model() {
        let model = |s: &SpectrumValue, d: Duration| s[0] / (s[0] + d.as_secs_f64());
        let p = model.chunk_success_probability(&sinr(vec![1.0]), Duration::from_secs(1));
        assert!((p - 0.5).abs() < 1e-12);
        assert_eq!(model.name(), "custom");
    }

    #[test]
    fn test_q_function() {
        assert!((q_function(0.0) - 0.5).abs() < 1e-6);
        assert!((q_function(1.0) - 0.158655).abs() < 1e-5);
        assert!((q_function(3.0) - 0.0013499).abs() < 1e-5);
        assert_eq!(q_function(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_threshold_model() {
        let m = SinrThresholdModel::new(10.0);
        let d = Duration::from_millis(1);
        assert_eq!(m.chunk_success_probability(&sinr(vec![20.0, 0.0]), d), 1.0);
        assert_eq!(m.chunk_success_probability(&sinr(vec![5.0, 0.0]), d), 0.0);
        // No occupied band
        assert_eq!(m.chunk_success_probability(&sinr(vec![0.0, 0.0]), d), 0.0);
        assert_eq!(m.chunk_success_probability(&sinr(vec![f64::INFINITY]), d), 1.0);
    }

    #[test]
    fn test_bpsk_longer_chunks_fail_more() {
        let m = BpskBerModel::new(1.0);
        let s = sinr(vec![2.0, 2.0]);
        let short = m.chunk_success_probability(&s, Duration::from_micros(100));
        let long = m.chunk_success_probability(&s, Duration::from_millis(10));
        assert!(short > long);
        assert!((0.0..=1.0).contains(&long));
    }

    #[test]
    fn test_bpsk_high_sinr_succeeds() {
        let m = BpskBerModel::new(1.0);
        let p = m.chunk_success_probability(&sinr(vec![1e4]), Duration::from_millis(1));
        assert!(p > 0.999);
        let inf = m.chunk_success_probability(&sinr(vec![f64::INFINITY]), Duration::from_secs(1));
        assert_eq!(inf, 1.0);
    }

    #[test]
    fn test_bpsk_empty_chunk_is_certain() {
        let m = BpskBerModel::new(1.0);
        assert_eq!(m.chunk_success_probability(&sinr(vec![0.0, 0.0]), Duration::from_secs(1)), 1.0);
    }

    #[test]
    fn test_shannon_model() {
        // 1 kHz band at SINR 3 carries 2 kbit/s
        let s = sinr(vec![3.0]);
        assert!((ShannonCapacityModel::capacity_bps(&s) - 2000.0).abs() < 1e-9);
        let d = Duration::from_millis(5);
        assert_eq!(ShannonCapacityModel::new(1500.0).chunk_success_probability(&s, d), 1.0);
        assert_eq!(ShannonCapacityModel::new(2500.0).chunk_success_probability(&s, d), 0.0);
    }

    #[test]
    fn test_shannon_model_ignores_chunk_length() {
        let s = sinr(vec![3.0]);
        let exact = ShannonCapacityModel::new(2000.0);
        for d in [Duration::from_nanos(1), Duration::from_millis(5), Duration::from_secs(100)] {
            assert_eq!(exact.chunk_success_probability(&s, d), 1.0);
            assert_eq!(ShannonCapacityModel::new(2000.5).chunk_success_probability(&s, d), 0.0);
        }
    }
}
