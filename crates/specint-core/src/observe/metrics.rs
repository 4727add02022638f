//! # Metrics Collection
//!
//! Counters and histograms for the interference evaluator:
//!
//! - **Counters**: chunks scored and skipped, receptions, clamped residues
//! - **Histograms**: chunk durations
//!
//! ## Example
//!
//! ```rust
//! use specint_core::observe::InterferenceMetrics;
//!
//! let metrics = InterferenceMetrics::new();
//! metrics.chunks_evaluated.inc();
//! metrics.chunk_duration_us.observe(250.0);
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.chunks_evaluated, 1);
//! ```

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A simple atomic counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// A simple histogram with fixed buckets.
#[derive(Debug)]
pub struct Histogram {
    /// Bucket boundaries
    boundaries: Vec<f64>,
    /// Bucket counts (len = boundaries.len() + 1 for overflow bucket)
    buckets: Vec<AtomicU64>,
    /// Sum of all observed values, in thousandths
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::duration_us()
    }
}

impl Histogram {
    /// Create a new histogram with custom bucket boundaries.
    pub fn new(boundaries: Vec<f64>) -> Self {
        let num_buckets = boundaries.len() + 1;
        Self {
            boundaries,
            buckets: (0..num_buckets).map(|_| AtomicU64::new(0)).collect(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Buckets spanning microsecond to second chunk lengths
    pub fn duration_us() -> Self {
        Self::new(vec![
            1.0, 10.0, 100.0, 1_000.0, 10_000.0, 100_000.0, 1_000_000.0,
        ])
    }

    pub fn observe(&self, value: f64) {
        let bucket_idx = self
            .boundaries
            .iter()
            .position(|&b| value < b)
            .unwrap_or(self.boundaries.len());
        self.buckets[bucket_idx].fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add((value * 1000.0) as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum.load(Ordering::Relaxed) as f64 / 1000.0
    }

    pub fn bucket_counts(&self) -> Vec<u64> {
        self.buckets
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect()
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    pub fn reset(&self) {
        for b in &self.buckets {
            b.store(0, Ordering::Relaxed);
        }
        self.sum.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

/// Metrics for one interference evaluator.
#[derive(Debug, Default)]
pub struct InterferenceMetrics {
    /// Signals added to the medium
    pub signals_added: Counter,
    /// Signals removed from the medium
    pub signals_removed: Counter,
    /// Chunks scored by the error model
    pub chunks_evaluated: Counter,
    /// Zero-length chunks skipped
    pub chunks_skipped: Counter,
    /// Reception attempts started
    pub rx_started: Counter,
    /// Reception attempts that ended in success
    pub rx_succeeded: Counter,
    /// Reception attempts that ended in failure
    pub rx_failed: Counter,
    /// Bands clamped to zero after a mismatched removal
    pub residues_clamped: Counter,
    /// Scored chunk lengths in microseconds
    pub chunk_duration_us: Histogram,
}

impl InterferenceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            signals_added: self.signals_added.get(),
            signals_removed: self.signals_removed.get(),
            chunks_evaluated: self.chunks_evaluated.get(),
            chunks_skipped: self.chunks_skipped.get(),
            rx_started: self.rx_started.get(),
            rx_succeeded: self.rx_succeeded.get(),
            rx_failed: self.rx_failed.get(),
            residues_clamped: self.residues_clamped.get(),
            chunk_duration_count: self.chunk_duration_us.count(),
            chunk_duration_sum_us: self.chunk_duration_us.sum(),
        }
    }

    pub fn reset(&self) {
        self.signals_added.reset();
        self.signals_removed.reset();
        self.chunks_evaluated.reset();
        self.chunks_skipped.reset();
        self.rx_started.reset();
        self.rx_succeeded.reset();
        self.rx_failed.reset();
        self.residues_clamped.reset();
        self.chunk_duration_us.reset();
    }

    /// Export metrics in Prometheus text format.
    pub fn to_prometheus(&self) -> String {
        let s = self.snapshot();
        let mut output = String::new();

        let counters = [
            ("specint_signals_added_total", "Signals added to the medium", s.signals_added),
            ("specint_signals_removed_total", "Signals removed from the medium", s.signals_removed),
            ("specint_chunks_evaluated_total", "Chunks scored by the error model", s.chunks_evaluated),
            ("specint_chunks_skipped_total", "Zero-length chunks skipped", s.chunks_skipped),
            ("specint_rx_started_total", "Reception attempts started", s.rx_started),
            ("specint_rx_succeeded_total", "Successful receptions", s.rx_succeeded),
            ("specint_rx_failed_total", "Failed receptions", s.rx_failed),
            ("specint_residues_clamped_total", "Negative aggregate residues clamped", s.residues_clamped),
        ];
        for (name, help, value) in counters {
            output.push_str(&format!("# HELP {} {}\n", name, help));
            output.push_str(&format!("# TYPE {} counter\n", name));
            output.push_str(&format!("{} {}\n", name, value));
        }

        output.push_str("# HELP specint_chunk_duration_us Scored chunk length in microseconds\n");
        output.push_str("# TYPE specint_chunk_duration_us summary\n");
        output.push_str(&format!("specint_chunk_duration_us_sum {}\n", s.chunk_duration_sum_us));
        output.push_str(&format!("specint_chunk_duration_us_count {}\n", s.chunk_duration_count));

        output
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub signals_added: u64,
    pub signals_removed: u64,
    pub chunks_evaluated: u64,
    pub chunks_skipped: u64,
    pub rx_started: u64,
    pub rx_succeeded: u64,
    pub rx_failed: u64,
    pub residues_clamped: u64,
    pub chunk_duration_count: u64,
    pub chunk_duration_sum_us: f64,
}

impl MetricsSnapshot {
    /// Fraction of finished receptions that succeeded
    pub fn success_ratio(&self) -> Option<f64> {
        let finished = self.rx_succeeded + self.rx_failed;
        if finished == 0 {
            None
        } else {
            Some(self.rx_succeeded as f64 / finished as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let c = Counter::new();
        c.inc();
        c.inc_by(4);
        assert_eq!(c.get(), 5);
        c.reset();
        assert_eq!(c.get(), 0);
    }

    #[test]
    fn test_histogram_buckets() {
        let h = Histogram::new(vec![10.0, 100.0]);
        h.observe(5.0);
        h.observe(50.0);
        h.observe(500.0);
        assert_eq!(h.bucket_counts(), vec![1, 1, 1]);
        assert_eq!(h.count(), 3);
        assert!((h.sum() - 555.0).abs() < 1e-9);
    }

    #[test]
    fn test_success_ratio() {
        let m = InterferenceMetrics::new();
        assert_eq!(m.snapshot().success_ratio(), None);
        m.rx_succeeded.inc_by(3);
        m.rx_failed.inc();
        assert_eq!(m.snapshot().success_ratio(), Some(0.75));
    }

    #[test]
    fn test_prometheus_export() {
        let m = InterferenceMetrics::new();
        m.chunks_evaluated.inc_by(7);
        let text = m.to_prometheus();
        assert!(text.contains("specint_chunks_evaluated_total 7"));
        assert!(text.contains("# TYPE specint_rx_failed_total counter"));
    }
}
