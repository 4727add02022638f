//! Spectral values over a shared band partition
//!
//! A [`SpectrumModel`] fixes the frequency partition once; every
//! [`SpectrumValue`] carries a shared handle to its model plus an owned vector
//! of power spectral densities (W/Hz), one per band.
//!
//! ```text
//!   psd
//!    ^      ┌──┐
//!    │   ┌──┘  │        values[k] = PSD in band k
//!    │   │     └──┐
//!    └───┴──┴──┴──┴───> f
//!        b0 b1 b2 b3
//! ```
//!
//! ## Example
//!
//! ```rust
//! use specint_core::spectrum::{SpectrumModel, SpectrumValue};
//!
//! let model = SpectrumModel::uniform(2.4e9, 1e6, 4);
//! let signal = SpectrumValue::from_values(model.clone(), vec![1e-9, 1e-9, 0.0, 0.0]).unwrap();
//! let noise = SpectrumValue::constant(model, 1e-12);
//! let total = signal.try_add(&noise).unwrap();
//! assert!(total.integral() > signal.integral());
//! ```

use crate::types::{InterferenceError, InterferenceResult};
use serde::{Deserialize, Serialize};
use std::ops::{AddAssign, Index, SubAssign};
use std::sync::Arc;

/// Boltzmann constant in J/K
pub const K_BOLTZMANN: f64 = 1.380649e-23;

/// Reference noise temperature in Kelvin
pub const T0_KELVIN: f64 = 290.0;

/// One band of a spectrum model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandInfo {
    pub low_hz: f64,
    pub center_hz: f64,
    pub high_hz: f64,
}

impl BandInfo {
    pub fn width_hz(&self) -> f64 {
        self.high_hz - self.low_hz
    }
}

/// Immutable frequency partition shared by all spectral values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumModel {
    bands: Vec<BandInfo>,
}

impl SpectrumModel {
    /// Contiguous bands of equal width starting at `start_hz`
    pub fn uniform(start_hz: f64, band_width_hz: f64, num_bands: usize) -> Arc<Self> {
        let bands = (0..num_bands)
            .map(|k| {
                let low_hz = start_hz + k as f64 * band_width_hz;
                BandInfo {
                    low_hz,
                    center_hz: low_hz + band_width_hz / 2.0,
                    high_hz: low_hz + band_width_hz,
                }
            })
            .collect();
        Arc::new(Self { bands })
    }

    /// Bands centered on the given frequencies; edges sit halfway between
    /// neighbouring centers and the outer bands are mirrored.
    pub fn from_centers(centers: &[f64]) -> Arc<Self> {
        let n = centers.len();
        let mut bands = Vec::with_capacity(n);
        for k in 0..n {
            let center_hz = centers[k];
            let low_hz = if k > 0 {
                (centers[k - 1] + center_hz) / 2.0
            } else if n > 1 {
                center_hz - (centers[1] - center_hz) / 2.0
            } else {
                center_hz
            };
            let high_hz = if k + 1 < n {
                (center_hz + centers[k + 1]) / 2.0
            } else if n > 1 {
                center_hz + (center_hz - centers[k - 1]) / 2.0
            } else {
                center_hz
            };
            bands.push(BandInfo {
                low_hz,
                center_hz,
                high_hz,
            });
        }
        Arc::new(Self { bands })
    }

    pub fn num_bands(&self) -> usize {
        self.bands.len()
    }

    pub fn bands(&self) -> &[BandInfo] {
        &self.bands
    }

    /// Total covered bandwidth in Hz
    pub fn total_bandwidth_hz(&self) -> f64 {
        self.bands.iter().map(BandInfo::width_hz).sum()
    }
}

/// Power spectral density over a [`SpectrumModel`]
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumValue {
    model: Arc<SpectrumModel>,
    values: Vec<f64>,
}

impl SpectrumValue {
    pub fn zeros(model: Arc<SpectrumModel>) -> Self {
        Self::constant(model, 0.0)
    }

    pub fn constant(model: Arc<SpectrumModel>, psd: f64) -> Self {
        let values = vec![psd; model.num_bands()];
        Self { model, values }
    }

    pub fn from_values(model: Arc<SpectrumModel>, values: Vec<f64>) -> InterferenceResult<Self> {
        if values.len() != model.num_bands() {
            return Err(InterferenceError::SpectrumMismatch {
                expected: model.num_bands(),
                actual: values.len(),
            });
        }
        Ok(Self { model, values })
    }

    /// Thermal noise PSD `k * T0 * F` in every band
    pub fn thermal_noise(model: Arc<SpectrumModel>, noise_figure_db: f64) -> Self {
        let f = 10.0_f64.powf(noise_figure_db / 10.0);
        Self::constant(model, K_BOLTZMANN * T0_KELVIN * f)
    }

    /// Spread a total power in dBm evenly (constant PSD) over `bands`
    pub fn from_power_dbm(
        model: Arc<SpectrumModel>,
        power_dbm: f64,
        bands: std::ops::Range<usize>,
    ) -> InterferenceResult<Self> {
        let n = model.num_bands();
        if bands.end > n || bands.start >= bands.end {
            return Err(InterferenceError::InvalidBandRange {
                start: bands.start,
                end: bands.end,
                num_bands: n,
            });
        }
        let width: f64 = model.bands()[bands.clone()].iter().map(BandInfo::width_hz).sum();
        let psd = if width > 0.0 { dbm_to_watts(power_dbm) / width } else { 0.0 };
        let mut values = vec![0.0; n];
        for v in &mut values[bands] {
            *v = psd;
        }
        Ok(Self { model, values })
    }

    pub fn model(&self) -> &Arc<SpectrumModel> {
        &self.model
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fails unless `other` lives on the same band partition
    pub fn check_compatible(&self, other: &SpectrumValue) -> InterferenceResult<()> {
        if Arc::ptr_eq(&self.model, &other.model) || self.model == other.model {
            Ok(())
        } else {
            Err(InterferenceError::SpectrumMismatch {
                expected: self.model.num_bands(),
                actual: other.model.num_bands(),
            })
        }
    }

    pub fn try_add(&self, other: &SpectrumValue) -> InterferenceResult<Self> {
        self.check_compatible(other)?;
        let mut out = self.clone();
        out += other;
        Ok(out)
    }

    pub fn try_sub(&self, other: &SpectrumValue) -> InterferenceResult<Self> {
        self.check_compatible(other)?;
        let mut out = self.clone();
        out -= other;
        Ok(out)
    }

    /// Elementwise ratio `self / other`, with `0 / x = 0` for any `x`
    pub fn try_ratio(&self, other: &SpectrumValue) -> InterferenceResult<Self> {
        self.check_compatible(other)?;
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(&num, &den)| {
                if num == 0.0 {
                    0.0
                } else if den > 0.0 {
                    num / den
                } else {
                    f64::INFINITY
                }
            })
            .collect();
        Ok(Self {
            model: self.model.clone(),
            values,
        })
    }

    /// Total power in W (sum of PSD times band width)
    pub fn integral(&self) -> f64 {
        self.values
            .iter()
            .zip(self.model.bands())
            .map(|(v, b)| v * b.width_hz())
            .sum()
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.sum() / self.values.len() as f64
    }

    /// Total power in dBm
    pub fn power_dbm(&self) -> f64 {
        watts_to_dbm(self.integral())
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

impl Index<usize> for SpectrumValue {
    type Output = f64;

    fn index(&self, band: usize) -> &f64 {
        &self.values[band]
    }
}

/// Callers must check compatibility first; extra bands are ignored.
impl AddAssign<&SpectrumValue> for SpectrumValue {
    fn add_assign(&mut self, rhs: &SpectrumValue) {
        for (a, b) in self.values.iter_mut().zip(&rhs.values) {
            *a += b;
        }
    }
}

impl SubAssign<&SpectrumValue> for SpectrumValue {
    fn sub_assign(&mut self, rhs: &SpectrumValue) {
        for (a, b) in self.values.iter_mut().zip(&rhs.values) {
            *a -= b;
        }
    }
}

/// Convert dBm to watts
pub fn dbm_to_watts(dbm: f64) -> f64 {
    10.0_f64.powf((dbm - 30.0) / 10.0)
}

/// Convert watts to dBm
pub fn watts_to_dbm(watts: f64) -> f64 {
    10.0 * watts.log10() + 30.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_model() {
        let model = SpectrumModel::uniform(1000.0, 10.0, 3);
        assert_eq!(model.num_bands(), 3);
        assert_eq!(model.bands()[1].low_hz, 1010.0);
        assert_eq!(model.bands()[1].center_hz, 1015.0);
        assert!((model.total_bandwidth_hz() - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_centers() {
        let model = SpectrumModel::from_centers(&[100.0, 110.0, 130.0]);
        let b = model.bands();
        assert_eq!(b[0].low_hz, 95.0);
        assert_eq!(b[0].high_hz, 105.0);
        assert_eq!(b[1].high_hz, 120.0);
        assert_eq!(b[2].high_hz, 140.0);
    }

    #[test]
    fn test_mismatched_models_rejected() {
        let a = SpectrumValue::zeros(SpectrumModel::uniform(0.0, 1.0, 2));
        let b = SpectrumValue::zeros(SpectrumModel::uniform(0.0, 1.0, 3));
        assert!(matches!(
            a.try_add(&b),
            Err(InterferenceError::SpectrumMismatch { expected: 2, actual: 3 })
        ));
        assert!(SpectrumValue::from_values(a.model().clone(), vec![1.0]).is_err());
    }

    #[test]
    fn test_equal_models_are_compatible() {
        // Distinct Arcs with identical partitions
        let a = SpectrumValue::constant(SpectrumModel::uniform(0.0, 1.0, 2), 1.0);
        let b = SpectrumValue::constant(SpectrumModel::uniform(0.0, 1.0, 2), 2.0);
        assert_eq!(a.try_add(&b).unwrap().values(), &[3.0, 3.0]);
    }

    #[test]
    fn test_ratio_conventions() {
        let model = SpectrumModel::uniform(0.0, 1.0, 4);
        let num = SpectrumValue::from_values(model.clone(), vec![10.0, 0.0, 0.0, 3.0]).unwrap();
        let den = SpectrumValue::from_values(model, vec![5.0, 2.0, 0.0, 0.0]).unwrap();
        let r = num.try_ratio(&den).unwrap();
        assert_eq!(r[0], 2.0);
        assert_eq!(r[1], 0.0);
        assert_eq!(r[2], 0.0);
        assert!(r[3].is_infinite());
    }

    #[test]
    fn test_power_dbm_spreading() {
        let model = SpectrumModel::uniform(0.0, 1e6, 4);
        let s = SpectrumValue::from_power_dbm(model, 0.0, 1..3).unwrap();
        assert_eq!(s[0], 0.0);
        assert!((s[1] - 1e-3 / 2e6).abs() < 1e-18);
        assert!((s.power_dbm() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_power_dbm_bad_band_range() {
        let model = SpectrumModel::uniform(0.0, 1e6, 4);
        assert_eq!(
            SpectrumValue::from_power_dbm(model.clone(), 0.0, 2..6).unwrap_err(),
            InterferenceError::InvalidBandRange { start: 2, end: 6, num_bands: 4 }
        );
        assert!(matches!(
            SpectrumValue::from_power_dbm(model, 0.0, 3..3),
            Err(InterferenceError::InvalidBandRange { start: 3, end: 3, .. })
        ));
    }

    #[test]
    fn test_thermal_noise() {
        let model = SpectrumModel::uniform(0.0, 1.0, 1);
        let n = SpectrumValue::thermal_noise(model, 0.0);
        // -174 dBm/Hz at 290 K
        assert!((watts_to_dbm(n[0]) + 174.0).abs() < 0.1);
    }
}
