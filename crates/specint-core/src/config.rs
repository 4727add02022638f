//! # Configuration System
//!
//! YAML configuration for building a [`SpectrumInterference`]:
//!
//! - Band partition of the shared spectrum
//! - Noise floor (thermal noise figure or explicit PSD)
//! - Error model and decision rule
//! - Handling of negative aggregate residues
//! - Logging
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `SPECINT_CONFIG` environment variable
//! 2. `./specint.yaml` (current directory)
//! 3. `~/.config/specint/config.yaml` (user config)
//! 4. `/etc/specint/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! spectrum:
//!   start_frequency_hz: 2.4e9
//!   band_width_hz: 1.0e6
//!   num_bands: 20
//!
//! noise:
//!   noise_figure_db: 5.0
//!
//! error_model:
//!   kind: bpsk
//!   bits_per_hz_second: 1.0
//!
//! decision:
//!   mode: random
//!   seed: 7
//! ```

use crate::aggregate::NegativeResiduePolicy;
use crate::decision::{RxDecision, DEFAULT_DECISION_THRESHOLD};
use crate::error_model::{BpskBerModel, ErrorModel, ShannonCapacityModel, SinrThresholdModel};
use crate::interference::SpectrumInterference;
use crate::observe::LogConfig;
use crate::spectrum::{dbm_to_watts, SpectrumModel, SpectrumValue};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Error type for configuration operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("config not found: {0}")]
    NotFound(String),

    #[error("failed to read config: {0}")]
    ReadError(String),

    #[error("failed to parse config: {0}")]
    ParseError(String),

    #[error("invalid config: {0}")]
    ValidationError(String),
}

/// Band partition of the shared spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    /// Lower edge of the first band in Hz
    pub start_frequency_hz: f64,
    /// Width of every band in Hz
    pub band_width_hz: f64,
    pub num_bands: usize,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            start_frequency_hz: 2_400_000_000.0,
            band_width_hz: 1_000_000.0,
            num_bands: 20,
        }
    }
}

impl SpectrumConfig {
    pub fn model(&self) -> Arc<SpectrumModel> {
        SpectrumModel::uniform(self.start_frequency_hz, self.band_width_hz, self.num_bands)
    }
}

/// Noise floor, flat over all bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Receiver noise figure over kT0
    pub noise_figure_db: f64,
    /// Explicit PSD in dBm/Hz, overrides the noise figure
    pub psd_dbm_hz: Option<f64>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            noise_figure_db: 5.0,
            psd_dbm_hz: None,
        }
    }
}

impl NoiseConfig {
    pub fn psd(&self, model: Arc<SpectrumModel>) -> SpectrumValue {
        match self.psd_dbm_hz {
            Some(dbm_hz) => SpectrumValue::constant(model, dbm_to_watts(dbm_hz)),
            None => SpectrumValue::thermal_noise(model, self.noise_figure_db),
        }
    }
}

/// Decision mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionMode {
    #[default]
    Threshold,
    Random,
}

/// Pass/fail decision at the end of a reception.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub mode: DecisionMode,
    /// Used in threshold mode
    pub threshold: f64,
    /// Used in random mode
    pub seed: u64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            mode: DecisionMode::Threshold,
            threshold: DEFAULT_DECISION_THRESHOLD,
            seed: 42,
        }
    }
}

impl DecisionConfig {
    pub fn build(&self) -> RxDecision {
        match self.mode {
            DecisionMode::Threshold => RxDecision::threshold(self.threshold),
            DecisionMode::Random => RxDecision::seeded(self.seed),
        }
    }
}

/// Built-in error models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorModelConfig {
    SinrThreshold { threshold_db: f64 },
    Bpsk { bits_per_hz_second: f64 },
    Shannon { rate_bps: f64 },
}

impl Default for ErrorModelConfig {
    fn default() -> Self {
        ErrorModelConfig::Bpsk {
            bits_per_hz_second: 1.0,
        }
    }
}

impl ErrorModelConfig {
    pub fn build(&self) -> Box<dyn ErrorModel> {
        match *self {
            ErrorModelConfig::SinrThreshold { threshold_db } => {
                Box::new(SinrThresholdModel::new(threshold_db))
            }
            ErrorModelConfig::Bpsk { bits_per_hz_second } => {
                Box::new(BpskBerModel::new(bits_per_hz_second))
            }
            ErrorModelConfig::Shannon { rate_bps } => Box::new(ShannonCapacityModel::new(rate_bps)),
        }
    }
}

/// Complete evaluator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecintConfig {
    pub spectrum: SpectrumConfig,
    pub noise: NoiseConfig,
    pub error_model: ErrorModelConfig,
    pub decision: DecisionConfig,
    pub negative_residue: NegativeResiduePolicy,
    pub logging: LogConfig,
}

impl SpecintConfig {
    /// Load configuration from the standard search path.
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("SPECINT_CONFIG") {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            return Self::load_from(&path);
        }

        for path in &Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./specint.yaml")];

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "specint") {
            paths.push(config_dir.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/specint/config.yaml"));

        paths
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spectrum.num_bands == 0 {
            return Err(ConfigError::ValidationError(
                "num_bands must be > 0".to_string(),
            ));
        }

        if !(self.spectrum.band_width_hz > 0.0) {
            return Err(ConfigError::ValidationError(
                "band_width_hz must be positive".to_string(),
            ));
        }

        if self.decision.mode == DecisionMode::Threshold
            && !(0.0..=1.0).contains(&self.decision.threshold)
        {
            return Err(ConfigError::ValidationError(
                "decision threshold must be within [0, 1]".to_string(),
            ));
        }

        match self.error_model {
            ErrorModelConfig::Bpsk { bits_per_hz_second } if !(bits_per_hz_second > 0.0) => {
                Err(ConfigError::ValidationError(
                    "bits_per_hz_second must be positive".to_string(),
                ))
            }
            ErrorModelConfig::Shannon { rate_bps } if !(rate_bps >= 0.0) => Err(
                ConfigError::ValidationError("rate_bps must be non-negative".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Build a ready evaluator with noise, error model and decision installed.
    pub fn build_interference(&self) -> Result<SpectrumInterference, ConfigError> {
        self.validate()?;
        let model = self.spectrum.model();
        let mut rx = SpectrumInterference::new(model.clone());
        rx.set_noise_psd(&self.noise.psd(model))
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        rx.set_boxed_error_model(self.error_model.build());
        rx.set_decision(self.decision.build());
        rx.set_negative_residue_policy(self.negative_residue);
        Ok(rx)
    }

    /// Install the global tracing subscriber described by `logging`.
    ///
    /// No-op if a subscriber is already installed.
    pub fn init_logging(&self) {
        crate::observe::init_logging(&self.logging);
    }

    pub fn example_yaml() -> String {
        let config = Self {
            decision: DecisionConfig {
                mode: DecisionMode::Random,
                seed: 7,
                ..Default::default()
            },
            ..Default::default()
        };

        serde_yaml::to_string(&config).unwrap_or_default()
    }
}
