//! YAML-described scenarios
//!
//! A scenario is one receiver configuration plus a list of transmissions.
//! Transmissions flagged `receive: true` are also decoded by the receiver.
//!
//! ```yaml
//! name: hidden-node
//! receiver:
//!   spectrum: { start_frequency_hz: 2.4e9, band_width_hz: 1.0e6, num_bands: 20 }
//!   error_model: { kind: sinr_threshold, threshold_db: 10.0 }
//! transmissions:
//!   - { id: wanted, start_s: 0.0, duration_s: 0.004, power_dbm: -60.0, first_band: 0, num_bands: 4, receive: true }
//!   - { id: hidden, start_s: 0.002, duration_s: 0.004, power_dbm: -62.0, first_band: 2, num_bands: 4 }
//! ```

use crate::error::{SimError, SimResult};
use crate::medium::{Medium, RxVerdict};
use serde::{Deserialize, Serialize};
use specint_core::config::{ConfigError, SpecintConfig};
use specint_core::observe::MetricsSnapshot;
use specint_core::spectrum::SpectrumValue;
use specint_core::SimTime;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// One transmission in the medium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionConfig {
    pub id: String,
    /// Start time in seconds
    pub start_s: f64,
    /// Airtime in seconds
    pub duration_s: f64,
    /// Total power at the receiver, spread evenly over the occupied bands
    pub power_dbm: f64,
    pub first_band: usize,
    pub num_bands: usize,
    /// Whether the receiver attempts to decode this transmission
    #[serde(default)]
    pub receive: bool,
}

impl TransmissionConfig {
    fn airtime(&self) -> SimResult<Duration> {
        let airtime = SimTime::from_secs_f64(self.duration_s).since_start();
        if airtime.is_zero() {
            return Err(SimError::InvalidSchedule(format!(
                "{}: airtime rounds to zero",
                self.id
            )));
        }
        Ok(airtime)
    }
}

/// Complete scenario description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub name: String,
    pub receiver: SpecintConfig,
    pub transmissions: Vec<TransmissionConfig>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "scenario".to_string(),
            receiver: SpecintConfig::default(),
            transmissions: Vec::new(),
        }
    }
}

impl ScenarioConfig {
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    /// Parse and validate a scenario from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.receiver.validate()?;

        let bands = self.receiver.spectrum.num_bands;
        let mut ids = HashSet::new();
        for tx in &self.transmissions {
            if !ids.insert(tx.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate transmission id '{}'",
                    tx.id
                )));
            }
            if !(tx.start_s >= 0.0) || !tx.start_s.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "{}: start_s must be a finite non-negative time",
                    tx.id
                )));
            }
            if !(tx.duration_s > 0.0) || !tx.duration_s.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "{}: duration_s must be positive",
                    tx.id
                )));
            }
            if tx.num_bands == 0 || tx.first_band + tx.num_bands > bands {
                return Err(ConfigError::ValidationError(format!(
                    "{}: bands {}..{} outside the {}-band spectrum",
                    tx.id,
                    tx.first_band,
                    tx.first_band + tx.num_bands,
                    bands
                )));
            }
            if !tx.power_dbm.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "{}: power_dbm must be finite",
                    tx.id
                )));
            }
        }

        Ok(())
    }

    pub fn example_yaml() -> String {
        let mut receiver = SpecintConfig::default();
        receiver.spectrum.num_bands = 8;
        let config = Self {
            name: "overlap".to_string(),
            receiver,
            transmissions: vec![
                TransmissionConfig {
                    id: "wanted".to_string(),
                    start_s: 0.0,
                    duration_s: 0.004,
                    power_dbm: -60.0,
                    first_band: 0,
                    num_bands: 4,
                    receive: true,
                },
                TransmissionConfig {
                    id: "interferer".to_string(),
                    start_s: 0.002,
                    duration_s: 0.004,
                    power_dbm: -75.0,
                    first_band: 2,
                    num_bands: 4,
                    receive: false,
                },
            ],
        };

        serde_yaml::to_string(&config).unwrap_or_default()
    }
}

/// Results of a finished scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub verdicts: Vec<RxVerdict>,
    pub metrics: MetricsSnapshot,
}

impl ScenarioReport {
    pub fn verdict(&self, label: &str) -> Option<&RxVerdict> {
        self.verdicts.iter().find(|v| v.label == label)
    }

    pub fn successes(&self) -> usize {
        self.verdicts.iter().filter(|v| v.success).count()
    }
}

/// A scheduled, ready-to-run scenario
#[derive(Debug)]
pub struct Scenario {
    name: String,
    medium: Medium,
}

impl Scenario {
    pub fn from_config(config: &ScenarioConfig) -> SimResult<Self> {
        config.validate()?;
        let receiver = config.receiver.build_interference()?;
        let model = receiver.model().clone();
        let mut medium = Medium::new(receiver);

        for tx in &config.transmissions {
            let signal = SpectrumValue::from_power_dbm(
                model.clone(),
                tx.power_dbm,
                tx.first_band..tx.first_band + tx.num_bands,
            )?;
            let start = SimTime::from_secs_f64(tx.start_s);
            let airtime = tx.airtime()?;
            if tx.receive {
                medium.receive(start, &signal, airtime, tx.id.clone())?;
            } else {
                medium.transmit(start, &signal, airtime)?;
            }
        }

        Ok(Self {
            name: config.name.clone(),
            medium,
        })
    }

    pub fn medium(&self) -> &Medium {
        &self.medium
    }

    pub fn run(mut self) -> SimResult<ScenarioReport> {
        self.medium.run()?;
        let verdicts = self.medium.take_verdicts();
        let metrics = self.medium.receiver().metrics().snapshot();
        info!(
            scenario = %self.name,
            receptions = verdicts.len(),
            succeeded = metrics.rx_succeeded,
            "Scenario complete"
        );
        Ok(ScenarioReport {
            name: self.name,
            verdicts,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specint_core::InterferenceError;

    const OVERLAP: &str = r#"
name: overlap
receiver:
  spectrum:
    start_frequency_hz: 2.4e9
    band_width_hz: 1.0e6
    num_bands: 8
  error_model:
    kind: sinr_threshold
    threshold_db: 10.0
transmissions:
  - id: clean
    start_s: 0.0
    duration_s: 0.001
    power_dbm: -60.0
    first_band: 0
    num_bands: 4
    receive: true
  - id: jammed
    start_s: 0.002
    duration_s: 0.001
    power_dbm: -60.0
    first_band: 0
    num_bands: 4
    receive: true
  - id: jammer
    start_s: 0.0025
    duration_s: 0.001
    power_dbm: -60.0
    first_band: 0
    num_bands: 4
"#;

    #[test]
    fn test_parse_and_run() {
        let config = ScenarioConfig::parse(OVERLAP).unwrap();
        assert_eq!(config.transmissions.len(), 3);
        assert!(!config.transmissions[2].receive);

        let report = Scenario::from_config(&config).unwrap().run().unwrap();
        assert_eq!(report.name, "overlap");
        assert_eq!(report.verdicts.len(), 2);
        assert!(report.verdict("clean").unwrap().success);

        let jammed = report.verdict("jammed").unwrap();
        assert!(!jammed.success);
        assert_eq!(jammed.chunks, 2);
        assert_eq!(jammed.start, SimTime::from_millis(2));
        assert_eq!(jammed.end, SimTime::from_millis(3));

        assert_eq!(report.successes(), 1);
        assert_eq!(report.metrics.rx_started, 2);
        assert_eq!(report.metrics.rx_failed, 1);
        assert_eq!(report.metrics.signals_added, 3);
        assert_eq!(report.metrics.signals_removed, 3);
    }

    #[test]
    fn test_example_yaml_round_trips() {
        let yaml = ScenarioConfig::example_yaml();
        let parsed = ScenarioConfig::parse(&yaml).unwrap();
        assert_eq!(parsed.transmissions.len(), 2);

        let report = Scenario::from_config(&parsed).unwrap().run().unwrap();
        assert_eq!(report.verdicts.len(), 1);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = ScenarioConfig::parse(OVERLAP).unwrap();
        config.transmissions[0].duration_s = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = ScenarioConfig::parse(OVERLAP).unwrap();
        config.transmissions[2].first_band = 6;
        assert!(config.validate().is_err());

        let mut config = ScenarioConfig::parse(OVERLAP).unwrap();
        config.transmissions[1].id = "clean".to_string();
        assert!(config.validate().is_err());

        let mut config = ScenarioConfig::parse(OVERLAP).unwrap();
        config.transmissions[0].start_s = -1.0;
        assert!(matches!(
            Scenario::from_config(&config),
            Err(SimError::Config(ConfigError::ValidationError(_)))
        ));
    }

    #[test]
    fn test_overlapping_receptions_fail_run() {
        let mut config = ScenarioConfig::parse(OVERLAP).unwrap();
        config.transmissions[2].receive = true;

        let err = Scenario::from_config(&config).unwrap().run().unwrap_err();
        assert!(matches!(
            err,
            SimError::Interference(InterferenceError::InvalidState(_))
        ));
    }

    #[test]
    fn test_empty_scenario() {
        let report = Scenario::from_config(&ScenarioConfig::default())
            .unwrap()
            .run()
            .unwrap();
        assert!(report.verdicts.is_empty());
        assert_eq!(report.metrics.success_ratio(), None);
    }
}
