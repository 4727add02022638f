//! # Spectrum Interference Medium
//!
//! Discrete-event driver for [`specint_core`]. Transmissions and receptions
//! are scheduled on an [`EventQueue`](event::EventQueue); a [`Medium`] feeds
//! them to one receiver in time order and collects a verdict per reception.
//!
//! Events at the same instant are applied removals first, so a signal ending
//! exactly when another starts never counts twice.
//!
//! ```rust
//! use specint_core::prelude::*;
//! use specint_sim::Medium;
//! use std::time::Duration;
//!
//! let model = SpectrumModel::uniform(2.4e9, 1e6, 4);
//! let mut rx = SpectrumInterference::new(model.clone())
//!     .with_error_model(SinrThresholdModel::new(10.0));
//! rx.set_noise_psd(&SpectrumValue::thermal_noise(model.clone(), 5.0)).unwrap();
//!
//! let mut medium = Medium::new(rx);
//! let wanted = SpectrumValue::from_power_dbm(model, -60.0, 0..4).unwrap();
//! medium.receive(SimTime::ZERO, &wanted, Duration::from_millis(1), "wanted").unwrap();
//! let verdicts = medium.run().unwrap();
//! assert!(verdicts[0].success);
//! ```

pub mod error;
pub mod event;
pub mod medium;
pub mod scenario;

pub use error::{SimError, SimResult};
pub use medium::{Medium, RxVerdict};
pub use scenario::{Scenario, ScenarioConfig, ScenarioReport, TransmissionConfig};
