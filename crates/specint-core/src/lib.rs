//! # Spectrum Interference Core
//!
//! Gaussian interference accumulation and chunk-based reception evaluation
//! for physical-layer network simulation.
//!
//! ## Overview
//!
//! Transmitters emit signals described as power spectral density over a shared
//! band partition. A receiver tracks the sum of everything active in the
//! medium; when it attempts to receive one of those signals, the attempt is
//! cut into chunks wherever the sum changes, each chunk is scored by an
//! error model, and the chunk probabilities are multiplied into one verdict.
//!
//! - **Spectrum**: [`spectrum::SpectrumModel`] partitions, [`spectrum::SpectrumValue`] PSDs
//! - **Aggregate**: running sum of active signals ([`aggregate`])
//! - **Session**: Idle/Receiving state of one receiver ([`session`])
//! - **Chunks**: SINR computation and scoring ([`chunk`])
//! - **Error models**: pluggable chunk scoring ([`error_model`])
//!
//! ## Signal Flow
//!
//! ```text
//! add/subtract ─► close open chunk ─► SINR = S / (Σ − S + N) ─► ErrorModel ─► p *= p_chunk
//!                       │
//!                       └─► mutate aggregate, last_change = now
//! end_rx ─────► close final chunk ─► RxDecision(p) ─► bool
//! ```
//!
//! ## Example
//!
//! ```rust
//! use specint_core::prelude::*;
//!
//! let model = SpectrumModel::uniform(868.0e6, 125e3, 8);
//! let mut rx = SpectrumInterference::new(model.clone())
//!     .with_error_model(BpskBerModel::new(1.0));
//! rx.set_noise_psd(&SpectrumValue::thermal_noise(model.clone(), 6.0)).unwrap();
//!
//! let wanted = SpectrumValue::from_power_dbm(model, -90.0, 0..8).unwrap();
//! rx.add_signal(&wanted, SimTime::ZERO).unwrap();
//! rx.start_rx(&wanted, SimTime::ZERO).unwrap();
//! let ok = rx.end_rx(SimTime::from_millis(1)).unwrap();
//! assert!(ok);
//! ```

pub mod aggregate;
pub mod chunk;
pub mod config;
pub mod decision;
pub mod error_model;
pub mod interference;
pub mod observe;
pub mod session;
pub mod spectrum;
pub mod types;

pub use interference::SpectrumInterference;
pub use types::{InterferenceError, InterferenceResult, SimTime};

/// Commonly used items
pub mod prelude {
    pub use crate::aggregate::NegativeResiduePolicy;
    pub use crate::config::{ConfigError, SpecintConfig};
    pub use crate::decision::RxDecision;
    pub use crate::error_model::{BpskBerModel, ErrorModel, ShannonCapacityModel, SinrThresholdModel};
    pub use crate::interference::SpectrumInterference;
    pub use crate::session::RxReport;
    pub use crate::spectrum::{SpectrumModel, SpectrumValue};
    pub use crate::types::{InterferenceError, InterferenceResult, SimTime};
}
