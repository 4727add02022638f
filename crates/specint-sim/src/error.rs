//! Error types for the medium driver and scenario runner

use specint_core::config::ConfigError;
use specint_core::{InterferenceError, SimTime};

/// Result type for simulation operations
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised while driving a medium
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Interference error: {0}")]
    Interference(#[from] InterferenceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot schedule at {at}: medium clock is already at {now}")]
    ScheduleInPast { at: SimTime, now: SimTime },

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}

impl SimError {
    /// Check if the medium can keep running after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimError::Interference(e) => e.is_recoverable(),
            SimError::ScheduleInPast { .. } | SimError::InvalidSchedule(_) => true,
            SimError::Config(_) => false,
        }
    }
}
