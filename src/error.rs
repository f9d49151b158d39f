//! Error types for the policy-mix engine.
//!
//! Configuration problems and an empty equilibrium search are fatal; they surface
//! at construction and the caller is expected to stop there. A zero-attempt
//! breach rate is not an error at all, see [`crate::metrics::MetricsRecorder`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid configuration: {reason}")]
    Configuration {
        reason: String,
    },

    #[error("No Nash equilibrium found for {rows}x{cols} game")]
    NoEquilibriumFound {
        rows: usize,
        cols: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SimError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Configuration { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
