//! Error types for the rocmeter-core crate.

use thiserror::Error;

/// Top-level error type for meter, plotting and tracking operations.
#[derive(Debug, Error)]
pub enum MeterError {
    #[error("Length mismatch: {targets} targets vs {outputs} outputs")]
    LengthMismatch { targets: usize, outputs: usize },

    #[error("Invalid label {0}: expected 0 or 1")]
    InvalidLabel(u8),

    #[error("Non-finite score at index {0}")]
    NonFiniteScore(usize),

    #[error("No observations recorded")]
    Empty,

    #[error("Only one class present in targets; ROC-AUC is undefined")]
    SingleClass,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Plot error: {0}")]
    Plot(String),

    #[error("Tracking error: {0}")]
    Tracking(String),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl MeterError {
    pub fn plot(msg: impl Into<String>) -> Self {
        Self::Plot(msg.into())
    }

    pub fn tracking(msg: impl Into<String>) -> Self {
        Self::Tracking(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl From<figment::Error> for MeterError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MeterError>;
