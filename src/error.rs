//! Error types.
//!
//! - `GrowthError` is what the library returns. Every variant names one way the
//!   growth pipeline can refuse to produce a result.
//! - `AppError` is what the `growth` binary prints before exiting; it carries
//!   the process exit code.

use thiserror::Error;

use crate::domain::WeightUnit;

/// Library-level failures.
#[derive(Debug, Error)]
pub enum GrowthError {
    /// A row could not be parsed. `row` is 1-based.
    #[error("row {row}: {message}")]
    Parse { row: usize, message: String },

    /// A percentile does not have enough points for a cubic fit (or the fit
    /// system could not be solved).
    #[error("percentile {percentile}: {message}")]
    Data { percentile: u8, message: String },

    /// A query fell outside the valid interval.
    #[error("{value} is outside the valid range [{min}, {max}]")]
    Domain { value: f64, min: f64, max: f64 },

    /// An extrapolation window reaches further back than the trajectory.
    #[error("window of {window} intervals needs more than {window} observations, found {available}")]
    InsufficientHistory { window: usize, available: usize },

    /// A table mixes value units.
    #[error("row {row}: value is in {found}, but earlier rows are in {expected}")]
    UnitMismatch {
        row: usize,
        expected: WeightUnit,
        found: WeightUnit,
    },

    #[error("percentile {0} is not present in the reference table")]
    UnknownPercentile(u8),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl GrowthError {
    /// Exit code used by the binary for this class of failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            GrowthError::Parse { .. } | GrowthError::InvalidConfig(_) | GrowthError::InvalidInput(_) => 2,
            GrowthError::Data { .. } | GrowthError::UnitMismatch { .. } => 3,
            GrowthError::Domain { .. }
            | GrowthError::InsufficientHistory { .. }
            | GrowthError::UnknownPercentile(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<GrowthError> for AppError {
    fn from(err: GrowthError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
