//! Failure kinds shared by every computation in the crate.

use thiserror::Error;

/// Errors raised while validating inputs or computing a metric.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("Sample is empty")]
    EmptySample,

    #[error("Length mismatch: reference has {reference} values, observed has {observed}")]
    LengthMismatch { reference: usize, observed: usize },

    #[error("Reference value at index {index} is 0; MAPE can not divide by 0")]
    ZeroInReference { index: usize },

    #[error("Unknown formula '{0}': expected one of mae, mape, mse, rmse")]
    UnknownFormula(String),

    #[error("All {excluded} pairs were excluded as outliers; nothing left to average")]
    DivisionByZero { excluded: usize },

    #[error("Outlier threshold must be non-negative, got {0}")]
    InvalidThreshold(f64),

    #[error("Null hypothesis proportion must lie in (0, 1), got {0}")]
    InvalidProportion(f64),

    #[error("Sample size must be positive, got {0}")]
    InvalidSampleSize(u64),

    #[error("Sample count {count} exceeds sample size {size}")]
    InvalidSampleCount { count: u64, size: u64 },
}

pub type Result<T> = std::result::Result<T, MetricError>;
