use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClimateError {
    #[error("Insufficient data: {required} non-missing values required, found {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("Percentile {0} is outside [0, 100]")]
    InvalidPercentile(f64),

    #[error("'{name}' must lie strictly between 0 and 1, got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("Return period must be greater than 1, got {0}")]
    InvalidReturnPeriod(f64),

    #[error("Storm index weights must be finite and non-negative, got ({0}, {1})")]
    InvalidWeights(f64, f64),

    #[error("Time index decreases at position {position}")]
    UnorderedIndex { position: usize },

    #[error("Column '{column}' could not be read as {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        #[source]
        source: PolarsError,
    },

    #[error("Failed processing DataFrame: {0}")]
    Polars(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Failed to read config file '{0}'")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config")]
    ConfigParse(#[from] serde_json::Error),
}
