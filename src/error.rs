//! Error types for the zonecast pipeline.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while running the forecasting pipeline.
///
/// Every stage is fatal on error: there are no retries and no partial
/// submissions. The binary maps these to a logged message and a nonzero
/// exit code.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// A test row references a zone code never seen during training.
    #[error("unknown zone code: {0}")]
    UnknownZone(String),

    /// A feature column was requested that the matrix does not contain.
    #[error("unknown feature column: {0}")]
    UnknownFeature(String),

    /// A feature column with this name already exists in the matrix.
    #[error("duplicate feature column: {0}")]
    DuplicateFeature(String),

    /// The weekly-lag backfill ran off the start of a zone's history.
    #[error("cannot fill gap for zone {zone} at {timestamp}: no earlier value at any weekly lag")]
    UnfilledGap {
        zone: String,
        timestamp: NaiveDateTime,
    },

    /// File I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parse or write failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
