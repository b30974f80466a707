//! # zonecast
//!
//! Batch forecasting pipeline for per-zone network bandwidth and peak
//! concurrent users. One run reads historical hourly observations,
//! engineers calendar, special-day, and per-zone aggregate features,
//! stacks a ridge baseline into a gradient-boosted tree ensemble per
//! target, optionally blends with a non-parametric median estimator, and
//! writes a ranked submission file.

pub mod core;
pub mod error;
pub mod features;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod stats;
pub mod transform;

pub use error::{PipelineError, Result};

pub mod prelude {
    pub use crate::core::{FeatureMatrix, SubmissionRecord, TestRecord, TrainRecord};
    pub use crate::error::{PipelineError, Result};
    pub use crate::models::Regressor;
    pub use crate::pipeline::{run, PipelineConfig};
}
