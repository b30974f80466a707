//! Core data structures: observation records and the feature matrix.

mod matrix;
mod records;

pub use matrix::FeatureMatrix;
pub use records::{slot_timestamp, SubmissionRecord, TestRecord, TrainRecord};
