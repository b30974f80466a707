//! Regression models: the common trait, the ridge baseline, the
//! gradient-boosted tree ensemble, and the non-parametric bucket estimator.

mod traits;

pub mod gbt;
pub mod median;
pub mod ridge;

pub use gbt::{GbtParams, GradientBoosting};
pub use median::{median_estimation, BucketMedians};
pub use ridge::Ridge;
pub use traits::{BoxedRegressor, Regressor};
