//! Regressor trait defining the common fit/predict interface.

use crate::core::FeatureMatrix;
use crate::error::Result;

/// Common interface for all supervised regressors in the pipeline.
///
/// Both the linear baseline and the tree ensemble sit behind this trait,
/// so either can be swapped without touching the feature pipeline. The
/// trait is object-safe and usable as `Box<dyn Regressor>`.
pub trait Regressor {
    /// Fit the model to a feature matrix and target vector.
    fn fit(&mut self, features: &FeatureMatrix, target: &[f64]) -> Result<()>;

    /// Predict one value per row of the feature matrix.
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>>;

    /// Model name for logging.
    fn name(&self) -> &str;

    /// Whether the model has been fitted.
    fn is_fitted(&self) -> bool;
}

/// Type alias for boxed regressor trait objects.
pub type BoxedRegressor = Box<dyn Regressor>;
