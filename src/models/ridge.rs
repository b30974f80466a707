//! L2-regularized linear regression (ridge).
//!
//! Solves the normal equations with an L2 penalty on the coefficients
//! (intercept unpenalized) via Cholesky decomposition. Used as the
//! baseline model whose fitted values feed the tree ensemble.

use crate::core::FeatureMatrix;
use crate::error::{PipelineError, Result};
use crate::models::Regressor;

/// Ridge regression model.
#[derive(Debug, Clone)]
pub struct Ridge {
    alpha: f64,
    feature_names: Vec<String>,
    intercept: f64,
    coefficients: Option<Vec<f64>>,
}

impl Ridge {
    /// Create a ridge model with the given L2 penalty.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            feature_names: Vec::new(),
            intercept: 0.0,
            coefficients: None,
        }
    }

    /// Fitted coefficients, one per feature, in fit column order.
    pub fn coefficients(&self) -> Option<&[f64]> {
        self.coefficients.as_deref()
    }

    /// Fitted intercept.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Default for Ridge {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Regressor for Ridge {
    fn fit(&mut self, features: &FeatureMatrix, target: &[f64]) -> Result<()> {
        let n = features.n_rows();
        let k = features.n_cols();
        if n == 0 {
            return Err(PipelineError::EmptyData);
        }
        if target.len() != n {
            return Err(PipelineError::DimensionMismatch {
                expected: n,
                got: target.len(),
            });
        }

        // Normal equations on [1, x1, .., xk]: build X'X and X'y.
        let num_params = k + 1;
        let mut xtx = vec![vec![0.0; num_params]; num_params];
        let mut xty = vec![0.0; num_params];

        for obs in 0..n {
            let y = target[obs];
            xtx[0][0] += 1.0;
            xty[0] += y;
            for i in 0..k {
                let xi = features.get(obs, i);
                xtx[0][i + 1] += xi;
                xtx[i + 1][0] += xi;
                xty[i + 1] += xi * y;
                for j in 0..k {
                    xtx[i + 1][j + 1] += xi * features.get(obs, j);
                }
            }
        }

        // L2 penalty on the coefficients only, plus a tiny jitter on the
        // whole diagonal for numerical stability.
        for (i, row) in xtx.iter_mut().enumerate() {
            if i > 0 {
                row[i] += self.alpha;
            }
            row[i] += 1e-8;
        }

        let beta = solve_symmetric(&xtx, &xty).ok_or_else(|| {
            PipelineError::InvalidParameter(
                "ridge regression failed: matrix not positive definite".into(),
            )
        })?;

        self.intercept = beta[0];
        self.coefficients = Some(beta[1..].to_vec());
        self.feature_names = features.names().to_vec();
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(PipelineError::FitRequired)?;
        if features.names() != self.feature_names.as_slice() {
            return Err(PipelineError::InvalidParameter(
                "prediction features do not match the fitted columns".into(),
            ));
        }

        let mut predictions = vec![self.intercept; features.n_rows()];
        for (i, &coef) in coefficients.iter().enumerate() {
            let col = features.column_at(i);
            for (pred, &x) in predictions.iter_mut().zip(col.iter()) {
                *pred += coef * x;
            }
        }
        Ok(predictions)
    }

    fn name(&self) -> &str {
        "Ridge"
    }

    fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

/// Solve A @ x = b for symmetric positive definite A via Cholesky.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // Forward then backward substitution.
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }
    Some(x)
}
