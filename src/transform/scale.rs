//! Column-wise min-max scaling with retained parameters.
//!
//! The scaler is fit once on a lookup table and its min/range per column
//! are kept so the same parameters apply to any later transform. A column
//! that is constant across rows maps every row to 0.

use crate::core::FeatureMatrix;
use crate::error::Result;

/// Fitted min-max scaling parameters for a set of named columns.
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    names: Vec<String>,
    mins: Vec<f64>,
    ranges: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit per-column minimum and range on the given matrix.
    pub fn fit(matrix: &FeatureMatrix) -> Self {
        let mut mins = Vec::with_capacity(matrix.n_cols());
        let mut ranges = Vec::with_capacity(matrix.n_cols());
        for i in 0..matrix.n_cols() {
            let col = matrix.column_at(i);
            let min = col.iter().copied().fold(f64::INFINITY, f64::min);
            let max = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            mins.push(min);
            ranges.push(max - min);
        }
        Self {
            names: matrix.names().to_vec(),
            mins,
            ranges,
        }
    }

    /// Scale each column with the fitted parameters.
    ///
    /// Columns are matched by name; a matrix with different columns is a
    /// hard error. Constant columns (zero range) map to 0.
    pub fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix> {
        let mut out = FeatureMatrix::new(matrix.n_rows());
        for (i, name) in self.names.iter().enumerate() {
            let col = matrix.column(name)?;
            let min = self.mins[i];
            let range = self.ranges[i];
            let scaled = if range.abs() < 1e-12 {
                vec![0.0; col.len()]
            } else {
                col.iter().map(|&x| (x - min) / range).collect()
            };
            out.push_column(name.clone(), scaled)?;
        }
        Ok(out)
    }

    /// Fit on a matrix and scale it in one step, keeping the parameters.
    pub fn fit_transform(matrix: &FeatureMatrix) -> Result<(FeatureMatrix, MinMaxScaler)> {
        let scaler = Self::fit(matrix);
        let scaled = scaler.transform(matrix)?;
        Ok((scaled, scaler))
    }
}
