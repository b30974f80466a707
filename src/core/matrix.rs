//! Named-column numeric table used as model input.
//!
//! Columns are stored column-major; every column has the same number of
//! rows. Feature selection by name keeps the train and test matrices
//! aligned without positional bookkeeping.

use crate::error::{PipelineError, Result};

/// A table of named f64 columns with a fixed row count.
#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

impl FeatureMatrix {
    /// Create an empty matrix with a fixed number of rows.
    pub fn new(n_rows: usize) -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            n_rows,
        }
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column names in insertion order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Append a column. Fails on a row-count mismatch or duplicate name.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.n_rows {
            return Err(PipelineError::DimensionMismatch {
                expected: self.n_rows,
                got: values.len(),
            });
        }
        if self.names.iter().any(|n| *n == name) {
            return Err(PipelineError::DuplicateFeature(name));
        }
        self.names.push(name);
        self.columns.push(values);
        Ok(())
    }

    /// Borrow a column by name.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| PipelineError::UnknownFeature(name.to_string()))
    }

    /// Borrow a column by index.
    pub fn column_at(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    /// Value at (row, column index).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.columns[col][row]
    }

    /// Project onto a subset of columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<FeatureMatrix> {
        let mut out = FeatureMatrix::new(self.n_rows);
        for &name in names {
            out.push_column(name, self.column(name)?.to_vec())?;
        }
        Ok(out)
    }

    /// Project onto a subset of rows, in the given order, keeping all
    /// columns.
    pub fn take_rows(&self, rows: &[usize]) -> Result<FeatureMatrix> {
        let mut out = FeatureMatrix::new(rows.len());
        for (name, col) in self.names.iter().zip(&self.columns) {
            out.push_column(name.clone(), rows.iter().map(|&r| col[r]).collect())?;
        }
        Ok(out)
    }
}
