//! Gradient-boosted regression trees.
//!
//! Squared-error boosting with exact greedy splits, row and column
//! subsampling, and a constant learning rate. Hyperparameters are fixed
//! per run, not tuned. The seed is optional: a seeded model is
//! reproducible, an unseeded one intentionally is not.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::core::FeatureMatrix;
use crate::error::{PipelineError, Result};
use crate::models::Regressor;

/// Fixed hyperparameters for the boosted ensemble.
#[derive(Debug, Clone)]
pub struct GbtParams {
    /// Number of boosting rounds.
    pub n_estimators: usize,
    /// Shrinkage applied to each tree's contribution.
    pub learning_rate: f64,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Minimum number of rows in each child of a split.
    pub min_leaf_size: usize,
    /// Fraction of rows sampled per tree.
    pub subsample: f64,
    /// Fraction of columns sampled per tree.
    pub colsample: f64,
    /// Random seed; `None` makes the fit non-deterministic.
    pub seed: Option<u64>,
}

impl Default for GbtParams {
    fn default() -> Self {
        Self {
            n_estimators: 1000,
            learning_rate: 0.01,
            max_depth: 5,
            min_leaf_size: 1,
            subsample: 0.8,
            colsample: 0.7,
            seed: None,
        }
    }
}

/// One node of a regression tree, stored in an arena.
#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree over arena-indexed nodes (root at 0).
#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict_row(&self, features: &FeatureMatrix, row: usize) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features.get(row, *feature) < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Gradient-boosted tree regressor.
pub struct GradientBoosting {
    params: GbtParams,
    base_score: f64,
    trees: Vec<Tree>,
    feature_names: Vec<String>,
}

impl GradientBoosting {
    /// Create an unfitted model with the given hyperparameters.
    pub fn new(params: GbtParams) -> Self {
        Self {
            params,
            base_score: 0.0,
            trees: Vec::new(),
            feature_names: Vec::new(),
        }
    }

    /// Number of fitted trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Default for GradientBoosting {
    fn default() -> Self {
        Self::new(GbtParams::default())
    }
}

impl Regressor for GradientBoosting {
    fn fit(&mut self, features: &FeatureMatrix, target: &[f64]) -> Result<()> {
        let n = features.n_rows();
        if n == 0 || features.n_cols() == 0 {
            return Err(PipelineError::EmptyData);
        }
        if target.len() != n {
            return Err(PipelineError::DimensionMismatch {
                expected: n,
                got: target.len(),
            });
        }
        let fraction_ok = |f: f64| f > 0.0 && f <= 1.0;
        if !fraction_ok(self.params.subsample) || !fraction_ok(self.params.colsample) {
            return Err(PipelineError::InvalidParameter(
                "subsample and colsample must lie in (0, 1]".into(),
            ));
        }
        if self.params.min_leaf_size == 0 {
            return Err(PipelineError::InvalidParameter(
                "min_leaf_size must be at least 1".into(),
            ));
        }

        let mut rng: StdRng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        self.base_score = target.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![self.base_score; n];
        let mut trees = Vec::with_capacity(self.params.n_estimators);

        let n_rows_sampled = ((n as f64 * self.params.subsample).round() as usize).max(1);
        let n_cols_sampled =
            ((features.n_cols() as f64 * self.params.colsample).round() as usize).max(1);

        for round in 0..self.params.n_estimators {
            let residuals: Vec<f64> = target
                .iter()
                .zip(predictions.iter())
                .map(|(y, p)| y - p)
                .collect();

            let rows = rand::seq::index::sample(&mut rng, n, n_rows_sampled).into_vec();
            let mut cols =
                rand::seq::index::sample(&mut rng, features.n_cols(), n_cols_sampled).into_vec();
            cols.sort_unstable();

            let mut builder = TreeBuilder {
                features,
                residuals: &residuals,
                cols: &cols,
                max_depth: self.params.max_depth,
                min_leaf_size: self.params.min_leaf_size,
                nodes: Vec::new(),
            };
            builder.build(&rows, 0);
            let tree = Tree {
                nodes: builder.nodes,
            };

            for (i, pred) in predictions.iter_mut().enumerate() {
                *pred += self.params.learning_rate * tree.predict_row(features, i);
            }
            trees.push(tree);

            if (round + 1) % 100 == 0 || round + 1 == self.params.n_estimators {
                let mae = target
                    .iter()
                    .zip(predictions.iter())
                    .map(|(y, p)| (y - p).abs())
                    .sum::<f64>()
                    / n as f64;
                debug!(round = round + 1, mae, "boosting progress");
            }
        }

        self.trees = trees;
        self.feature_names = features.names().to_vec();
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(PipelineError::FitRequired);
        }
        if features.names() != self.feature_names.as_slice() {
            return Err(PipelineError::InvalidParameter(
                "prediction features do not match the fitted columns".into(),
            ));
        }

        let mut predictions = vec![self.base_score; features.n_rows()];
        for tree in &self.trees {
            for (row, pred) in predictions.iter_mut().enumerate() {
                *pred += self.params.learning_rate * tree.predict_row(features, row);
            }
        }
        Ok(predictions)
    }

    fn name(&self) -> &str {
        "GradientBoosting"
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

/// Recursive greedy tree construction over a node arena.
struct TreeBuilder<'a> {
    features: &'a FeatureMatrix,
    residuals: &'a [f64],
    cols: &'a [usize],
    max_depth: usize,
    min_leaf_size: usize,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Build the subtree for `rows`, returning its arena index.
    fn build(&mut self, rows: &[usize], depth: usize) -> usize {
        if depth >= self.max_depth || rows.len() < 2 * self.min_leaf_size {
            return self.push_leaf(rows);
        }

        match self.best_split(rows) {
            Some((feature, threshold)) => {
                let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                    .iter()
                    .partition(|&&r| self.features.get(r, feature) < threshold);

                // Reserve the split slot before recursing so the root
                // stays at index 0.
                let idx = self.nodes.len();
                self.nodes.push(Node::Leaf { value: 0.0 });
                let left = self.build(&left_rows, depth + 1);
                let right = self.build(&right_rows, depth + 1);
                self.nodes[idx] = Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                };
                idx
            }
            None => self.push_leaf(rows),
        }
    }

    fn push_leaf(&mut self, rows: &[usize]) -> usize {
        let value = if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|&r| self.residuals[r]).sum::<f64>() / rows.len() as f64
        };
        self.nodes.push(Node::Leaf { value });
        self.nodes.len() - 1
    }

    /// Exact greedy search for the (feature, threshold) with the largest
    /// squared-error reduction, honoring the minimum leaf size.
    fn best_split(&self, rows: &[usize]) -> Option<(usize, f64)> {
        let total_sum: f64 = rows.iter().map(|&r| self.residuals[r]).sum();
        let total_n = rows.len() as f64;
        let base_score = total_sum * total_sum / total_n;

        let mut best: Option<(usize, f64, f64)> = None;
        for &feature in self.cols {
            let mut pairs: Vec<(f64, f64)> = rows
                .iter()
                .map(|&r| (self.features.get(r, feature), self.residuals[r]))
                .collect();
            pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_sum = 0.0;
            for i in 0..pairs.len() - 1 {
                left_sum += pairs[i].1;
                // Only split between distinct feature values.
                if pairs[i].0 >= pairs[i + 1].0 {
                    continue;
                }
                let left_n = (i + 1) as f64;
                let right_n = total_n - left_n;
                if (i + 1) < self.min_leaf_size || (pairs.len() - i - 1) < self.min_leaf_size {
                    continue;
                }
                let right_sum = total_sum - left_sum;
                let gain =
                    left_sum * left_sum / left_n + right_sum * right_sum / right_n - base_score;
                if gain > 1e-12 && best.map_or(true, |(_, _, g)| gain > g) {
                    let threshold = (pairs[i].0 + pairs[i + 1].0) / 2.0;
                    best = Some((feature, threshold, gain));
                }
            }
        }
        best.map(|(feature, threshold, _)| (feature, threshold))
    }
}
