//! End-to-end pipeline: feature engineering, model stacking, boosting,
//! optional median blending, and label formatting.
//!
//! One configurable pipeline replaces the original per-variant driver
//! scripts; the two presets differ in backfilling, ratio features, the
//! autocorrelation window, the shock table, seeding, and blending.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::core::{FeatureMatrix, SubmissionRecord, TestRecord, TrainRecord};
use crate::error::{PipelineError, Result};
use crate::features::zones::{autocorr_feature_names, median_feature_names};
use crate::features::{
    calendar_features, special_day_features, zone_features, ZoneAggregateConfig, ZoneEncoder,
    ZoneLookup, ZoneShock, BASELINE_SHOCKS, REVISED_SHOCKS,
};
use crate::models::{BucketMedians, GbtParams, GradientBoosting, Regressor, Ridge};
use crate::transform::{expm1, fill_missing_values, log1p};

/// Per-row calendar and special-day feature columns, in matrix order.
const BASE_FEATURES: [&str; 11] = [
    "zone_code",
    "hour_id",
    "dow_norm",
    "month",
    "doy",
    "year",
    "day",
    "week",
    "abnormal_bw",
    "abnormal_u",
    "holiday",
];

/// Stacked baseline-model output columns.
const RIDGE_FEATURES: [&str; 2] = ["ridge_bw", "ridge_u"];

/// How the stacked ridge features for training rows are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RidgeStacking {
    /// Training rows get the fitted model's own in-sample predictions.
    InSample,
    /// Training rows get round-robin out-of-fold predictions.
    HeldOut,
}

/// Blending of the tree ensemble with the bucket median estimator.
#[derive(Debug, Clone)]
pub struct BlendConfig {
    /// Weight on the ensemble prediction; the rest goes to the medians.
    pub ensemble_weight: f64,
    /// Ascending window ladder for the median-of-medians estimate.
    pub median_windows: Vec<usize>,
}

/// Full pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Reindex each zone to a complete hourly grid and backfill gaps.
    pub backfill: bool,
    /// Emit bandwidth-per-user ratio medians in the zone lookup.
    pub include_ratios: bool,
    /// Trailing autocorrelation window in days; `None` = full history.
    pub autocorr_window_days: Option<i64>,
    /// Hand-tuned demand-shock weight table.
    pub shocks: &'static [ZoneShock],
    /// Boosting rounds per target.
    pub n_estimators: usize,
    /// Tree depth for the bandwidth ensemble.
    pub max_depth_bandwidth: usize,
    /// Tree depth for the max-user ensemble.
    pub max_depth_users: usize,
    /// Ensemble seed; `None` makes the run non-deterministic.
    pub seed: Option<u64>,
    /// L2 penalty for the stacked ridge baseline.
    pub ridge_alpha: f64,
    /// How ridge features for training rows are produced.
    pub ridge_stacking: RidgeStacking,
    /// Optional blending with the non-parametric estimator.
    pub blend: Option<BlendConfig>,
}

impl PipelineConfig {
    /// The seeded baseline variant: no backfill, no ratios, full-history
    /// autocorrelation, no blending.
    pub fn baseline() -> Self {
        Self {
            backfill: false,
            include_ratios: false,
            autocorr_window_days: None,
            shocks: &BASELINE_SHOCKS,
            n_estimators: 500,
            max_depth_bandwidth: 5,
            max_depth_users: 7,
            seed: Some(1023),
            ridge_alpha: 1.0,
            ridge_stacking: RidgeStacking::InSample,
            blend: None,
        }
    }

    /// The combined variant: backfilled grid, ratio features, 90-day
    /// autocorrelation window, unseeded ensembles, median blending.
    pub fn combined() -> Self {
        Self {
            backfill: true,
            include_ratios: true,
            autocorr_window_days: Some(90),
            shocks: &REVISED_SHOCKS,
            n_estimators: 1000,
            max_depth_bandwidth: 5,
            max_depth_users: 5,
            seed: None,
            ridge_alpha: 1.0,
            ridge_stacking: RidgeStacking::InSample,
            blend: Some(BlendConfig {
                ensemble_weight: 0.8,
                median_windows: vec![1, 2],
            }),
        }
    }
}

/// Weighted combination of the ensemble and non-parametric predictions.
pub fn blend_prediction(ensemble: f64, nonparametric: f64, ensemble_weight: f64) -> f64 {
    ensemble_weight * ensemble + (1.0 - ensemble_weight) * nonparametric
}

/// Format one submission label: bandwidth to 2 decimals, users to the
/// nearest integer, space separated.
pub fn format_label(bandwidth: f64, max_user: f64) -> String {
    format!("{:.2} {}", bandwidth, max_user.round() as i64)
}

struct RowKey<'a> {
    zone: &'a str,
    date: NaiveDate,
    hour: u32,
}

/// Assemble the per-row feature matrix: calendar + special-day columns,
/// then the broadcast zone lookup groups.
fn assemble(
    rows: &[RowKey<'_>],
    encoder: &ZoneEncoder,
    shocks: &[ZoneShock],
    medians: &ZoneLookup,
    autocorr: &ZoneLookup,
) -> Result<FeatureMatrix> {
    let n = rows.len();
    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(n); BASE_FEATURES.len()];

    for row in rows {
        let cal = calendar_features(row.date, row.hour);
        let special = special_day_features(row.zone, row.date, shocks);
        let values = [
            encoder.encode(row.zone)?,
            f64::from(row.hour),
            cal.dow_norm,
            cal.month,
            cal.doy,
            cal.year,
            cal.day,
            cal.week,
            special.abnormal_bw,
            special.abnormal_u,
            special.holiday,
        ];
        for (col, value) in columns.iter_mut().zip(values) {
            col.push(value);
        }
    }

    let mut matrix = FeatureMatrix::new(n);
    for (name, col) in BASE_FEATURES.iter().zip(columns) {
        matrix.push_column(*name, col)?;
    }

    let zones: Vec<String> = rows.iter().map(|r| r.zone.to_string()).collect();
    for (name, col) in medians.broadcast(&zones)? {
        matrix.push_column(name, col)?;
    }
    for (name, col) in autocorr.broadcast(&zones)? {
        matrix.push_column(name, col)?;
    }
    Ok(matrix)
}

/// Out-of-fold folds for held-out ridge stacking.
const STACKING_FOLDS: usize = 5;

/// Produce one stacked ridge feature column for the training rows and one
/// for the test rows.
///
/// Test rows always come from a model fit on the full training matrix.
/// Training rows depend on the stacking mode: `InSample` reuses that same
/// model's fitted values; `HeldOut` predicts each row from a model that
/// never saw its fold.
fn stack_ridge(
    alpha: f64,
    stacking: RidgeStacking,
    train: &FeatureMatrix,
    test: &FeatureMatrix,
    target: &[f64],
) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut full = Ridge::new(alpha);
    full.fit(train, target)?;
    let test_col = full.predict(test)?;
    let train_col = match stacking {
        RidgeStacking::InSample => full.predict(train)?,
        RidgeStacking::HeldOut => held_out_predictions(alpha, train, target)?,
    };
    Ok((train_col, test_col))
}

/// Out-of-fold ridge predictions over round-robin folds of the
/// time-sorted training rows.
fn held_out_predictions(alpha: f64, train: &FeatureMatrix, target: &[f64]) -> Result<Vec<f64>> {
    let n = train.n_rows();
    if n < 2 {
        return Err(PipelineError::InvalidParameter(
            "held-out stacking needs at least two training rows".into(),
        ));
    }
    let k = STACKING_FOLDS.min(n);

    let mut out = vec![0.0; n];
    for fold in 0..k {
        let held: Vec<usize> = (0..n).filter(|i| i % k == fold).collect();
        let rest: Vec<usize> = (0..n).filter(|i| i % k != fold).collect();
        let rest_target: Vec<f64> = rest.iter().map(|&i| target[i]).collect();

        let mut model = Ridge::new(alpha);
        model.fit(&train.take_rows(&rest)?, &rest_target)?;
        let preds = model.predict(&train.take_rows(&held)?)?;
        for (&row, pred) in held.iter().zip(preds) {
            out[row] = pred;
        }
    }
    Ok(out)
}

/// Run the full pipeline and produce one submission row per test row, in
/// test input order.
pub fn run(
    config: &PipelineConfig,
    train: Vec<TrainRecord>,
    test: &[TestRecord],
) -> Result<Vec<SubmissionRecord>> {
    if train.is_empty() || test.is_empty() {
        return Err(PipelineError::EmptyData);
    }

    let mut train = if config.backfill {
        let filled = fill_missing_values(&train)?;
        info!(rows = filled.len(), "missing hourly slots backfilled");
        filled
    } else {
        train
    };
    train.sort_by(|a, b| {
        (a.date, a.zone.as_str(), a.hour).cmp(&(b.date, b.zone.as_str(), b.hour))
    });

    let aggregate_config = ZoneAggregateConfig {
        include_ratios: config.include_ratios,
        autocorr_window_days: config.autocorr_window_days,
    };
    let (medians, autocorr) = zone_features(&train, &aggregate_config)?;
    let encoder = ZoneEncoder::fit(train.iter().map(|r| r.zone.as_str()));
    info!(zones = encoder.classes().len(), "zone features aggregated");

    let train_keys: Vec<RowKey<'_>> = train
        .iter()
        .map(|r| RowKey {
            zone: &r.zone,
            date: r.date,
            hour: r.hour,
        })
        .collect();
    let test_keys: Vec<RowKey<'_>> = test
        .iter()
        .map(|r| RowKey {
            zone: &r.zone,
            date: r.date,
            hour: r.hour,
        })
        .collect();

    let mut train_x = assemble(&train_keys, &encoder, config.shocks, &medians, &autocorr)?;
    let mut test_x = assemble(&test_keys, &encoder, config.shocks, &medians, &autocorr)?;

    let bandwidth_log = log1p(&train.iter().map(|r| r.bandwidth).collect::<Vec<_>>());
    let max_user_log = log1p(&train.iter().map(|r| r.max_user).collect::<Vec<_>>());

    // Stage one: ridge baseline on calendar + median features. Its
    // predictions become features for every row; training rows get either
    // the model's own in-sample fitted values or out-of-fold predictions,
    // per the configured stacking mode.
    let median_names = median_feature_names(config.include_ratios);
    let ridge_inputs: Vec<&str> = BASE_FEATURES
        .iter()
        .copied()
        .chain(median_names.iter().map(String::as_str))
        .collect();
    let ridge_train = train_x.select(&ridge_inputs)?;
    let ridge_test = test_x.select(&ridge_inputs)?;

    for (column, target) in RIDGE_FEATURES.iter().zip([&bandwidth_log, &max_user_log]) {
        let (train_col, test_col) = stack_ridge(
            config.ridge_alpha,
            config.ridge_stacking,
            &ridge_train,
            &ridge_test,
            target,
        )?;
        train_x.push_column(*column, train_col)?;
        test_x.push_column(*column, test_col)?;
    }
    info!(stacking = ?config.ridge_stacking, "ridge baseline features stacked");

    // Stage two: boosted ensemble per target on the full feature set.
    let autocorr_names = autocorr_feature_names();
    let full_inputs: Vec<&str> = BASE_FEATURES
        .iter()
        .copied()
        .chain(median_names.iter().map(String::as_str))
        .chain(RIDGE_FEATURES.iter().copied())
        .chain(autocorr_names.iter().map(String::as_str))
        .collect();
    let ensemble_train = train_x.select(&full_inputs)?;
    let ensemble_test = test_x.select(&full_inputs)?;

    let mut outputs: Vec<Vec<f64>> = Vec::with_capacity(2);
    for (target, depth) in [
        (&bandwidth_log, config.max_depth_bandwidth),
        (&max_user_log, config.max_depth_users),
    ] {
        let mut model = GradientBoosting::new(GbtParams {
            n_estimators: config.n_estimators,
            max_depth: depth,
            seed: config.seed,
            ..GbtParams::default()
        });
        model.fit(&ensemble_train, target)?;
        outputs.push(expm1(&model.predict(&ensemble_test)?));
    }
    let mut bandwidth_pred = outputs.remove(0);
    let mut max_user_pred = outputs.remove(0);
    info!(rounds = config.n_estimators, "tree ensembles fitted");

    // Stage three: optional blend with the bucket median estimator.
    if let Some(blend) = &config.blend {
        let buckets = BucketMedians::fit(&train, &blend.median_windows);
        for (i, row) in test.iter().enumerate() {
            match buckets.predict(&row.zone, row.hour) {
                Some((bw, user)) => {
                    bandwidth_pred[i] =
                        blend_prediction(bandwidth_pred[i], bw, blend.ensemble_weight);
                    max_user_pred[i] =
                        blend_prediction(max_user_pred[i], user, blend.ensemble_weight);
                }
                None => {
                    warn!(
                        zone = %row.zone,
                        hour = row.hour,
                        "no median bucket for test row; using ensemble prediction only"
                    );
                }
            }
        }
        info!(weight = blend.ensemble_weight, "predictions blended");
    }

    Ok(test
        .iter()
        .enumerate()
        .map(|(i, row)| SubmissionRecord {
            id: row.id,
            label: format_label(bandwidth_pred[i], max_user_pred[i]),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ==================== blend / format ====================

    #[test]
    fn blend_weights_the_ensemble() {
        assert_relative_eq!(blend_prediction(100.0, 50.0, 0.8), 90.0, epsilon = 1e-12);
    }

    #[test]
    fn blend_weight_one_keeps_the_ensemble() {
        assert_relative_eq!(blend_prediction(100.0, 50.0, 1.0), 100.0, epsilon = 1e-12);
    }

    #[test]
    fn label_rounds_bandwidth_and_users() {
        assert_eq!(format_label(90.897, 41.4), "90.90 41");
        assert_eq!(format_label(100.0, 40.5), "100.00 41");
    }

    // ==================== ridge stacking ====================

    /// Ten rows of a noisy linear relation; the outlier at row 0 makes
    /// in-sample and out-of-fold fits disagree.
    fn stacking_data() -> (FeatureMatrix, Vec<f64>) {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let mut y: Vec<f64> = x.iter().map(|&v| 2.0 + 3.0 * v).collect();
        y[0] += 5.0;
        let mut m = FeatureMatrix::new(10);
        m.push_column("x", x).unwrap();
        (m, y)
    }

    #[test]
    fn in_sample_stacking_reuses_the_fitted_values() {
        let (train, y) = stacking_data();
        let mut test = FeatureMatrix::new(2);
        test.push_column("x", vec![10.0, 11.0]).unwrap();

        let (train_col, test_col) =
            stack_ridge(1.0, RidgeStacking::InSample, &train, &test, &y).unwrap();

        // Training rows carry the same model's own in-sample predictions.
        let mut model = Ridge::new(1.0);
        model.fit(&train, &y).unwrap();
        let expected_train = model.predict(&train).unwrap();
        let expected_test = model.predict(&test).unwrap();
        for (got, want) in train_col.iter().zip(expected_train.iter()) {
            assert_relative_eq!(got, want, epsilon = 1e-12);
        }
        for (got, want) in test_col.iter().zip(expected_test.iter()) {
            assert_relative_eq!(got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn held_out_stacking_predicts_rows_out_of_fold() {
        let (train, y) = stacking_data();
        let mut test = FeatureMatrix::new(1);
        test.push_column("x", vec![10.0]).unwrap();

        let (held_out, test_col) =
            stack_ridge(1.0, RidgeStacking::HeldOut, &train, &test, &y).unwrap();
        let (in_sample, in_sample_test) =
            stack_ridge(1.0, RidgeStacking::InSample, &train, &test, &y).unwrap();

        // Row 0 sits in fold 0 of 5; its value must come from a model fit
        // on the other folds only.
        let rest: Vec<usize> = (0..10).filter(|i| i % 5 != 0).collect();
        let rest_y: Vec<f64> = rest.iter().map(|&i| y[i]).collect();
        let mut fold_model = Ridge::new(1.0);
        fold_model
            .fit(&train.take_rows(&rest).unwrap(), &rest_y)
            .unwrap();
        let fold_pred = fold_model
            .predict(&train.take_rows(&[0, 5]).unwrap())
            .unwrap();
        assert_relative_eq!(held_out[0], fold_pred[0], epsilon = 1e-12);
        assert_relative_eq!(held_out[5], fold_pred[1], epsilon = 1e-12);

        // The outlier row is fit less closely when its fold is held out.
        assert!((held_out[0] - in_sample[0]).abs() > 1e-6);

        // Test rows are identical across modes: always the full-fit model.
        assert_relative_eq!(test_col[0], in_sample_test[0], epsilon = 1e-12);
    }

    #[test]
    fn held_out_stacking_needs_two_rows() {
        let mut train = FeatureMatrix::new(1);
        train.push_column("x", vec![1.0]).unwrap();
        let err = held_out_predictions(1.0, &train, &[1.0]).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter(_)));
    }

    // ==================== presets ====================

    #[test]
    fn baseline_preset_is_seeded_without_blend() {
        let config = PipelineConfig::baseline();
        assert!(!config.backfill);
        assert!(!config.include_ratios);
        assert_eq!(config.autocorr_window_days, None);
        assert_eq!(config.seed, Some(1023));
        assert_eq!(config.max_depth_users, 7);
        assert_eq!(config.ridge_stacking, RidgeStacking::InSample);
        assert!(config.blend.is_none());
    }

    #[test]
    fn combined_preset_backfills_and_blends() {
        let config = PipelineConfig::combined();
        assert!(config.backfill);
        assert!(config.include_ratios);
        assert_eq!(config.autocorr_window_days, Some(90));
        assert_eq!(config.seed, None);
        assert_eq!(config.ridge_stacking, RidgeStacking::InSample);
        let blend = config.blend.unwrap();
        assert_relative_eq!(blend.ensemble_weight, 0.8, epsilon = 1e-12);
        assert_eq!(blend.median_windows, vec![1, 2]);
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let config = PipelineConfig::baseline();
        assert!(matches!(
            run(&config, Vec::new(), &[]).unwrap_err(),
            PipelineError::EmptyData
        ));
    }
}
