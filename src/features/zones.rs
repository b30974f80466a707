//! Per-zone aggregate lookups: trailing-window medians and lag
//! autocorrelation, min-max scaled across zones.
//!
//! Both tables are computed once from the historical window ending at the
//! as-of timestamp (max observed timestamp floored to the day) and then
//! treated as static lookup data for training and test rows alike. The
//! fitted scaler travels with each table so test lookups reuse the same
//! parameters instead of refitting.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::core::{FeatureMatrix, TrainRecord};
use crate::error::{PipelineError, Result};
use crate::stats::{lag_autocorrelation, median};
use crate::transform::MinMaxScaler;

/// Trailing median windows: suffix and length in days.
const MEDIAN_WINDOWS: [(&str, i64); 4] = [("1m", 30), ("3m", 90), ("6m", 180), ("1y", 365)];

/// Autocorrelation lags: suffix and length in hours.
const AUTOCORR_LAGS: [(&str, usize); 3] = [("1d", 24), ("3d", 72), ("1w", 168)];

/// Configuration for the zone aggregator.
#[derive(Debug, Clone)]
pub struct ZoneAggregateConfig {
    /// Also emit per-window bandwidth-per-user ratio medians.
    pub include_ratios: bool,
    /// Trailing window for autocorrelation, in days; `None` = full history.
    pub autocorr_window_days: Option<i64>,
}

impl Default for ZoneAggregateConfig {
    fn default() -> Self {
        Self {
            include_ratios: false,
            autocorr_window_days: None,
        }
    }
}

/// Names of the median feature group, in column order.
pub fn median_feature_names(include_ratios: bool) -> Vec<String> {
    let mut names = Vec::new();
    for (suffix, _) in MEDIAN_WINDOWS {
        names.push(format!("median_user_{suffix}"));
        names.push(format!("median_bw_{suffix}"));
        if include_ratios {
            names.push(format!("median_bw_per_user_{suffix}"));
        }
    }
    names
}

/// Names of the autocorrelation feature group, in column order.
pub fn autocorr_feature_names() -> Vec<String> {
    let mut names = Vec::new();
    for (suffix, _) in AUTOCORR_LAGS {
        names.push(format!("lag_user_{suffix}"));
    }
    for (suffix, _) in AUTOCORR_LAGS {
        names.push(format!("lag_bw_{suffix}"));
    }
    names
}

/// One per-zone lookup table plus the scaler that normalized it.
#[derive(Debug, Clone)]
pub struct ZoneLookup {
    zones: Vec<String>,
    index: HashMap<String, usize>,
    table: FeatureMatrix,
    scaler: MinMaxScaler,
}

impl ZoneLookup {
    /// Zones in table row order.
    pub fn zones(&self) -> &[String] {
        &self.zones
    }

    /// Feature column names.
    pub fn feature_names(&self) -> &[String] {
        self.table.names()
    }

    /// The min-max parameters fitted on this table.
    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    /// Scaled feature value for one zone.
    pub fn value(&self, zone: &str, feature: &str) -> Result<f64> {
        let row = *self
            .index
            .get(zone)
            .ok_or_else(|| PipelineError::UnknownZone(zone.to_string()))?;
        Ok(self.table.column(feature)?[row])
    }

    /// Expand the lookup into per-row columns for the given zone sequence.
    pub fn broadcast(&self, zones: &[String]) -> Result<Vec<(String, Vec<f64>)>> {
        let rows: Vec<usize> = zones
            .iter()
            .map(|z| {
                self.index
                    .get(z.as_str())
                    .copied()
                    .ok_or_else(|| PipelineError::UnknownZone(z.clone()))
            })
            .collect::<Result<_>>()?;

        let mut columns = Vec::with_capacity(self.table.n_cols());
        for (c, name) in self.table.names().iter().enumerate() {
            let col = self.table.column_at(c);
            columns.push((name.clone(), rows.iter().map(|&r| col[r]).collect()));
        }
        Ok(columns)
    }
}

/// Median of the values whose timestamps fall within
/// `[as_of - days, as_of]`, both ends inclusive.
///
/// A zone with no observation inside the window falls back to its
/// full-series median, so shorter-lived zones still produce a value.
fn window_median(series: &[(NaiveDateTime, f64)], as_of: NaiveDateTime, days: i64) -> f64 {
    let from = as_of - Duration::days(days);
    let windowed: Vec<f64> = series
        .iter()
        .filter(|(ts, _)| *ts >= from && *ts <= as_of)
        .map(|&(_, v)| v)
        .collect();
    if windowed.is_empty() {
        let all: Vec<f64> = series.iter().map(|&(_, v)| v).collect();
        return median(&all);
    }
    median(&windowed)
}

/// Lag autocorrelation over the configured trailing window, with undefined
/// results replaced by zero.
fn window_autocorr(
    series: &[(NaiveDateTime, f64)],
    as_of: NaiveDateTime,
    window_days: Option<i64>,
    lag: usize,
) -> f64 {
    let values: Vec<f64> = match window_days {
        Some(days) => {
            let from = as_of - Duration::days(days);
            series
                .iter()
                .filter(|(ts, _)| *ts >= from && *ts <= as_of)
                .map(|&(_, v)| v)
                .collect()
        }
        None => series.iter().map(|&(_, v)| v).collect(),
    };
    let acf = lag_autocorrelation(&values, lag);
    if acf.is_nan() {
        0.0
    } else {
        acf
    }
}

/// Build both per-zone lookup tables (medians, autocorrelation) from the
/// annotated training rows.
pub fn zone_features(
    records: &[TrainRecord],
    config: &ZoneAggregateConfig,
) -> Result<(ZoneLookup, ZoneLookup)> {
    if records.is_empty() {
        return Err(PipelineError::EmptyData);
    }

    // As-of reference: max observed timestamp, floored to the day.
    let max_ts = records
        .iter()
        .map(TrainRecord::timestamp)
        .max()
        .ok_or(PipelineError::EmptyData)?;
    let as_of = max_ts.date().and_time(NaiveTime::MIN);

    // Time-ordered (timestamp, bandwidth, max_user) series per zone.
    let mut per_zone: HashMap<&str, Vec<(NaiveDateTime, f64, f64)>> = HashMap::new();
    for rec in records {
        per_zone
            .entry(rec.zone.as_str())
            .or_default()
            .push((rec.timestamp(), rec.bandwidth, rec.max_user));
    }
    for series in per_zone.values_mut() {
        series.sort_by_key(|&(ts, _, _)| ts);
    }

    let mut zones: Vec<String> = per_zone.keys().map(|z| z.to_string()).collect();
    zones.sort();
    debug!(n_zones = zones.len(), %as_of, "aggregating zone features");

    let mut median_table = FeatureMatrix::new(zones.len());
    let mut autocorr_table = FeatureMatrix::new(zones.len());

    let bw_series: HashMap<&str, Vec<(NaiveDateTime, f64)>> = per_zone
        .iter()
        .map(|(&z, s)| (z, s.iter().map(|&(ts, bw, _)| (ts, bw)).collect()))
        .collect();
    let user_series: HashMap<&str, Vec<(NaiveDateTime, f64)>> = per_zone
        .iter()
        .map(|(&z, s)| (z, s.iter().map(|&(ts, _, u)| (ts, u)).collect()))
        .collect();

    for (suffix, days) in MEDIAN_WINDOWS {
        let mut user_col = Vec::with_capacity(zones.len());
        let mut bw_col = Vec::with_capacity(zones.len());
        let mut ratio_col = Vec::with_capacity(zones.len());
        for zone in &zones {
            let med_user = window_median(&user_series[zone.as_str()], as_of, days);
            let med_bw = window_median(&bw_series[zone.as_str()], as_of, days);
            user_col.push(med_user);
            bw_col.push(med_bw);
            if config.include_ratios {
                // A zone whose median user count is zero has no meaningful
                // per-user ratio; pin it to zero instead of dividing.
                ratio_col.push(if med_user.abs() < 1e-12 {
                    0.0
                } else {
                    med_bw / med_user
                });
            }
        }
        median_table.push_column(format!("median_user_{suffix}"), user_col)?;
        median_table.push_column(format!("median_bw_{suffix}"), bw_col)?;
        if config.include_ratios {
            median_table.push_column(format!("median_bw_per_user_{suffix}"), ratio_col)?;
        }
    }

    for (suffix, lag) in AUTOCORR_LAGS {
        let col: Vec<f64> = zones
            .iter()
            .map(|z| {
                window_autocorr(&user_series[z.as_str()], as_of, config.autocorr_window_days, lag)
            })
            .collect();
        autocorr_table.push_column(format!("lag_user_{suffix}"), col)?;
    }
    for (suffix, lag) in AUTOCORR_LAGS {
        let col: Vec<f64> = zones
            .iter()
            .map(|z| {
                window_autocorr(&bw_series[z.as_str()], as_of, config.autocorr_window_days, lag)
            })
            .collect();
        autocorr_table.push_column(format!("lag_bw_{suffix}"), col)?;
    }

    let index: HashMap<String, usize> = zones
        .iter()
        .enumerate()
        .map(|(i, z)| (z.clone(), i))
        .collect();

    let (median_scaled, median_scaler) = MinMaxScaler::fit_transform(&median_table)?;
    let (autocorr_scaled, autocorr_scaler) = MinMaxScaler::fit_transform(&autocorr_table)?;

    Ok((
        ZoneLookup {
            zones: zones.clone(),
            index: index.clone(),
            table: median_scaled,
            scaler: median_scaler,
        },
        ZoneLookup {
            zones,
            index,
            table: autocorr_scaled,
            scaler: autocorr_scaler,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    /// Hourly records for one zone ending 2019-03-09 23:00, `days` long,
    /// with per-slot values from a closure over the slot index.
    fn zone_records(
        zone: &str,
        days: i64,
        value: impl Fn(usize) -> (f64, f64),
    ) -> Vec<TrainRecord> {
        let end = ts(2019, 3, 9, 23);
        let n = (days * 24) as usize;
        (0..n)
            .map(|i| {
                let slot = end - Duration::hours((n - 1 - i) as i64);
                let (bw, u) = value(i);
                TrainRecord::from_timestamp(zone.to_string(), slot, bw, u)
            })
            .collect()
    }

    // ==================== window_median ====================

    #[test]
    fn window_median_uses_exactly_the_inclusive_window() {
        let as_of = ts(2019, 3, 9, 0);
        let series = vec![
            (as_of - Duration::days(31), 1000.0), // outside
            (as_of - Duration::days(30), 1.0),    // boundary, inside
            (as_of - Duration::days(10), 3.0),
            (as_of, 5.0), // boundary, inside
        ];
        assert_relative_eq!(window_median(&series, as_of, 30), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn window_median_even_count_averages_middle_pair() {
        let as_of = ts(2019, 3, 9, 0);
        let series = vec![
            (as_of - Duration::days(3), 1.0),
            (as_of - Duration::days(2), 2.0),
            (as_of - Duration::days(1), 10.0),
            (as_of, 20.0),
        ];
        assert_relative_eq!(window_median(&series, as_of, 30), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn window_median_empty_window_falls_back_to_full_series() {
        let as_of = ts(2019, 3, 9, 0);
        let series = vec![
            (as_of - Duration::days(400), 7.0),
            (as_of - Duration::days(399), 9.0),
        ];
        assert_relative_eq!(window_median(&series, as_of, 30), 8.0, epsilon = 1e-12);
    }

    // ==================== window_autocorr ====================

    #[test]
    fn window_autocorr_daily_cycle_is_high_at_lag_24() {
        let as_of = ts(2019, 3, 9, 0);
        let series: Vec<(NaiveDateTime, f64)> = (0..(40 * 24))
            .map(|i| {
                let slot = as_of - Duration::hours((40 * 24 - 1 - i) as i64);
                (slot, ((i % 24) as f64 * std::f64::consts::PI / 12.0).sin())
            })
            .collect();
        let acf = window_autocorr(&series, as_of, Some(90), 24);
        assert!(acf > 0.99, "expected strong daily autocorr, got {}", acf);
    }

    #[test]
    fn window_autocorr_undefined_becomes_zero() {
        let as_of = ts(2019, 3, 9, 0);
        // Constant series: Pearson correlation is undefined.
        let series: Vec<(NaiveDateTime, f64)> = (0..400)
            .map(|i| (as_of - Duration::hours(i), 5.0))
            .collect();
        assert_relative_eq!(
            window_autocorr(&series, as_of, None, 24),
            0.0,
            epsilon = 1e-12
        );
    }

    // ==================== zone_features ====================

    #[test]
    fn lookup_tables_are_scaled_across_zones() {
        let mut records = zone_records("ZONE01", 40, |i| (100.0 + (i % 24) as f64, 10.0));
        records.extend(zone_records("ZONE02", 40, |i| (300.0 + (i % 24) as f64, 30.0)));
        let (medians, _) = zone_features(&records, &ZoneAggregateConfig::default()).unwrap();

        // With two zones, the low zone pins to 0 and the high zone to 1.
        assert_relative_eq!(
            medians.value("ZONE01", "median_bw_1m").unwrap(),
            0.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            medians.value("ZONE02", "median_bw_1m").unwrap(),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn constant_feature_maps_every_zone_to_zero() {
        // Identical user counts in both zones: the scaled column is all 0.
        let mut records = zone_records("ZONE01", 40, |i| (100.0 + i as f64, 25.0));
        records.extend(zone_records("ZONE02", 40, |i| (300.0 + i as f64, 25.0)));
        let (medians, _) = zone_features(&records, &ZoneAggregateConfig::default()).unwrap();
        assert_relative_eq!(
            medians.value("ZONE01", "median_user_1m").unwrap(),
            0.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            medians.value("ZONE02", "median_user_1m").unwrap(),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn ratio_columns_only_with_config() {
        let records = zone_records("ZONE01", 40, |i| (100.0, 10.0 + (i % 3) as f64));
        let cfg = ZoneAggregateConfig {
            include_ratios: true,
            autocorr_window_days: Some(90),
        };
        let (medians, _) = zone_features(&records, &cfg).unwrap();
        assert!(medians
            .feature_names()
            .contains(&"median_bw_per_user_1m".to_string()));

        let (medians, _) = zone_features(&records, &ZoneAggregateConfig::default()).unwrap();
        assert!(!medians
            .feature_names()
            .contains(&"median_bw_per_user_1m".to_string()));
    }

    #[test]
    fn broadcast_expands_rows_by_zone() {
        let mut records = zone_records("ZONE01", 40, |_| (100.0, 10.0));
        records.extend(zone_records("ZONE02", 40, |_| (300.0, 30.0)));
        let (medians, _) = zone_features(&records, &ZoneAggregateConfig::default()).unwrap();

        let zones = vec![
            "ZONE02".to_string(),
            "ZONE01".to_string(),
            "ZONE02".to_string(),
        ];
        let columns = medians.broadcast(&zones).unwrap();
        let (name, values) = &columns[1];
        assert_eq!(name, "median_bw_1m");
        assert_relative_eq!(values[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(values[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(values[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn unknown_zone_in_broadcast_is_an_error() {
        let records = zone_records("ZONE01", 40, |_| (100.0, 10.0));
        let (medians, _) = zone_features(&records, &ZoneAggregateConfig::default()).unwrap();
        assert!(medians.broadcast(&["ZONE09".to_string()]).is_err());
    }

    #[test]
    fn feature_name_lists_match_table_columns() {
        let records = zone_records("ZONE01", 40, |i| (100.0 + i as f64, 10.0));
        let cfg = ZoneAggregateConfig {
            include_ratios: true,
            autocorr_window_days: Some(90),
        };
        let (medians, autocorr) = zone_features(&records, &cfg).unwrap();
        assert_eq!(medians.feature_names(), median_feature_names(true).as_slice());
        assert_eq!(autocorr.feature_names(), autocorr_feature_names().as_slice());
    }
}
