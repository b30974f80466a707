//! Non-parametric "median of medians" estimator.
//!
//! For each (zone, hour-of-day) bucket, estimates the log-scale target
//! from the medians of the last few observations over a small ladder of
//! window sizes. The result is blended with the tree-ensemble prediction
//! downstream.

use std::collections::HashMap;

use tracing::warn;

use crate::core::TrainRecord;
use crate::stats::median;

/// Median-of-medians point estimate for one time-ordered series.
///
/// Finds the first strictly positive value; if fewer than the smallest
/// window size of observations remain from there to the end, falls back
/// to the median of everything after that point. Otherwise, for each
/// window size in the ascending list with enough trailing observations,
/// takes the median of the last `w` values, and returns the median of
/// that collection. `None` when no positive value exists or the fallback
/// slice is empty.
pub fn median_estimation(series: &[f64], windows: &[usize]) -> Option<f64> {
    let n = series.len();
    let start = series.iter().position(|&v| v > 0.0)?;
    let smallest = *windows.first()?;

    if n - start < smallest {
        let tail = &series[start + 1..];
        if tail.is_empty() {
            return None;
        }
        return Some(median(tail));
    }

    let mut medians = Vec::with_capacity(windows.len());
    for &w in windows {
        if w > n - start {
            break;
        }
        medians.push(median(&series[n - w..]));
    }
    if medians.is_empty() {
        None
    } else {
        Some(median(&medians))
    }
}

/// Per-(zone, hour) median-of-medians estimates on the log1p scale.
#[derive(Debug, Clone)]
pub struct BucketMedians {
    estimates: HashMap<(String, u32), (f64, f64)>,
}

impl BucketMedians {
    /// Fit bucket estimates from time-ordered training records.
    ///
    /// Records must already be sorted by time; bucket series keep that
    /// order. Buckets where no estimate exists fall back to zero on the
    /// log scale (a prediction of zero traffic) with a warning.
    pub fn fit(records: &[TrainRecord], windows: &[usize]) -> Self {
        let mut buckets: HashMap<(String, u32), (Vec<f64>, Vec<f64>)> = HashMap::new();
        for rec in records {
            let entry = buckets
                .entry((rec.zone.clone(), rec.hour))
                .or_default();
            entry.0.push(rec.bandwidth.ln_1p());
            entry.1.push(rec.max_user.ln_1p());
        }

        let estimates = buckets
            .into_iter()
            .map(|((zone, hour), (bw_log, user_log))| {
                let bw = median_estimation(&bw_log, windows).unwrap_or_else(|| {
                    warn!(zone = %zone, hour, "no bandwidth median estimate; defaulting to 0");
                    0.0
                });
                let user = median_estimation(&user_log, windows).unwrap_or_else(|| {
                    warn!(zone = %zone, hour, "no max-user median estimate; defaulting to 0");
                    0.0
                });
                ((zone, hour), (bw, user))
            })
            .collect();

        Self { estimates }
    }

    /// Original-scale (bandwidth, max_user) estimate for one bucket.
    pub fn predict(&self, zone: &str, hour: u32) -> Option<(f64, f64)> {
        self.estimates
            .get(&(zone.to_string(), hour))
            .map(|&(bw, user)| (bw.exp_m1(), user.exp_m1()))
    }
}
