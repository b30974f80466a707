//! Basic statistics used across the feature pipeline.

/// Returns the arithmetic mean, or NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Returns the median: the middle order statistic for an odd count, the
/// mean of the two middle order statistics for an even count. NaN for an
/// empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Pearson correlation between two equal-length slices.
///
/// Returns NaN when fewer than two pairs are available or either slice has
/// zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return f64::NAN;
    }
    let ma = mean(&a[..n]);
    let mb = mean(&b[..n]);

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] - ma;
        let db = b[i] - mb;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom < 1e-10 {
        return f64::NAN;
    }
    cov / denom
}

/// Lag autocorrelation as the Pearson correlation of the series with
/// itself shifted by `lag` rows.
///
/// Each slice of the pair keeps its own mean and variance, matching the
/// correlate-with-shifted-self convention rather than the classical ACF
/// estimator. Returns NaN when too few overlapping pairs exist.
pub fn lag_autocorrelation(series: &[f64], lag: usize) -> f64 {
    if lag == 0 {
        return 1.0;
    }
    if series.len() <= lag {
        return f64::NAN;
    }
    let n = series.len();
    pearson(&series[lag..], &series[..n - lag])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ==================== mean / median ====================

    #[test]
    fn mean_basic() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), 2.5, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn median_odd_count() {
        assert_relative_eq!(median(&[5.0, 1.0, 3.0]), 3.0, epsilon = 1e-10);
    }

    #[test]
    fn median_even_count_averages_middle_pair() {
        assert_relative_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5, epsilon = 1e-10);
    }

    #[test]
    fn median_empty_is_nan() {
        assert!(median(&[]).is_nan());
    }

    // ==================== pearson ====================

    #[test]
    fn pearson_perfect_positive() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![2.0, 4.0, 6.0, 8.0];
        assert_relative_eq!(pearson(&a, &b), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn pearson_perfect_negative() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![8.0, 6.0, 4.0, 2.0];
        assert_relative_eq!(pearson(&a, &b), -1.0, epsilon = 1e-10);
    }

    #[test]
    fn pearson_constant_is_nan() {
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
    }

    // ==================== lag_autocorrelation ====================

    #[test]
    fn lag_autocorrelation_lag_0() {
        assert_relative_eq!(
            lag_autocorrelation(&[1.0, 2.0, 3.0], 0),
            1.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn lag_autocorrelation_seasonal() {
        // Period-24 cycle should correlate strongly at lag 24.
        let series: Vec<f64> = (0..240)
            .map(|i| ((i % 24) as f64 * std::f64::consts::PI / 12.0).sin())
            .collect();
        let acf = lag_autocorrelation(&series, 24);
        assert!(acf > 0.99, "expected high lag-24 autocorr, got {}", acf);
    }

    #[test]
    fn lag_autocorrelation_short_series_is_nan() {
        assert!(lag_autocorrelation(&[1.0, 2.0], 5).is_nan());
        assert!(lag_autocorrelation(&[], 1).is_nan());
    }

    #[test]
    fn lag_autocorrelation_constant_is_nan() {
        assert!(lag_autocorrelation(&[3.0; 50], 24).is_nan());
    }
}
