//! log1p / expm1 target transform.
//!
//! Both targets are modeled on the log scale; predictions are mapped back
//! with the exact inverse so `expm1(log1p(x)) == x` for non-negative x.

/// Element-wise `ln(1 + x)`.
pub fn log1p(series: &[f64]) -> Vec<f64> {
    series.iter().map(|&x| x.ln_1p()).collect()
}

/// Element-wise `exp(x) - 1`, the inverse of [`log1p`].
pub fn expm1(series: &[f64]) -> Vec<f64> {
    series.iter().map(|&x| x.exp_m1()).collect()
}
