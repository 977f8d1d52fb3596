//! Hypothesis testing with proportions.

use crate::error::{MetricError, Result};

/// Computes the z statistic of an observed proportion against the null
/// hypothesis proportion `p0`:
///
/// `z = (phat - p0) / sqrt(p0 * (1 - p0) / n)`, where `phat = count / n`.
///
/// # Errors
///
/// Returns [`MetricError::InvalidProportion`] unless `0 < p0 < 1`,
/// [`MetricError::InvalidSampleSize`] when `n` is zero and
/// [`MetricError::InvalidSampleCount`] when `count > n`.
pub fn z_statistic(p0: f64, n: u64, count: u64) -> Result<f64> {
    if !(p0 > 0.0 && p0 < 1.0) {
        return Err(MetricError::InvalidProportion(p0));
    }
    if n == 0 {
        return Err(MetricError::InvalidSampleSize(n));
    }
    if count > n {
        return Err(MetricError::InvalidSampleCount { count, size: n });
    }

    let size = n as f64;
    let phat = count as f64 / size;
    let standard_error = (p0 * (1.0 - p0) / size).sqrt();

    Ok((phat - p0) / standard_error)
}
