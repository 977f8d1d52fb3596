use crate::sample::Sample;

/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Returns a sample of the same length as `values` where every element is
/// the mean of `values`. Empty input gives an empty sample.
pub fn mean_broadcast(values: &[f64]) -> Sample {
    match mean(values) {
        Some(m) => Sample::new(vec![m; values.len()]),
        None => Sample::default(),
    }
}
