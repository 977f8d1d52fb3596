//! Unified error and deviation computation.
//!
//! A single routine covers every formula in [`FormulaKind`], both comparison
//! modes, and the outlier exclusion policy. Outliers are returned on the
//! result, logged as `warn` events, and optionally handed to an
//! [`OutlierSink`].

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, warn};

use crate::config::CalculatorConfig;
use crate::deviation::mean_broadcast;
use crate::error::{MetricError, Result};
use crate::formula::FormulaKind;

/// How the two sequences relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Two independent samples compared element by element.
    Error,
    /// A sample compared against a mean: its own, or the reference's.
    Deviation,
}

impl Mode {
    /// Deviation is forced on when there is no observed sample.
    pub fn resolve(has_observed: bool, deviation: bool) -> Self {
        if deviation || !has_observed {
            Mode::Deviation
        } else {
            Mode::Error
        }
    }
}

/// A pair excluded from the aggregate because its absolute difference
/// exceeded the outlier threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    pub index: usize,
    pub reference: f64,
    pub observed: f64,
    pub difference: f64,
}

/// Receives every outlier as it is excluded.
pub trait OutlierSink {
    fn record(&mut self, outlier: &Outlier);
}

impl<F> OutlierSink for F
where
    F: FnMut(&Outlier),
{
    fn record(&mut self, outlier: &Outlier) {
        self(outlier)
    }
}

/// Collects outliers in exclusion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutlierLog(pub Vec<Outlier>);

impl OutlierSink for OutlierLog {
    fn record(&mut self, outlier: &Outlier) {
        self.0.push(outlier.clone());
    }
}

/// Outcome of a single computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResult {
    pub formula: FormulaKind,
    pub mode: Mode,
    pub value: f64,
    /// Pairs that contributed to the average.
    pub included: usize,
    /// Pairs dropped as outliers.
    pub excluded: usize,
    pub outliers: Vec<Outlier>,
}

/// Reusable calculator settings.
///
/// ```ignore
/// let result = ErrorCalculator::new(FormulaKind::Rmse)
///     .outlier_threshold(10.0)
///     .compute(&reference, Some(&observed))?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorCalculator {
    formula: FormulaKind,
    deviation: bool,
    outlier_threshold: Option<f64>,
}

impl ErrorCalculator {
    pub fn new(formula: FormulaKind) -> Self {
        ErrorCalculator {
            formula,
            deviation: false,
            outlier_threshold: None,
        }
    }

    pub fn from_config(config: &CalculatorConfig) -> Self {
        ErrorCalculator {
            formula: config.formula,
            deviation: config.deviation,
            outlier_threshold: config.outlier_threshold,
        }
    }

    pub fn deviation(mut self, deviation: bool) -> Self {
        self.deviation = deviation;
        self
    }

    pub fn outlier_threshold(mut self, threshold: f64) -> Self {
        self.outlier_threshold = Some(threshold);
        self
    }

    pub fn compute(&self, reference: &[f64], observed: Option<&[f64]>) -> Result<ErrorResult> {
        compute(
            self.formula,
            reference,
            observed,
            self.deviation,
            self.outlier_threshold,
        )
    }

    pub fn compute_with_sink(
        &self,
        reference: &[f64],
        observed: Option<&[f64]>,
        sink: &mut dyn OutlierSink,
    ) -> Result<ErrorResult> {
        compute_inner(
            self.formula,
            reference,
            observed,
            self.deviation,
            self.outlier_threshold,
            sink,
        )
    }
}

/// Computes `formula` between `reference` and `observed`.
///
/// Without `observed`, `reference` is compared against its own mean. With
/// `observed` and `deviation` set, `observed` is compared against the mean of
/// `reference`. A positive `outlier_threshold` drops every pair whose
/// absolute difference exceeds it, and the average is taken over the pairs
/// that remain.
///
/// # Errors
///
/// - [`MetricError::EmptySample`] if `reference` is empty.
/// - [`MetricError::LengthMismatch`] if the samples differ in length.
/// - [`MetricError::InvalidThreshold`] if the threshold is negative.
/// - [`MetricError::ZeroInReference`] for MAPE with a zero reference value.
/// - [`MetricError::DivisionByZero`] if every pair is an outlier.
pub fn compute(
    formula: FormulaKind,
    reference: &[f64],
    observed: Option<&[f64]>,
    deviation: bool,
    outlier_threshold: Option<f64>,
) -> Result<ErrorResult> {
    compute_inner(
        formula,
        reference,
        observed,
        deviation,
        outlier_threshold,
        &mut |_: &Outlier| {},
    )
}

#[tracing::instrument(
    level = "debug",
    skip(reference, observed, sink),
    fields(n = reference.len(), two_samples = observed.is_some())
)]
fn compute_inner(
    formula: FormulaKind,
    reference: &[f64],
    observed: Option<&[f64]>,
    deviation: bool,
    outlier_threshold: Option<f64>,
    sink: &mut dyn OutlierSink,
) -> Result<ErrorResult> {
    if reference.is_empty() {
        return Err(MetricError::EmptySample);
    }
    if let Some(observed) = observed {
        if observed.len() != reference.len() {
            return Err(MetricError::LengthMismatch {
                reference: reference.len(),
                observed: observed.len(),
            });
        }
    }
    let limit = active_threshold(outlier_threshold)?;

    let mode = Mode::resolve(observed.is_some(), deviation);
    let (reference, observed): (Cow<'_, [f64]>, Cow<'_, [f64]>) = match observed {
        None => (
            Cow::Borrowed(reference),
            Cow::Owned(mean_broadcast(reference).into_inner()),
        ),
        Some(observed) if deviation => (
            Cow::Owned(mean_broadcast(reference).into_inner()),
            Cow::Borrowed(observed),
        ),
        Some(observed) => (Cow::Borrowed(reference), Cow::Borrowed(observed)),
    };

    if formula.divides_by_reference() {
        if let Some(index) = reference.iter().position(|&r| r == 0.0) {
            return Err(MetricError::ZeroInReference { index });
        }
    }

    let (sum, outliers) = accumulate(formula, &reference, &observed, limit, sink);

    let n = reference.len();
    let excluded = outliers.len();
    let included = n - excluded;
    if included == 0 {
        return Err(MetricError::DivisionByZero { excluded });
    }

    let value = formula.finish(sum / included as f64);
    debug!(%formula, ?mode, included, excluded, value, "Computed error");

    Ok(ErrorResult {
        formula,
        mode,
        value,
        included,
        excluded,
        outliers,
    })
}

/// Thresholds of zero disable exclusion; negatives are rejected.
fn active_threshold(threshold: Option<f64>) -> Result<Option<f64>> {
    match threshold {
        Some(t) if t < 0.0 => Err(MetricError::InvalidThreshold(t)),
        Some(t) if t > 0.0 => Ok(Some(t)),
        _ => Ok(None),
    }
}

/// Sums per-element terms, skipping pairs further apart than `limit`.
fn accumulate(
    formula: FormulaKind,
    reference: &[f64],
    observed: &[f64],
    limit: Option<f64>,
    sink: &mut dyn OutlierSink,
) -> (f64, Vec<Outlier>) {
    let mut sum = 0.0;
    let mut outliers = Vec::new();

    for (index, (&r, &o)) in reference.iter().zip(observed).enumerate() {
        let difference = (r - o).abs();

        if limit.is_some_and(|limit| difference > limit) {
            warn!(
                index,
                reference = r,
                observed = o,
                difference,
                "Outlier excluded from calculation"
            );
            let outlier = Outlier {
                index,
                reference: r,
                observed: o,
                difference,
            };
            sink.record(&outlier);
            outliers.push(outlier);
            continue;
        }

        sum += formula.term(r, o);
    }

    (sum, outliers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: [f64; 10] = [0.5, 3.0, 4.0, 5.0, 6.0, 7.0, 10.0, 3.0, 0.6, 5.2];
    const OBSERVED: [f64; 10] = [1.0, 0.0, 2.0, 16.0, 5.5, 6.7, 11.0, 3.5, 0.5, 18.0];

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    fn with_outliers(formula: FormulaKind) -> ErrorResult {
        compute(formula, &REFERENCE, Some(&OBSERVED), false, Some(10.0)).unwrap()
    }

    #[test]
    fn test_mae_with_outliers() {
        let result = with_outliers(FormulaKind::Mae);
        assert!(approx(result.value, 0.9875, 1e-12));
        assert_eq!(result.excluded, 2);
        assert_eq!(result.included, 8);
        assert_eq!(result.mode, Mode::Error);
    }

    #[test]
    fn test_mape_with_outliers() {
        let result = with_outliers(FormulaKind::Mape);
        assert!(approx(result.value, 38.244, 38.244 * 1e-5));
    }

    #[test]
    fn test_mse_and_rmse_with_outliers() {
        let mse = with_outliers(FormulaKind::Mse);
        let rmse = with_outliers(FormulaKind::Rmse);
        assert!(approx(mse.value, 1.85625, 1e-12));
        assert!(approx(rmse.value, 1.36244, 1.36244 * 1e-5));
    }

    #[test]
    fn test_outlier_records() {
        let result = with_outliers(FormulaKind::Mae);
        let indices: Vec<usize> = result.outliers.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![3, 9]);

        let first = &result.outliers[0];
        assert_eq!(first.reference, 5.0);
        assert_eq!(first.observed, 16.0);
        assert_eq!(first.difference, 11.0);
    }

    #[test]
    fn test_sink_receives_each_outlier() {
        let mut seen = Vec::new();
        let calculator = ErrorCalculator::new(FormulaKind::Mse).outlier_threshold(10.0);
        let result = calculator
            .compute_with_sink(&REFERENCE, Some(&OBSERVED), &mut |o: &Outlier| {
                seen.push(o.clone())
            })
            .unwrap();

        assert_eq!(seen, result.outliers);
    }

    #[test]
    fn test_outlier_log_collects_in_order() {
        let mut log = OutlierLog::default();
        let result = ErrorCalculator::new(FormulaKind::Mae)
            .outlier_threshold(10.0)
            .compute_with_sink(&REFERENCE, Some(&OBSERVED), &mut log)
            .unwrap();

        assert_eq!(log.0.len(), 2);
        assert_eq!(log.0, result.outliers);
    }

    #[test]
    fn test_no_threshold_uses_every_pair() {
        let result = compute(FormulaKind::Mae, &[1.0, 2.0], Some(&[2.0, 4.0]), false, None).unwrap();
        assert_eq!(result.value, 1.5);
        assert_eq!(result.excluded, 0);
    }

    #[test]
    fn test_zero_threshold_disables_exclusion() {
        let result =
            compute(FormulaKind::Mae, &[1.0, 2.0], Some(&[2.0, 4.0]), false, Some(0.0)).unwrap();
        assert_eq!(result.excluded, 0);
    }

    #[test]
    fn test_difference_equal_to_threshold_is_kept() {
        let result =
            compute(FormulaKind::Mae, &[0.0, 0.0], Some(&[1.0, 3.0]), false, Some(1.0)).unwrap();
        assert_eq!(result.excluded, 1);
        assert_eq!(result.value, 1.0);
    }

    #[test]
    fn test_negative_threshold() {
        let err = compute(FormulaKind::Mae, &[1.0], Some(&[1.0]), false, Some(-1.0)).unwrap_err();
        assert_eq!(err, MetricError::InvalidThreshold(-1.0));
    }

    #[test]
    fn test_empty_sample() {
        let err = compute(FormulaKind::Mae, &[], None, false, None).unwrap_err();
        assert_eq!(err, MetricError::EmptySample);
    }

    #[test]
    fn test_length_mismatch() {
        let err = compute(FormulaKind::Mse, &[1.0, 2.0], Some(&[1.0]), false, None).unwrap_err();
        assert_eq!(
            err,
            MetricError::LengthMismatch {
                reference: 2,
                observed: 1
            }
        );
    }

    #[test]
    fn test_mape_rejects_zero_reference() {
        let err =
            compute(FormulaKind::Mape, &[1.0, 0.0], Some(&[1.0, 1.0]), false, None).unwrap_err();
        assert_eq!(err, MetricError::ZeroInReference { index: 1 });
    }

    #[test]
    fn test_zero_reference_allowed_for_other_formulas() {
        assert!(compute(FormulaKind::Mae, &[0.0], Some(&[1.0]), false, None).is_ok());
    }

    #[test]
    fn test_all_pairs_excluded() {
        let err =
            compute(FormulaKind::Rmse, &[0.0, 0.0], Some(&[5.0, 6.0]), false, Some(1.0)).unwrap_err();
        assert_eq!(err, MetricError::DivisionByZero { excluded: 2 });
    }

    #[test]
    fn test_one_list_deviation() {
        // population standard deviation of [2, 4, 4, 4, 5, 5, 7, 9] is 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let result = compute(FormulaKind::Rmse, &values, None, false, None).unwrap();
        assert_eq!(result.mode, Mode::Deviation);
        assert!(approx(result.value, 2.0, 1e-12));
    }

    #[test]
    fn test_two_list_deviation_uses_reference_mean() {
        // mean of reference is 2
        let result =
            compute(FormulaKind::Mae, &[1.0, 3.0], Some(&[2.0, 6.0]), true, None).unwrap();
        assert_eq!(result.mode, Mode::Deviation);
        assert_eq!(result.value, 2.0);
    }

    #[test]
    fn test_mape_deviation_rejects_zero_mean() {
        // mean of reference is 0, and that mean is the divisor
        let err =
            compute(FormulaKind::Mape, &[-1.0, 1.0], Some(&[2.0, 3.0]), true, None).unwrap_err();
        assert_eq!(err, MetricError::ZeroInReference { index: 0 });
    }

    #[test]
    fn test_one_list_deviation_excludes_outliers() {
        // mean is 8: differences are 7, 5, 12
        let result = compute(FormulaKind::Mae, &[1.0, 3.0, 20.0], None, false, Some(5.0)).unwrap();
        let indices: Vec<usize> = result.outliers.iter().map(|o| o.index).collect();

        assert_eq!(result.mode, Mode::Deviation);
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(result.outliers[0].observed, 8.0);
        assert_eq!(result.value, 5.0);
    }

    #[test]
    fn test_single_element() {
        let result = compute(FormulaKind::Mse, &[3.0], Some(&[1.0]), false, None).unwrap();
        assert_eq!(result.value, 4.0);
    }

    #[test]
    fn test_from_config() {
        let config = CalculatorConfig {
            formula: FormulaKind::Mape,
            deviation: true,
            outlier_threshold: Some(2.5),
        };
        let calculator = ErrorCalculator::from_config(&config);
        assert_eq!(
            calculator,
            ErrorCalculator::new(FormulaKind::Mape)
                .deviation(true)
                .outlier_threshold(2.5)
        );
    }

    #[test]
    fn test_mode_resolution() {
        assert_eq!(Mode::resolve(true, false), Mode::Error);
        assert_eq!(Mode::resolve(true, true), Mode::Deviation);
        assert_eq!(Mode::resolve(false, false), Mode::Deviation);
    }
}
