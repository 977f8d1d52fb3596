use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MetricError;

/// The error measures supported by the calculator.
///
/// | Formula | Per-element term         | Post-transform |
/// |---------|--------------------------|----------------|
/// | MAE     | \|r - o\|                | none           |
/// | MAPE    | \|r - o\| / r            | x 100          |
/// | MSE     | (r - o)^2                | none           |
/// | RMSE    | (r - o)^2                | sqrt           |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FormulaKind {
    Mae,
    Mape,
    Mse,
    Rmse,
}

impl FormulaKind {
    pub const ALL: [FormulaKind; 4] = [
        FormulaKind::Mae,
        FormulaKind::Mape,
        FormulaKind::Mse,
        FormulaKind::Rmse,
    ];

    /// Error contributed by a single `(reference, observed)` pair.
    pub fn term(self, reference: f64, observed: f64) -> f64 {
        let diff = reference - observed;
        match self {
            FormulaKind::Mae => diff.abs(),
            FormulaKind::Mape => diff.abs() / reference,
            FormulaKind::Mse | FormulaKind::Rmse => diff * diff,
        }
    }

    /// Applied once to the averaged terms.
    pub fn finish(self, mean: f64) -> f64 {
        match self {
            FormulaKind::Mape => mean * 100.0,
            FormulaKind::Rmse => mean.sqrt(),
            FormulaKind::Mae | FormulaKind::Mse => mean,
        }
    }

    /// Whether the formula divides by the reference value.
    pub fn divides_by_reference(self) -> bool {
        matches!(self, FormulaKind::Mape)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormulaKind::Mae => "mae",
            FormulaKind::Mape => "mape",
            FormulaKind::Mse => "mse",
            FormulaKind::Rmse => "rmse",
        }
    }
}

impl fmt::Display for FormulaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormulaKind {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mae" => Ok(FormulaKind::Mae),
            "mape" => Ok(FormulaKind::Mape),
            "mse" => Ok(FormulaKind::Mse),
            "rmse" => Ok(FormulaKind::Rmse),
            _ => Err(MetricError::UnknownFormula(s.to_string())),
        }
    }
}

impl TryFrom<String> for FormulaKind {
    type Error = MetricError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}
