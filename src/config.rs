use anyhow::{Context, Result};
use serde::Deserialize;

use crate::formula::FormulaKind;

/// Default calculator settings.
///
/// Stored as a JSON object on disk:
/// ```json
/// {
///   "formula": "rmse",
///   "deviation": false,
///   "outlier_threshold": 10.0
/// }
/// ```
///
/// Every field is optional in the file. `ERROR_STATS_FORMULA`,
/// `ERROR_STATS_DEVIATION` and `ERROR_STATS_OUTLIER_THRESHOLD` override the
/// file when set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    pub formula: FormulaKind,
    pub deviation: bool,
    pub outlier_threshold: Option<f64>,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        CalculatorConfig {
            formula: FormulaKind::Mae,
            deviation: false,
            outlier_threshold: None,
        }
    }
}

impl CalculatorConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {path}"))?;
        Ok(config)
    }

    /// Applies `ERROR_STATS_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(formula) = lookup("ERROR_STATS_FORMULA") {
            self.formula = formula.parse()?;
        }
        if let Some(deviation) = lookup("ERROR_STATS_DEVIATION") {
            self.deviation = deviation
                .trim()
                .parse()
                .with_context(|| format!("ERROR_STATS_DEVIATION={deviation}"))?;
        }
        if let Some(threshold) = lookup("ERROR_STATS_OUTLIER_THRESHOLD") {
            self.outlier_threshold = Some(
                threshold
                    .trim()
                    .parse()
                    .with_context(|| format!("ERROR_STATS_OUTLIER_THRESHOLD={threshold}"))?,
            );
        }
        Ok(self)
    }

    /// Applies command-line values; `None` keeps the current setting.
    pub fn with_cli(
        mut self,
        formula: Option<FormulaKind>,
        deviation: Option<bool>,
        outlier_threshold: Option<f64>,
    ) -> Self {
        if let Some(formula) = formula {
            self.formula = formula;
        }
        if let Some(deviation) = deviation {
            self.deviation = deviation;
        }
        if outlier_threshold.is_some() {
            self.outlier_threshold = outlier_threshold;
        }
        self
    }
}
