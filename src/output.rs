//! Output formatting and persistence for computed errors.
//!
//! Supports pretty-printing, JSON serialization, and CSV append.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, info};

use crate::calculator::{ErrorResult, Mode};
use crate::formula::FormulaKind;

/// One computed error, flattened for logging and CSV rows.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub timestamp: DateTime<Utc>,
    pub label: Option<String>,
    pub formula: FormulaKind,
    pub mode: Mode,
    pub samples: usize,
    pub excluded: usize,
    pub value: f64,
}

impl ErrorReport {
    pub fn from_result(result: &ErrorResult) -> Self {
        ErrorReport {
            timestamp: Utc::now(),
            label: None,
            formula: result.formula,
            mode: result.mode,
            samples: result.included + result.excluded,
            excluded: result.excluded,
            value: result.value,
        }
    }

    /// Attach a free-form label, e.g. the dataset name.
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &ErrorReport) {
    debug!("{:#?}", report);
}

/// Renders a report as pretty-printed JSON.
pub fn to_json(report: &ErrorReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Logs a report as pretty-printed JSON.
pub fn print_json(report: &ErrorReport) -> Result<()> {
    info!("{}", to_json(report)?);
    Ok(())
}

/// Appends an [`ErrorReport`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, report: &ErrorReport) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(report)?;
    writer.flush()?;

    Ok(())
}
