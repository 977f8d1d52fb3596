//! Sample input from literal lists and CSV files.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::io::Read;
use tracing::debug;

use crate::sample::Sample;

/// Parses a comma-separated list such as `"0.5, 3, 4"` into a [`Sample`].
///
/// # Errors
///
/// Returns an error if any entry is not a number.
pub fn parse_list(text: &str) -> Result<Sample> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .with_context(|| format!("invalid number '{s}'"))
        })
        .collect::<Result<Vec<f64>>>()
        .map(Sample::new)
}

#[derive(Debug, Deserialize)]
struct Row {
    reference: f64,
    #[serde(default)]
    observed: Option<f64>,
}

/// Reads a CSV with a `reference` column and an optional `observed` column.
///
/// Returns `None` for the observed sample when the column is absent or
/// empty on every row.
pub fn read_csv<R: Read>(reader: R) -> Result<(Sample, Option<Sample>)> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut reference = Vec::new();
    let mut observed = Vec::new();

    for (line, row) in rdr.deserialize::<Row>().enumerate() {
        let row = row.with_context(|| format!("invalid sample row {}", line + 1))?;
        reference.push(row.reference);
        if let Some(value) = row.observed {
            observed.push(value);
        }
    }

    debug!(
        rows = reference.len(),
        observed = observed.len(),
        "Samples read"
    );

    let observed = match observed.len() {
        0 => None,
        n if n == reference.len() => Some(Sample::new(observed)),
        n => bail!(
            "observed column has {n} values but reference has {}",
            reference.len()
        ),
    };

    Ok((Sample::new(reference), observed))
}

/// Reads samples from the CSV file at `path`. See [`read_csv`].
pub fn read_csv_file(path: &str) -> Result<(Sample, Option<Sample>)> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {path}"))?;
    read_csv(file)
}
