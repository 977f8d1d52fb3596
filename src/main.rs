//! CLI entry point for the error statistics tool.
//!
//! Provides subcommands for computing error / deviation measures between
//! samples and for the proportion z statistic.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use error_stats::config::CalculatorConfig;
use error_stats::hypothesis::z_statistic;
use error_stats::input::{parse_list, read_csv_file};
use error_stats::output::{ErrorReport, append_record, print_json, print_pretty};
use error_stats::{ErrorCalculator, FormulaKind, Sample};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "error_stats")]
#[command(about = "Error and deviation measures between samples", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute MAE, MAPE, MSE or RMSE between samples
    Compute {
        /// One of mae, mape, mse, rmse (defaults to the config file or mae)
        #[arg(value_name = "FORMULA")]
        formula: Option<FormulaKind>,

        /// Comma-separated reference ("true") values
        #[arg(short, long, conflicts_with = "input")]
        reference: Option<String>,

        /// Comma-separated observed values
        #[arg(short, long, conflicts_with = "input")]
        observed: Option<String>,

        /// CSV file with a `reference` column and an optional `observed` column
        #[arg(short, long)]
        input: Option<String>,

        /// Measure against the reference mean instead of the reference values
        #[arg(short, long, default_value_t = false)]
        deviation: bool,

        /// Compare the samples directly, even if the config enables deviation
        #[arg(long, default_value_t = false, conflicts_with = "deviation")]
        no_deviation: bool,

        /// Exclude pairs whose absolute difference exceeds this value
        #[arg(short = 't', long)]
        outlier_threshold: Option<f64>,

        /// JSON file with default calculator settings
        #[arg(short, long)]
        config: Option<String>,

        /// Label stored with the report
        #[arg(short, long)]
        label: Option<String>,

        /// CSV file to append the report to
        #[arg(long)]
        output: Option<String>,

        /// Log the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Z statistic of an observed proportion against a null hypothesis
    Zstat {
        /// Null hypothesis proportion, strictly between 0 and 1
        #[arg(long)]
        p0: f64,

        /// Sample size
        #[arg(short, long)]
        n: u64,

        /// Positive (or negative) counts out of the sample
        #[arg(short, long)]
        count: u64,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/error_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("error_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compute {
            formula,
            reference,
            observed,
            input,
            deviation,
            no_deviation,
            outlier_threshold,
            config,
            label,
            output,
            json,
        } => {
            let deviation = match (deviation, no_deviation) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let settings = match config {
                Some(path) => CalculatorConfig::load(&path)?,
                None => CalculatorConfig::default(),
            }
            .with_env_overrides()?
            .with_cli(formula, deviation, outlier_threshold);

            let (reference, observed) = load_samples(reference, observed, input)?;
            let calculator = ErrorCalculator::from_config(&settings);
            let result = calculator.compute(&reference, observed.as_deref())?;

            info!(
                formula = %result.formula,
                mode = ?result.mode,
                value = result.value,
                excluded = result.excluded,
                "Computed"
            );

            let mut report = ErrorReport::from_result(&result);
            if let Some(label) = &label {
                report = report.with_label(label);
            }

            if json {
                print_json(&report)?;
            } else {
                print_pretty(&report);
            }

            if let Some(path) = output {
                append_record(&path, &report)?;
            }

            println!("{}", result.value);
        }
        Commands::Zstat { p0, n, count } => {
            let z = z_statistic(p0, n, count)?;
            info!(p0, n, count, z, "Computed z statistic");
            println!("{z}");
        }
    }

    Ok(())
}

/// Resolves samples from literal lists or a CSV file.
#[tracing::instrument(skip_all)]
fn load_samples(
    reference: Option<String>,
    observed: Option<String>,
    input: Option<String>,
) -> Result<(Sample, Option<Sample>)> {
    match (reference, input) {
        (_, Some(path)) => read_csv_file(&path),
        (Some(reference), None) => {
            let observed = observed.as_deref().map(parse_list).transpose()?;
            Ok((parse_list(&reference)?, observed))
        }
        (None, None) => bail!("either --reference or --input is required"),
    }
}
