pub mod calculator;
pub mod config;
pub mod deviation;
pub mod error;
pub mod formula;
pub mod hypothesis;
pub mod input;
pub mod output;
pub mod sample;

pub use calculator::{ErrorCalculator, ErrorResult, Mode, Outlier, OutlierLog, OutlierSink, compute};
pub use error::MetricError;
pub use formula::FormulaKind;
pub use sample::Sample;
