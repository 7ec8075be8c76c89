//! Error taxonomy for the aggregation pipeline.
//!
//! File-level errors are recoverable by design: the walk logs them and
//! moves on to the next experiment. Only output-write failures are fatal.

use std::path::PathBuf;
use thiserror::Error;

/// Error raised while scraping a single log or result table.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A referenced log or CSV file does not exist.
    #[error("file not found: {0}")]
    MissingFile(PathBuf),

    /// A line or value failed to match the expected pattern.
    #[error("parse failure in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// The requested metric column is absent from a results table.
    #[error("column '{column}' not found in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// The metric column exists but holds no parseable numeric value.
    #[error("column '{column}' has no numeric values in {path}")]
    EmptyColumn { path: PathBuf, column: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
