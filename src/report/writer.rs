//! Tabular writer and print-mode report.
//!
//! Rows are ordered field lists rather than maps so output columns keep
//! a deterministic order: identity columns first, then metrics in
//! enumeration order, then extras in first-observed order.

use anyhow::{Context, Result};
use std::fmt::Display;
use std::path::Path;
use tracing::info;

/// One output row: ordered (column, value) pairs.
///
/// A `None` value serializes as an empty CSV cell.
#[derive(Debug, Clone, Default)]
pub struct Row {
    fields: Vec<(String, Option<String>)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append or replace a column value.
    pub fn set<V: Display>(&mut self, column: &str, value: Option<V>) {
        let value = value.map(|v| v.to_string());
        match self.fields.iter_mut().find(|(c, _)| c == column) {
            Some(field) => field.1 = value,
            None => self.fields.push((column.to_string(), value)),
        }
    }

    /// Value of a column, if present and non-empty.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }
}

/// Union of all row columns, in first-observed order.
///
/// Derived from the materialized rows in a single post-pass, so the
/// header never depends on accumulation during the tree walk.
pub fn union_columns(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for column in row.columns() {
            if !columns.iter().any(|c| c == column) {
                columns.push(column.to_string());
            }
        }
    }
    columns
}

/// Write rows to a CSV file, creating the parent directory if needed.
///
/// The header is the column union across all rows; cells missing from a
/// row are written empty. An existing file is overwritten.
pub fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }

    let columns = union_columns(rows);
    if columns.is_empty() {
        // Nothing parsed anywhere; leave an empty file rather than
        // asking the CSV writer for a zero-field record.
        std::fs::write(path, "")
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Results saved to {}", path.display());
        return Ok(());
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;

    writer.write_record(&columns)?;
    for row in rows {
        let record: Vec<&str> = columns
            .iter()
            .map(|c| row.get(c).unwrap_or(""))
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;

    info!("Results saved to {}", path.display());
    Ok(())
}

/// Print each row as one human-readable line.
pub fn print_rows(rows: &[Row]) {
    for row in rows {
        let line: Vec<String> = row
            .columns()
            .map(|c| format!("{}: {}", label_for(c), row.get(c).unwrap_or("")))
            .collect();
        println!("{}", line.join(", "));
    }
}

/// Print each row as one human-readable line, plus a total count.
pub fn print_report(rows: &[Row], noun: &str) {
    print_rows(rows);
    println!("Total {}: {}", noun, rows.len());
}

fn label_for(column: &str) -> &str {
    match column {
        "model_name" => "Model",
        "dataset_name" => "Dataset",
        "learning_rate" => "Learning Rate",
        "batch_size" => "Batch Size",
        "train_runtime" => "Train Runtime",
        "predict_runtime" => "Predict Runtime",
        "total_runtime" => "Total Runtime",
        other => other,
    }
}
