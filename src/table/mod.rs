//! Tabular results reading.
//!
//! This module loads a per-experiment `results.csv` and selects the row
//! maximizing a metric column. The reader is column-name driven: it
//! makes no assumption about column order beyond the header row.

use crate::error::ScrapeError;
use std::path::{Path, PathBuf};

/// An in-memory results table for one experiment.
#[derive(Debug, Clone)]
pub struct ResultsTable {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultsTable {
    /// Load a results table from disk.
    pub fn load(path: &Path) -> Result<Self, ScrapeError> {
        if !path.exists() {
            return Err(ScrapeError::MissingFile(path.to_path_buf()));
        }

        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    /// The header row.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    #[allow(dead_code)] // Utility accessor
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no data rows.
    #[allow(dead_code)] // Utility accessor
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Select the row maximizing a metric column.
    ///
    /// Rows whose cell does not parse as a number are skipped; ties go
    /// to the earliest row. Errors when the column is absent or no row
    /// has a parseable value.
    pub fn best_row(&self, metric: &str) -> Result<BestRow<'_>, ScrapeError> {
        let col = self
            .column_index(metric)
            .ok_or_else(|| ScrapeError::MissingColumn {
                path: self.path.clone(),
                column: metric.to_string(),
            })?;

        let mut best: Option<(usize, f64)> = None;
        for (i, row) in self.rows.iter().enumerate() {
            let value = match row.get(col).and_then(|cell| cell.trim().parse::<f64>().ok()) {
                Some(v) if !v.is_nan() => v,
                _ => continue,
            };
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((i, value)),
            }
        }

        match best {
            Some((index, _)) => Ok(BestRow { table: self, index }),
            None => Err(ScrapeError::EmptyColumn {
                path: self.path.clone(),
                column: metric.to_string(),
            }),
        }
    }
}

/// A borrowed view of the winning row of a table.
#[derive(Debug, Clone, Copy)]
pub struct BestRow<'a> {
    table: &'a ResultsTable,
    index: usize,
}

impl<'a> BestRow<'a> {
    /// Cell value by column name; absent columns and empty cells are `None`.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let col = self.table.column_index(column)?;
        let cell = self.table.rows[self.index].get(col)?.trim();
        if cell.is_empty() {
            None
        } else {
            Some(cell)
        }
    }

    /// Cell value parsed as a float.
    #[allow(dead_code)] // Utility for numeric consumers
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column)?.parse::<f64>().ok()
    }
}
