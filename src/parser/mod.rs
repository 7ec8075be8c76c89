//! Trial log scraping.
//!
//! This module extracts hyperparameters and metric values from the text
//! logs the experiment runner writes per trial. Extraction is driven by
//! a declarative table of (metric name, pattern) pairs so every tool
//! matches lines the same way.

pub mod runtime;

use crate::error::ScrapeError;
use crate::models::{ExperimentKey, MetricSet, TrialRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

static LEARNING_RATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"learning_rate=([\d.eE+-]+)").expect("valid pattern"));

static BATCH_SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"per_device_train_batch_size=(\d+)").expect("valid pattern"));

/// Compiled extraction patterns for a metric set.
///
/// Build once per run and reuse across every trial log.
#[derive(Debug)]
pub struct PatternTable {
    patterns: Vec<(String, Regex)>,
}

impl PatternTable {
    /// Compile one `<name> = <float>` pattern per metric in the set.
    pub fn for_metrics(set: &MetricSet) -> Self {
        let patterns = set
            .names()
            .iter()
            .map(|name| {
                let pattern = format!(r"{}\s+=\s+([\d.]+)", regex::escape(name));
                let re = Regex::new(&pattern).expect("metric pattern is valid");
                (name.clone(), re)
            })
            .collect();
        Self { patterns }
    }
}

/// Scrape one trial log into a [`TrialRecord`].
///
/// Every field follows a first-match-wins policy: once a line has
/// produced a value, later occurrences of the same key are ignored.
/// Missing keys leave the field `None`; only an unreadable file is an
/// error.
pub fn scrape_trial_log(
    path: &Path,
    key: &ExperimentKey,
    trial_id: &str,
    table: &PatternTable,
) -> Result<TrialRecord, ScrapeError> {
    if !path.exists() {
        return Err(ScrapeError::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;

    let mut learning_rate: Option<f64> = None;
    let mut batch_size: Option<u32> = None;
    let mut metrics: Vec<(String, Option<f64>)> = table
        .patterns
        .iter()
        .map(|(name, _)| (name.clone(), None))
        .collect();

    for line in content.lines() {
        if learning_rate.is_none() && line.starts_with("learning_rate") {
            learning_rate = LEARNING_RATE_RE
                .captures(line)
                .and_then(|c| c[1].parse::<f64>().ok());
        }

        if batch_size.is_none() && line.starts_with("per_device_train_batch_size") {
            batch_size = BATCH_SIZE_RE
                .captures(line)
                .and_then(|c| c[1].parse::<u32>().ok());
        }

        for (i, (name, re)) in table.patterns.iter().enumerate() {
            if metrics[i].1.is_none() && line.contains(name.as_str()) {
                if let Some(caps) = re.captures(line) {
                    metrics[i].1 = caps[1].parse::<f64>().ok();
                }
            }
        }
    }

    Ok(TrialRecord {
        key: key.clone(),
        trial_id: trial_id.to_string(),
        learning_rate,
        batch_size,
        metrics,
    })
}
