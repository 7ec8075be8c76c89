//! Runtime stamp extraction and `H:MM:SS` arithmetic.
//!
//! Trial logs report runtimes as `H:MM:SS.ss` strings. The best-trial
//! summary keeps them verbatim, while the per-experiment total converts
//! each to seconds, sums, and re-serializes as `H:MM:SS`.

use crate::error::ScrapeError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

static TRAIN_RUNTIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"train_runtime\s+=\s+([\d:.]+)").expect("valid pattern"));

static PREDICT_RUNTIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"predict_runtime\s+=\s+([\d:.]+)").expect("valid pattern"));

/// Raw runtime stamps of one trial, as the log reported them.
#[derive(Debug, Clone, Default)]
pub struct RuntimeStamps {
    /// `train_runtime` value, verbatim.
    pub train: Option<String>,
    /// `predict_runtime` value, verbatim.
    pub predict: Option<String>,
}

/// Parse an `H:MM:SS.ss` stamp into seconds.
///
/// Hours are unbounded; minutes and seconds follow clock conventions.
pub fn parse_hms(stamp: &str) -> Option<f64> {
    let mut parts = stamp.split(':');
    let hours: f64 = parts.next()?.parse::<u64>().ok()? as f64;
    let minutes: f64 = parts.next()?.parse::<u64>().ok()? as f64;
    let seconds: f64 = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Serialize seconds as `H:MM:SS`, truncating the fractional part.
pub fn format_hms(seconds: f64) -> String {
    let total = seconds as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Extract the train/predict runtime stamps from a trial log.
///
/// First occurrence of each key wins; missing keys stay `None`.
pub fn scrape_runtimes(path: &Path) -> Result<RuntimeStamps, ScrapeError> {
    if !path.exists() {
        return Err(ScrapeError::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let mut stamps = RuntimeStamps::default();

    for line in content.lines() {
        if stamps.train.is_none() && line.contains("train_runtime") {
            if let Some(caps) = TRAIN_RUNTIME_RE.captures(line) {
                stamps.train = Some(caps[1].to_string());
            }
        }
        if stamps.predict.is_none() && line.contains("predict_runtime") {
            if let Some(caps) = PREDICT_RUNTIME_RE.captures(line) {
                stamps.predict = Some(caps[1].to_string());
            }
        }
    }

    Ok(stamps)
}

/// Sum every `train_runtime` occurrence in a trial log, in seconds.
///
/// Unlike [`scrape_runtimes`] this counts all occurrences, since a trial
/// may log the runtime of several training phases.
pub fn sum_train_runtimes(path: &Path) -> Result<f64, ScrapeError> {
    if !path.exists() {
        return Err(ScrapeError::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let mut total = 0.0;

    for line in content.lines() {
        if !line.contains("train_runtime") {
            continue;
        }
        if let Some(caps) = TRAIN_RUNTIME_RE.captures(line) {
            if let Some(seconds) = parse_hms(&caps[1]) {
                total += seconds;
            }
        }
    }

    Ok(total)
}
