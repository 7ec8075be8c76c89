//! Aggregation pipelines.
//!
//! Each public function here is one linear pipeline: walk the tree,
//! extract records, group by (model, dataset), reduce to the best row,
//! and hand the rows to the writer. File-level errors are logged and
//! skipped; only writing the final output can fail the pipeline.

pub mod aggregator;

pub use aggregator::*;

use crate::error::ScrapeError;
use crate::models::{ExperimentKey, MetricSet, TrialRecord};
use crate::parser::{self, runtime, PatternTable};
use crate::report::{write_csv, Row};
use crate::scanner;
use crate::table::ResultsTable;
use anyhow::Result;
use std::path::Path;
use tracing::{debug, warn};

/// Scrape every experiment's trial logs into a `results.csv` next to
/// its `experiment_id.txt` marker. Returns the number of tables written.
pub fn parse_results(base_dir: &Path, nni_dir: &Path, set: &MetricSet) -> Result<usize> {
    let table = PatternTable::for_metrics(set);
    let mut written = 0;

    for marker in scanner::find_named_files(base_dir, "experiment_id.txt") {
        let Some(experiment_dir) = marker.parent().map(Path::to_path_buf) else {
            continue;
        };
        let Some(key) = ExperimentKey::from_dir(&experiment_dir) else {
            warn!("Cannot derive experiment key from {}", experiment_dir.display());
            continue;
        };
        let experiment_id = match scanner::read_experiment_id(&marker) {
            Ok(id) => id,
            Err(e) => {
                warn!("Skipping {}: {}", marker.display(), e);
                continue;
            }
        };

        let store = scanner::trial_store(nni_dir, &experiment_id);
        let trials = match scanner::list_trials(&store) {
            Ok(trials) => trials,
            Err(e) => {
                debug!("No trial store for {}: {}", key, e);
                continue;
            }
        };

        let mut rows = Vec::new();
        for trial in trials {
            match parser::scrape_trial_log(&trial.log_path, &key, &trial.trial_id, &table) {
                Ok(record) => rows.push(results_row(&record)),
                Err(e) => warn!("Skipping trial log {}: {}", trial.log_path.display(), e),
            }
        }

        write_csv(&experiment_dir.join("results.csv"), &rows)?;
        written += 1;
    }

    Ok(written)
}

fn results_row(record: &TrialRecord) -> Row {
    let mut row = Row::new();
    row.set("model_name", Some(&record.key.model_name));
    row.set("dataset_name", Some(&record.key.dataset_name));
    row.set("trialJobId", Some(&record.trial_id));
    row.set("learning_rate", record.learning_rate);
    row.set("per_device_train_batch_size", record.batch_size);
    for (name, value) in &record.metrics {
        row.set(name, *value);
    }
    row
}

/// Best hyperparameters per experiment, from `results.csv` tables.
pub fn best_hparams_rows(base_dir: &Path, metric: &str) -> Vec<Row> {
    collect_table_rows(base_dir, |path| best_hparams_row(path, metric))
}

fn best_hparams_row(path: &Path, metric: &str) -> Result<Option<Row>, ScrapeError> {
    let Some(key) = path.parent().and_then(ExperimentKey::from_dir) else {
        return Ok(None);
    };

    let table = ResultsTable::load(path)?;
    let best = table.best_row(metric)?;

    let mut row = Row::new();
    row.set("model_name", Some(&key.model_name));
    row.set("dataset_name", Some(&key.dataset_name));
    row.set("learning_rate", best.get("learning_rate"));
    row.set("batch_size", best.get("per_device_train_batch_size"));
    Ok(Some(row))
}

/// Best metric values per experiment, from `results.csv` tables.
pub fn best_metrics_rows(base_dir: &Path, metric: &str, set: &MetricSet) -> Vec<Row> {
    collect_table_rows(base_dir, |path| best_metrics_row(path, metric, set))
}

fn best_metrics_row(
    path: &Path,
    metric: &str,
    set: &MetricSet,
) -> Result<Option<Row>, ScrapeError> {
    let Some(key) = path.parent().and_then(ExperimentKey::from_dir) else {
        return Ok(None);
    };

    let table = ResultsTable::load(path)?;
    let best = table.best_row(metric)?;

    let mut row = Row::new();
    row.set("model_name", Some(&key.model_name));
    row.set("dataset_name", Some(&key.dataset_name));
    for name in set.names() {
        row.set(name, best.get(name));
    }
    Ok(Some(row))
}

/// Best metric values per experiment, scraped from `trial.log` files
/// directly instead of result tables.
///
/// With `require_complete`, trials missing any metric in the set are
/// dropped before the reduction.
pub fn best_metrics_rows_from_logs(
    base_dir: &Path,
    metric: &str,
    set: &MetricSet,
    require_complete: bool,
) -> Vec<Row> {
    let table = PatternTable::for_metrics(set);
    let mut records = Vec::new();

    for log_path in scanner::find_named_files(base_dir, "trial.log") {
        let Some(key) = log_path.parent().and_then(ExperimentKey::from_dir) else {
            continue;
        };
        // No trial store here; the containing directory names the trial.
        let trial_id = key.dataset_name.clone();
        match parser::scrape_trial_log(&log_path, &key, &trial_id, &table) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Error processing file {}: {}", log_path.display(), e),
        }
    }

    let best = reduce_to_best(group_records(records), metric, require_complete);
    best.iter()
        .map(|record| {
            let mut row = Row::new();
            row.set("model_name", Some(&record.key.model_name));
            row.set("dataset_name", Some(&record.key.dataset_name));
            for (name, value) in &record.metrics {
                row.set(name, *value);
            }
            row
        })
        .collect()
}

/// Entity-level metrics of the best trial, grouped per dataset.
///
/// Collects every `predict_*` column of the best row that is not part
/// of the standard metric set. Returns (dataset, rows) pairs in
/// first-seen dataset order; rows are indexed by model name.
pub fn entity_metrics_by_dataset(
    base_dir: &Path,
    metric: &str,
    set: &MetricSet,
) -> Vec<(String, Vec<Row>)> {
    let mut datasets: Vec<(String, Vec<Row>)> = Vec::new();

    for path in scanner::find_named_files(base_dir, "results.csv") {
        match entity_metrics_row(&path, metric, set) {
            Ok(Some((dataset, row))) => {
                match datasets.iter_mut().find(|(name, _)| *name == dataset) {
                    Some((_, rows)) => rows.push(row),
                    None => datasets.push((dataset, vec![row])),
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Error processing file {}: {}", path.display(), e),
        }
    }

    datasets
}

fn entity_metrics_row(
    path: &Path,
    metric: &str,
    set: &MetricSet,
) -> Result<Option<(String, Row)>, ScrapeError> {
    let Some(key) = path.parent().and_then(ExperimentKey::from_dir) else {
        return Ok(None);
    };

    let table = ResultsTable::load(path)?;
    let best = table.best_row(metric)?;

    let mut row = Row::new();
    row.set("model_name", Some(&key.model_name));
    for header in table.headers() {
        if header.starts_with("predict") && !set.contains(header) {
            row.set(header, best.get(header));
        }
    }
    Ok(Some((key.dataset_name, row)))
}

/// Train/predict runtimes of the best trial plus the summed runtime of
/// all trials, per experiment.
pub fn runtime_rows(base_dir: &Path, nni_dir: &Path, metric: &str) -> Vec<Row> {
    let mut rows = Vec::new();

    for marker in scanner::find_named_files(base_dir, "experiment_id.txt") {
        match runtime_row(&marker, nni_dir, metric) {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => {}
            Err(e) => warn!("Error processing {}: {}", marker.display(), e),
        }
    }

    rows
}

fn runtime_row(marker: &Path, nni_dir: &Path, metric: &str) -> Result<Option<Row>, ScrapeError> {
    let Some(experiment_dir) = marker.parent() else {
        return Ok(None);
    };
    let Some(key) = ExperimentKey::from_dir(experiment_dir) else {
        return Ok(None);
    };

    let experiment_id = scanner::read_experiment_id(marker)?;
    let store = scanner::trial_store(nni_dir, &experiment_id);
    let trials = match scanner::list_trials(&store) {
        Ok(trials) => trials,
        Err(e) => {
            debug!("No trial store for {}: {}", key, e);
            return Ok(None);
        }
    };

    let mut total = 0.0;
    for trial in &trials {
        match runtime::sum_train_runtimes(&trial.log_path) {
            Ok(seconds) => total += seconds,
            Err(e) => warn!("Skipping trial log {}: {}", trial.log_path.display(), e),
        }
    }

    let results_path = experiment_dir.join("results.csv");
    if !results_path.exists() {
        return Ok(None);
    }
    let table = ResultsTable::load(&results_path)?;
    let best = table.best_row(metric)?;
    let trial_id = best.get("trialJobId").ok_or_else(|| ScrapeError::Parse {
        path: results_path.clone(),
        reason: "best row has no trialJobId".to_string(),
    })?;

    let stamps = runtime::scrape_runtimes(&store.join(trial_id).join("trial.log"))?;

    // A summary row needs all three runtime values
    match (stamps.train, stamps.predict, total > 0.0) {
        (Some(train), Some(predict), true) => {
            let mut row = Row::new();
            row.set("model_name", Some(&key.model_name));
            row.set("dataset_name", Some(&key.dataset_name));
            row.set("train_runtime", Some(train));
            row.set("predict_runtime", Some(predict));
            row.set("total_runtime", Some(runtime::format_hms(total)));
            Ok(Some(row))
        }
        _ => Ok(None),
    }
}

fn collect_table_rows<F>(base_dir: &Path, mut extract: F) -> Vec<Row>
where
    F: FnMut(&Path) -> Result<Option<Row>, ScrapeError>,
{
    let mut rows = Vec::new();
    for path in scanner::find_named_files(base_dir, "results.csv") {
        match extract(&path) {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => {}
            Err(e) => warn!("Error processing file {}: {}", path.display(), e),
        }
    }
    rows
}
