//! Data models for the experiment aggregator.
//!
//! This module contains the core data structures used throughout
//! the application for representing trials, experiments, and metrics.

use std::fmt;
use std::path::Path;

/// The task family an experiment tree belongs to.
///
/// Sequence-labeling runs report `predict_overall_accuracy` while
/// classification runs report `predict_accuracy`; everything else in the
/// metric set is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Text/sequence classification.
    Classification,
    /// Token-level sequence labeling (NER).
    SequenceLabeling,
}

impl Task {
    /// Detect the task from the base directory path.
    ///
    /// Trees produced by the NER pipelines carry "ner" somewhere in the
    /// path; everything else is treated as classification.
    pub fn detect(base_dir: &Path) -> Self {
        if base_dir.to_string_lossy().contains("ner") {
            Task::SequenceLabeling
        } else {
            Task::Classification
        }
    }

    /// The accuracy metric key this task reports.
    pub fn accuracy_key(&self) -> &'static str {
        match self {
            Task::Classification => "predict_accuracy",
            Task::SequenceLabeling => "predict_overall_accuracy",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Classification => write!(f, "classification"),
            Task::SequenceLabeling => write!(f, "sequence-labeling"),
        }
    }
}

/// The fixed, ordered enumeration of recognized metric names.
///
/// Enumeration order is the column order in every output CSV.
#[derive(Debug, Clone)]
pub struct MetricSet {
    names: Vec<String>,
}

impl MetricSet {
    /// Build the metric set for a task: macro/micro/weighted
    /// f1/precision/recall plus the task-dependent accuracy key.
    pub fn for_task(task: Task) -> Self {
        let mut names = Vec::new();
        for avg in ["macro", "micro", "weighted"] {
            for stat in ["f1", "precision", "recall"] {
                names.push(format!("predict_{}_{}", avg, stat));
            }
        }
        names.push(task.accuracy_key().to_string());
        Self { names }
    }

    /// The metric names in enumeration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether a name is part of the recognized set.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// The (model, dataset) identity of one experiment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExperimentKey {
    /// Model name, second-innermost path segment.
    pub model_name: String,
    /// Dataset name, innermost path segment.
    pub dataset_name: String,
}

impl ExperimentKey {
    /// Derive the key from an experiment directory path.
    ///
    /// Returns `None` when the path has fewer than two named segments.
    pub fn from_dir(dir: &Path) -> Option<Self> {
        let dataset_name = dir.file_name()?.to_string_lossy().to_string();
        let model_name = dir.parent()?.file_name()?.to_string_lossy().to_string();
        Some(Self {
            model_name,
            dataset_name,
        })
    }
}

impl fmt::Display for ExperimentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.model_name, self.dataset_name)
    }
}

/// One hyperparameter configuration run, scraped from a trial log.
///
/// Immutable once built; missing fields stay `None` rather than failing
/// the parse.
#[derive(Debug, Clone)]
pub struct TrialRecord {
    /// Experiment this trial belongs to.
    pub key: ExperimentKey,
    /// Trial identifier (directory name in the trial store).
    pub trial_id: String,
    /// Learning rate, if the log contained one.
    pub learning_rate: Option<f64>,
    /// Per-device train batch size, if the log contained one.
    pub batch_size: Option<u32>,
    /// Metric values in metric-set order; unmatched metrics stay `None`.
    pub metrics: Vec<(String, Option<f64>)>,
}

impl TrialRecord {
    /// Look up a metric value by name.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| *v)
    }

    /// True when every metric in the set has a value.
    pub fn is_complete(&self) -> bool {
        self.metrics.iter().all(|(_, v)| v.is_some())
    }
}

/// Select the record maximizing a metric.
///
/// Records without a value for the metric are ignored. Ties resolve to
/// the first encountered record; an empty or all-missing input yields
/// `None`.
pub fn best_by_metric<'a>(records: &'a [TrialRecord], metric: &str) -> Option<&'a TrialRecord> {
    let mut best: Option<(&TrialRecord, f64)> = None;
    for record in records {
        if let Some(value) = record.metric(metric) {
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((record, value)),
            }
        }
    }
    best.map(|(record, _)| record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn make_record(trial_id: &str, f1: Option<f64>) -> TrialRecord {
        TrialRecord {
            key: ExperimentKey {
                model_name: "bert".to_string(),
                dataset_name: "clef".to_string(),
            },
            trial_id: trial_id.to_string(),
            learning_rate: Some(5e-5),
            batch_size: Some(32),
            metrics: vec![
                ("predict_micro_f1".to_string(), f1),
                ("predict_macro_f1".to_string(), None),
            ],
        }
    }

    #[test]
    fn test_task_detection() {
        assert_eq!(
            Task::detect(Path::new("/data/ner/experiments")),
            Task::SequenceLabeling
        );
        assert_eq!(
            Task::detect(Path::new("/data/cls/experiments")),
            Task::Classification
        );
    }

    #[test]
    fn test_metric_set_accuracy_key() {
        let ner = MetricSet::for_task(Task::SequenceLabeling);
        assert!(ner.contains("predict_overall_accuracy"));
        assert!(!ner.contains("predict_accuracy"));

        let cls = MetricSet::for_task(Task::Classification);
        assert!(cls.contains("predict_accuracy"));
        assert_eq!(cls.names().len(), 10);
    }

    #[test]
    fn test_experiment_key_from_dir() {
        let key = ExperimentKey::from_dir(&PathBuf::from("/exp/bert/clef")).unwrap();
        assert_eq!(key.model_name, "bert");
        assert_eq!(key.dataset_name, "clef");
    }

    #[test]
    fn test_best_by_metric_picks_maximum() {
        let records = vec![
            make_record("a", Some(0.5)),
            make_record("b", Some(0.9)),
            make_record("c", Some(0.7)),
        ];
        let best = best_by_metric(&records, "predict_micro_f1").unwrap();
        assert_eq!(best.trial_id, "b");

        // Order must not matter
        let reversed: Vec<_> = records.iter().rev().cloned().collect();
        let best = best_by_metric(&reversed, "predict_micro_f1").unwrap();
        assert_eq!(best.trial_id, "b");
    }

    #[test]
    fn test_best_by_metric_ties_pick_first() {
        let records = vec![
            make_record("first", Some(0.9)),
            make_record("second", Some(0.9)),
        ];
        let best = best_by_metric(&records, "predict_micro_f1").unwrap();
        assert_eq!(best.trial_id, "first");
    }

    #[test]
    fn test_best_by_metric_ignores_missing_values() {
        let records = vec![make_record("a", None), make_record("b", Some(0.1))];
        let best = best_by_metric(&records, "predict_micro_f1").unwrap();
        assert_eq!(best.trial_id, "b");

        let empty = vec![make_record("a", None)];
        assert!(best_by_metric(&empty, "predict_micro_f1").is_none());
    }

    #[test]
    fn test_is_complete() {
        let incomplete = make_record("a", Some(0.5));
        assert!(!incomplete.is_complete());

        let mut complete = make_record("a", Some(0.5));
        complete.metrics = vec![("predict_micro_f1".to_string(), Some(0.5))];
        assert!(complete.is_complete());
    }
}
