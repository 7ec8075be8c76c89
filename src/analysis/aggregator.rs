//! Grouping and best-record reduction.
//!
//! Trial records are grouped by their (model, dataset) key and each
//! group is reduced to the record maximizing the chosen metric.

use crate::models::{best_by_metric, ExperimentKey, TrialRecord};

/// Group records by experiment key, preserving first-seen group order.
///
/// Record order within a group follows input order, which is the
/// tie-break order of the reduction.
pub fn group_records(records: Vec<TrialRecord>) -> Vec<(ExperimentKey, Vec<TrialRecord>)> {
    let mut groups: Vec<(ExperimentKey, Vec<TrialRecord>)> = Vec::new();

    for record in records {
        match groups.iter_mut().find(|(key, _)| *key == record.key) {
            Some((_, members)) => members.push(record),
            None => groups.push((record.key.clone(), vec![record])),
        }
    }

    groups
}

/// Reduce each group to its best record by the given metric.
///
/// With `require_complete`, records missing any metric value are
/// dropped before the reduction. Groups left with no eligible record
/// are omitted, so the output has at most one record per group.
pub fn reduce_to_best(
    groups: Vec<(ExperimentKey, Vec<TrialRecord>)>,
    metric: &str,
    require_complete: bool,
) -> Vec<TrialRecord> {
    let mut best_records = Vec::new();

    for (_, members) in groups {
        let eligible: Vec<TrialRecord> = if require_complete {
            members.into_iter().filter(|r| r.is_complete()).collect()
        } else {
            members
        };

        if let Some(best) = best_by_metric(&eligible, metric) {
            best_records.push(best.clone());
        }
    }

    best_records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(model: &str, dataset: &str, trial_id: &str, f1: Option<f64>) -> TrialRecord {
        TrialRecord {
            key: ExperimentKey {
                model_name: model.to_string(),
                dataset_name: dataset.to_string(),
            },
            trial_id: trial_id.to_string(),
            learning_rate: None,
            batch_size: None,
            metrics: vec![("predict_micro_f1".to_string(), f1)],
        }
    }

    #[test]
    fn test_grouping_yields_one_row_per_pair() {
        let records = vec![
            make_record("bert", "clef", "t1", Some(0.5)),
            make_record("albert", "clef", "t2", Some(0.6)),
            make_record("bert", "clef", "t3", Some(0.9)),
            make_record("bert", "ggponc", "t4", Some(0.7)),
        ];

        let groups = group_records(records);
        assert_eq!(groups.len(), 3);

        let best = reduce_to_best(groups, "predict_micro_f1", false);
        assert_eq!(best.len(), 3);
        assert_eq!(best[0].trial_id, "t3");
        assert_eq!(best[1].trial_id, "t2");
        assert_eq!(best[2].trial_id, "t4");
    }

    #[test]
    fn test_empty_group_omitted() {
        let records = vec![
            make_record("bert", "clef", "t1", None),
            make_record("albert", "clef", "t2", Some(0.6)),
        ];

        let best = reduce_to_best(group_records(records), "predict_micro_f1", false);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].trial_id, "t2");
    }

    #[test]
    fn test_completeness_filter() {
        let mut incomplete = make_record("bert", "clef", "t1", Some(0.99));
        incomplete
            .metrics
            .push(("predict_macro_f1".to_string(), None));
        let complete = make_record("bert", "clef", "t2", Some(0.5));

        let records = vec![incomplete.clone(), complete.clone()];
        let best = reduce_to_best(group_records(records), "predict_micro_f1", true);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].trial_id, "t2");

        // Without the filter the higher score wins
        let records = vec![incomplete, complete];
        let best = reduce_to_best(group_records(records), "predict_micro_f1", false);
        assert_eq!(best[0].trial_id, "t1");
    }
}
