//! Directory walking and experiment discovery.
//!
//! This module locates experiment artifacts (results tables, experiment
//! id markers, trial logs) under a base directory and resolves the
//! externally-produced trial store of the experiment runner.

use crate::error::ScrapeError;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// One trial directory inside an experiment's trial store.
#[derive(Debug, Clone)]
pub struct TrialRef {
    /// Trial identifier (the directory name).
    pub trial_id: String,
    /// Path to the trial's log file.
    pub log_path: PathBuf,
}

/// Find every file with the given name in the subtree of `base_dir`.
///
/// Filesystem visitation order is not stable across platforms, so the
/// result is sorted to give a deterministic tie-break within a run.
/// Unreadable directories are skipped, not fatal.
pub fn find_named_files(base_dir: &Path, file_name: &str) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(base_dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .map(|entry| entry.into_path())
        .collect();

    paths.sort();
    paths
}

/// Read the experiment id from an `experiment_id.txt` marker file.
///
/// Only the first line counts; surrounding whitespace is trimmed.
pub fn read_experiment_id(path: &Path) -> Result<String, ScrapeError> {
    if !path.exists() {
        return Err(ScrapeError::MissingFile(path.to_path_buf()));
    }

    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    reader.read_line(&mut line)?;

    let id = line.trim().to_string();
    if id.is_empty() {
        return Err(ScrapeError::Parse {
            path: path.to_path_buf(),
            reason: "empty experiment id".to_string(),
        });
    }

    Ok(id)
}

/// Path to an experiment's trial store inside the runner's directory.
pub fn trial_store(nni_dir: &Path, experiment_id: &str) -> PathBuf {
    nni_dir
        .join(experiment_id)
        .join("environments")
        .join("local-env")
        .join("trials")
}

/// List the trial directories of an experiment, sorted by trial id.
///
/// Returns a `MissingFile` error when the store itself does not exist;
/// trial directories without a log are still listed (the parser reports
/// them individually).
pub fn list_trials(trial_dir: &Path) -> Result<Vec<TrialRef>, ScrapeError> {
    if !trial_dir.exists() {
        return Err(ScrapeError::MissingFile(trial_dir.to_path_buf()));
    }

    let mut trials = Vec::new();
    for entry in fs::read_dir(trial_dir)?.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let trial_id = entry.file_name().to_string_lossy().to_string();
        trials.push(TrialRef {
            log_path: path.join("trial.log"),
            trial_id,
        });
    }

    trials.sort_by(|a, b| a.trial_id.cmp(&b.trial_id));
    Ok(trials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_named_files_sorted() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        fs::create_dir_all(root.join("bert/clef")).unwrap();
        fs::create_dir_all(root.join("albert/clef")).unwrap();
        fs::write(root.join("bert/clef/results.csv"), "a,b\n").unwrap();
        fs::write(root.join("albert/clef/results.csv"), "a,b\n").unwrap();
        fs::write(root.join("bert/clef/other.txt"), "x").unwrap();

        let found = find_named_files(root, "results.csv");
        assert_eq!(found.len(), 2);
        // Sorted: albert before bert
        assert!(found[0].ends_with("albert/clef/results.csv"));
        assert!(found[1].ends_with("bert/clef/results.csv"));
    }

    #[test]
    fn test_read_experiment_id() {
        let tmp = TempDir::new().unwrap();
        let marker = tmp.path().join("experiment_id.txt");
        fs::write(&marker, "abc123xy\nleftover\n").unwrap();

        assert_eq!(read_experiment_id(&marker).unwrap(), "abc123xy");
    }

    #[test]
    fn test_read_experiment_id_missing_or_empty() {
        let tmp = TempDir::new().unwrap();

        let missing = tmp.path().join("experiment_id.txt");
        assert!(matches!(
            read_experiment_id(&missing),
            Err(ScrapeError::MissingFile(_))
        ));

        fs::write(&missing, "\n").unwrap();
        assert!(matches!(
            read_experiment_id(&missing),
            Err(ScrapeError::Parse { .. })
        ));
    }

    #[test]
    fn test_trial_store_layout() {
        let store = trial_store(Path::new("/nni"), "abc123");
        assert_eq!(
            store,
            PathBuf::from("/nni/abc123/environments/local-env/trials")
        );
    }

    #[test]
    fn test_list_trials_sorted() {
        let tmp = TempDir::new().unwrap();
        let store = tmp.path().join("trials");
        fs::create_dir_all(store.join("zz1")).unwrap();
        fs::create_dir_all(store.join("aa2")).unwrap();
        fs::write(store.join("stray.txt"), "x").unwrap();

        let trials = list_trials(&store).unwrap();
        assert_eq!(trials.len(), 2);
        assert_eq!(trials[0].trial_id, "aa2");
        assert_eq!(trials[1].trial_id, "zz1");
        assert!(trials[0].log_path.ends_with("aa2/trial.log"));
    }

    #[test]
    fn test_list_trials_missing_store() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nowhere");
        assert!(matches!(
            list_trials(&missing),
            Err(ScrapeError::MissingFile(_))
        ));
    }
}
