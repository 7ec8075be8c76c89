//! Search-space and runner configuration generation.
//!
//! For every (model, dataset) pair in the grid configuration this
//! writes the runner's inputs: a JSON search space over the fixed
//! hyperparameter grid and a YAML experiment configuration using the
//! GridSearch tuner.

use crate::config::GridConfig;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tracing::info;

/// One `{"_type": "choice", "_value": [...]}` search-space dimension.
#[derive(Debug, Serialize)]
struct Choice {
    #[serde(rename = "_type")]
    kind: &'static str,
    #[serde(rename = "_value")]
    values: Vec<serde_json::Value>,
}

impl Choice {
    fn of(values: Vec<serde_json::Value>) -> Self {
        Self {
            kind: "choice",
            values,
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchSpace {
    model_name_or_path: Choice,
    dataset_name: Choice,
    learning_rate: Choice,
    per_device_train_batch_size: Choice,
}

/// Runner experiment configuration (`config.yml`).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunnerConfig {
    experiment_name: String,
    search_space_file: String,
    trial_command: String,
    trial_code_directory: String,
    trial_gpu_number: u32,
    trial_concurrency: u32,
    tuner: Tuner,
    training_service: TrainingService,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tuner {
    name: String,
    class_args: TunerArgs,
}

#[derive(Debug, Serialize)]
struct TunerArgs {
    optimize_mode: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrainingService {
    platform: String,
    max_trial_number_per_gpu: u32,
    use_active_gpu: bool,
}

/// Generate search-space and runner files for every (model, dataset)
/// pair. Returns the number of pairs written.
pub fn generate(base_dir: &Path, grid: &GridConfig) -> Result<usize> {
    let mut written = 0;

    for (model_name, model_path) in &grid.models {
        for (dataset_name, dataset_path) in &grid.datasets {
            let experiment_dir = base_dir
                .join("experiments")
                .join(model_name)
                .join(dataset_name);
            std::fs::create_dir_all(&experiment_dir).with_context(|| {
                format!("Failed to create {}", experiment_dir.display())
            })?;

            let hpset_file = format!("hpset_{}_{}.json", model_name, dataset_name);
            write_search_space(
                &experiment_dir.join(&hpset_file),
                model_path,
                dataset_path,
                grid,
            )?;
            write_runner_config(
                &experiment_dir.join("config.yml"),
                &format!("{}_{}", model_name, dataset_name),
                &hpset_file,
                grid,
            )?;

            written += 1;
        }
    }

    info!("Generated {} experiment configurations", written);
    Ok(written)
}

fn write_search_space(
    path: &Path,
    model_path: &str,
    dataset_path: &str,
    grid: &GridConfig,
) -> Result<()> {
    let space = SearchSpace {
        model_name_or_path: Choice::of(vec![json!(model_path)]),
        dataset_name: Choice::of(vec![json!(dataset_path)]),
        learning_rate: Choice::of(grid.learning_rates.iter().map(|lr| json!(lr)).collect()),
        per_device_train_batch_size: Choice::of(
            grid.batch_sizes.iter().map(|bs| json!(bs)).collect(),
        ),
    };

    let content = serde_json::to_string_pretty(&space)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn write_runner_config(
    path: &Path,
    experiment_name: &str,
    hpset_file: &str,
    grid: &GridConfig,
) -> Result<()> {
    let config = RunnerConfig {
        experiment_name: experiment_name.to_string(),
        search_space_file: hpset_file.to_string(),
        trial_command: grid.trial_command.clone(),
        trial_code_directory: "../../../".to_string(),
        trial_gpu_number: 1,
        trial_concurrency: grid.trial_concurrency,
        tuner: Tuner {
            name: "GridSearch".to_string(),
            class_args: TunerArgs {
                optimize_mode: "maximize".to_string(),
            },
        },
        training_service: TrainingService {
            platform: "local".to_string(),
            max_trial_number_per_gpu: 1,
            use_active_gpu: true,
        },
    };

    let content = serde_yaml::to_string(&config)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn grid() -> GridConfig {
        let mut grid = GridConfig::default();
        grid.models
            .insert("bert".to_string(), "/models/bert".to_string());
        grid.datasets
            .insert("clef".to_string(), "/data/clef".to_string());
        grid
    }

    #[test]
    fn test_generate_writes_both_files() {
        let tmp = TempDir::new().unwrap();
        let written = generate(tmp.path(), &grid()).unwrap();
        assert_eq!(written, 1);

        let dir = tmp.path().join("experiments/bert/clef");
        assert!(dir.join("hpset_bert_clef.json").exists());
        assert!(dir.join("config.yml").exists());
    }

    #[test]
    fn test_search_space_contents() {
        let tmp = TempDir::new().unwrap();
        generate(tmp.path(), &grid()).unwrap();

        let content = std::fs::read_to_string(
            tmp.path().join("experiments/bert/clef/hpset_bert_clef.json"),
        )
        .unwrap();
        let space: Value = serde_json::from_str(&content).unwrap();

        assert_eq!(space["model_name_or_path"]["_type"], "choice");
        assert_eq!(space["model_name_or_path"]["_value"][0], "/models/bert");
        assert_eq!(space["dataset_name"]["_value"][0], "/data/clef");
        assert_eq!(
            space["per_device_train_batch_size"]["_value"]
                .as_array()
                .unwrap()
                .len(),
            4
        );
        assert_eq!(
            space["learning_rate"]["_value"].as_array().unwrap().len(),
            7
        );
    }

    #[test]
    fn test_runner_config_contents() {
        let tmp = TempDir::new().unwrap();
        generate(tmp.path(), &grid()).unwrap();

        let content =
            std::fs::read_to_string(tmp.path().join("experiments/bert/clef/config.yml")).unwrap();
        let config: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();

        assert_eq!(config["experimentName"], "bert_clef");
        assert_eq!(config["searchSpaceFile"], "hpset_bert_clef.json");
        assert_eq!(config["tuner"]["name"], "GridSearch");
        assert_eq!(config["tuner"]["classArgs"]["optimize_mode"], "maximize");
        assert_eq!(config["trainingService"]["platform"], "local");
        assert_eq!(config["trainingService"]["useActiveGpu"].as_bool(), Some(true));
    }
}
