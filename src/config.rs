//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.expsum.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Metric selection settings.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Hyperparameter grid settings for config generation.
    #[serde(default)]
    pub grid: GridConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Path to the NNI experiment store (~ is expanded).
    #[serde(default = "default_nni_dir")]
    pub nni_dir: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            nni_dir: default_nni_dir(),
            verbose: false,
        }
    }
}

fn default_nni_dir() -> String {
    "~/nni-experiments".to_string()
}

/// Metric selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Metric column to maximize when none is given on the CLI.
    #[serde(default = "default_metric")]
    pub default_metric: String,

    /// Require every metric in the set to be present before a
    /// log-scraped record is included in the summary.
    #[serde(default = "default_true")]
    pub require_complete: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            default_metric: default_metric(),
            require_complete: true,
        }
    }
}

fn default_metric() -> String {
    "predict_micro_f1".to_string()
}

fn default_true() -> bool {
    true
}

/// Hyperparameter grid and runner settings for `gen-configs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Learning rate grid values.
    #[serde(default = "default_learning_rates")]
    pub learning_rates: Vec<f64>,

    /// Per-device train batch size grid values.
    #[serde(default = "default_batch_sizes")]
    pub batch_sizes: Vec<u32>,

    /// Command the runner executes per trial.
    #[serde(default = "default_trial_command")]
    pub trial_command: String,

    /// Number of concurrent trials per GPU host.
    #[serde(default = "default_trial_concurrency")]
    pub trial_concurrency: u32,

    /// Model name -> model path or hub id.
    #[serde(default)]
    pub models: BTreeMap<String, String>,

    /// Dataset name -> dataset path.
    #[serde(default)]
    pub datasets: BTreeMap<String, String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            learning_rates: default_learning_rates(),
            batch_sizes: default_batch_sizes(),
            trial_command: default_trial_command(),
            trial_concurrency: default_trial_concurrency(),
            models: BTreeMap::new(),
            datasets: BTreeMap::new(),
        }
    }
}

fn default_learning_rates() -> Vec<f64> {
    vec![7e-5, 5e-5, 2e-5, 1e-5, 7e-6, 5e-6, 1e-6]
}

fn default_batch_sizes() -> Vec<u32> {
    vec![16, 32, 48, 64]
}

fn default_trial_command() -> String {
    "python run_classification.py".to_string()
}

fn default_trial_concurrency() -> u32 {
    2
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".expsum.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Resolve the NNI store path, preferring an explicit CLI value.
    ///
    /// A leading `~/` is expanded against the user's home directory.
    pub fn resolve_nni_dir(&self, cli_value: Option<&PathBuf>) -> PathBuf {
        match cli_value {
            Some(path) => expand_tilde(&path.to_string_lossy()),
            None => expand_tilde(&self.general.nni_dir),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.nni_dir, "~/nni-experiments");
        assert_eq!(config.metrics.default_metric, "predict_micro_f1");
        assert!(config.metrics.require_complete);
        assert_eq!(config.grid.batch_sizes, vec![16, 32, 48, 64]);
        assert_eq!(config.grid.learning_rates.len(), 7);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
nni_dir = "/data/nni"
verbose = true

[metrics]
default_metric = "predict_macro_f1"
require_complete = false

[grid]
batch_sizes = [8, 16]

[grid.models]
bert = "/models/bert"

[grid.datasets]
clef = "/data/clef"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.nni_dir, "/data/nni");
        assert!(config.general.verbose);
        assert_eq!(config.metrics.default_metric, "predict_macro_f1");
        assert!(!config.metrics.require_complete);
        assert_eq!(config.grid.batch_sizes, vec![8, 16]);
        assert_eq!(config.grid.models.get("bert").unwrap(), "/models/bert");
        assert_eq!(config.grid.datasets.get("clef").unwrap(), "/data/clef");
    }

    #[test]
    fn test_resolve_nni_dir_prefers_cli() {
        let config = Config::default();
        let cli = PathBuf::from("/explicit/nni");
        assert_eq!(config.resolve_nni_dir(Some(&cli)), cli);
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/nni-experiments"), home.join("nni-experiments"));
        }
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[metrics]"));
        assert!(toml_str.contains("[grid]"));
    }
}
