//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Expsum - hyperparameter-search experiment aggregator
///
/// Scrapes per-trial logs and per-experiment result tables produced by an
/// NNI-style experiment runner, reduces each experiment to its best trial,
/// and writes summary CSVs.
///
/// Examples:
///   expsum parse-results ./experiments --nni-dir ~/nni-experiments
///   expsum best-hparams ./experiments
///   expsum best-metrics ./experiments --metric predict_micro_f1
///   expsum entity-metrics ./experiments --print
///   expsum runtimes ./experiments
///   expsum gen-configs ./experiments
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .expsum.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// One aggregation tool per subcommand.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Scrape trial logs into one results.csv per experiment
    ///
    /// Walks BASE_DIR for experiment_id.txt files, resolves each
    /// experiment's trial store under --nni-dir, and scrapes every
    /// trial.log into a tabular results file.
    ParseResults {
        /// Directory to search for experiment ids
        base_dir: PathBuf,

        /// Path to the NNI experiment store
        #[arg(long, value_name = "DIR", env = "EXPSUM_NNI_DIR")]
        nni_dir: Option<PathBuf>,
    },

    /// Summarize the best hyperparameters per experiment
    BestHparams {
        /// Directory to search for results.csv files
        base_dir: PathBuf,

        /// Metric column to maximize
        #[arg(long, default_value = "reward", value_name = "NAME")]
        metric: String,

        /// Print the results instead of saving to a CSV file
        #[arg(long)]
        print: bool,
    },

    /// Summarize the best metric values per experiment
    BestMetrics {
        /// Directory to search for results.csv (or trial.log) files
        base_dir: PathBuf,

        /// Metric column to maximize
        ///
        /// Defaults to the configured default_metric (predict_micro_f1).
        #[arg(long, value_name = "NAME")]
        metric: Option<String>,

        /// Scrape trial.log files directly instead of results.csv
        #[arg(long)]
        from_logs: bool,

        /// Print the results instead of saving to a CSV file
        #[arg(long)]
        print: bool,
    },

    /// Summarize entity-level metrics, one CSV per dataset
    ///
    /// Collects every predict_* column that is not part of the standard
    /// metric set and writes best_<dataset>_metrics.csv files indexed by
    /// model name.
    EntityMetrics {
        /// Directory to search for results.csv files
        base_dir: PathBuf,

        /// Metric column to maximize
        #[arg(long, default_value = "eval_micro_f1", value_name = "NAME")]
        metric: String,

        /// Print the results instead of saving to a CSV file
        #[arg(long)]
        print: bool,
    },

    /// Summarize train/predict runtimes of the best trials
    Runtimes {
        /// Directory to search for experiment ids and results.csv files
        base_dir: PathBuf,

        /// Metric column to maximize
        #[arg(long, value_name = "NAME")]
        metric: Option<String>,

        /// Path to the NNI experiment store
        #[arg(long, value_name = "DIR", env = "EXPSUM_NNI_DIR")]
        nni_dir: Option<PathBuf>,

        /// Print the results instead of saving to a CSV file
        #[arg(long)]
        print: bool,
    },

    /// Generate search-space JSON and runner YAML per (model, dataset)
    GenConfigs {
        /// Directory to place the experiments/ tree in
        base_dir: PathBuf,
    },

    /// Generate a default .expsum.toml configuration file
    InitConfig,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(base_dir) = self.base_dir() {
            if !base_dir.exists() {
                return Err(format!("Base directory does not exist: {}", base_dir.display()));
            }
            if !base_dir.is_dir() {
                return Err(format!("Base path is not a directory: {}", base_dir.display()));
            }
        }

        Ok(())
    }

    /// The base directory of the selected subcommand, if it has one.
    pub fn base_dir(&self) -> Option<&PathBuf> {
        match &self.command {
            Command::ParseResults { base_dir, .. }
            | Command::BestHparams { base_dir, .. }
            | Command::BestMetrics { base_dir, .. }
            | Command::EntityMetrics { base_dir, .. }
            | Command::Runtimes { base_dir, .. } => Some(base_dir),
            // gen-configs creates the tree itself
            Command::GenConfigs { .. } | Command::InitConfig => None,
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            command,
            config: None,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::InitConfig);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_base_dir() {
        let args = make_args(Command::BestHparams {
            base_dir: PathBuf::from("/no/such/directory"),
            metric: "reward".to_string(),
            print: false,
        });
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let args = Args::try_parse_from([
            "expsum",
            "best-metrics",
            "/tmp",
            "--metric",
            "predict_macro_f1",
            "--print",
        ])
        .unwrap();

        match args.command {
            Command::BestMetrics { metric, print, from_logs, .. } => {
                assert_eq!(metric.as_deref(), Some("predict_macro_f1"));
                assert!(print);
                assert!(!from_logs);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
