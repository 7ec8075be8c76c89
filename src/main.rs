//! Expsum - hyperparameter-search experiment aggregator
//!
//! A CLI tool that scrapes per-trial logs and per-experiment result
//! tables produced by an NNI-style experiment runner, reduces each
//! experiment to its best trial, and writes summary CSVs.
//!
//! Exit codes:
//!   0 - Success (file-level errors are logged and skipped, not fatal)
//!   1 - Runtime error (bad arguments, cannot write output)

mod analysis;
mod cli;
mod config;
mod configgen;
mod error;
mod models;
mod parser;
mod report;
mod scanner;
mod table;

use anyhow::{Context, Result};
use cli::{Args, Command};
use config::Config;
use models::{MetricSet, Task};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // Initialize logging
    init_logging(&args);

    info!("Expsum v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the selected aggregation tool
    if let Err(e) = run(args) {
        error!("Run failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle init-config: generate a default .expsum.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".expsum.toml");

    if path.exists() {
        anyhow::bail!(".expsum.toml already exists. Remove it first or edit it manually.");
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .expsum.toml")?;

    println!("Created .expsum.toml with default settings.");
    println!("Edit it to customize the metric, NNI directory, and grid values.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch the selected subcommand.
fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    match args.command {
        Command::ParseResults { base_dir, nni_dir } => {
            let task = Task::detect(&base_dir);
            let set = MetricSet::for_task(task);
            let nni_dir = config.resolve_nni_dir(nni_dir.as_ref());
            info!("Task: {}, trial store: {}", task, nni_dir.display());

            let written = analysis::parse_results(&base_dir, &nni_dir, &set)?;
            info!("Wrote {} results tables", written);
        }

        Command::BestHparams {
            base_dir,
            metric,
            print,
        } => {
            let rows = analysis::best_hparams_rows(&base_dir, &metric);
            if print {
                report::print_report(&rows, "experiments");
            } else {
                report::write_csv(&base_dir.join("csv").join("best_hyperparams.csv"), &rows)?;
            }
        }

        Command::BestMetrics {
            base_dir,
            metric,
            from_logs,
            print,
        } => {
            let metric = metric.unwrap_or_else(|| config.metrics.default_metric.clone());
            let set = MetricSet::for_task(Task::detect(&base_dir));

            let rows = if from_logs {
                analysis::best_metrics_rows_from_logs(
                    &base_dir,
                    &metric,
                    &set,
                    config.metrics.require_complete,
                )
            } else {
                analysis::best_metrics_rows(&base_dir, &metric, &set)
            };

            if print {
                report::print_report(&rows, "experiments");
            } else {
                report::write_csv(&base_dir.join("csv").join("best_metrics.csv"), &rows)?;
            }
        }

        Command::EntityMetrics {
            base_dir,
            metric,
            print,
        } => {
            let set = MetricSet::for_task(Task::detect(&base_dir));
            let datasets = analysis::entity_metrics_by_dataset(&base_dir, &metric, &set);

            for (dataset, rows) in &datasets {
                if print {
                    println!("\nDataset: {}", dataset);
                    report::print_rows(rows);
                } else {
                    let file_name = format!("best_{}_metrics.csv", dataset);
                    report::write_csv(&base_dir.join("csv").join(file_name), rows)?;
                }
            }
            if print {
                println!("Total datasets: {}", datasets.len());
            }
        }

        Command::Runtimes {
            base_dir,
            metric,
            nni_dir,
            print,
        } => {
            let metric = metric.unwrap_or_else(|| config.metrics.default_metric.clone());
            let nni_dir = config.resolve_nni_dir(nni_dir.as_ref());

            let rows = analysis::runtime_rows(&base_dir, &nni_dir, &metric);
            if print {
                report::print_report(&rows, "experiments");
            } else {
                report::write_csv(&base_dir.join("csv").join("best_runtimes.csv"), &rows)?;
            }
        }

        Command::GenConfigs { base_dir } => {
            if config.grid.models.is_empty() || config.grid.datasets.is_empty() {
                warn!("No models or datasets configured; nothing to generate");
            }
            configgen::generate(&base_dir, &config.grid)?;
        }

        // Handled before logging init
        Command::InitConfig => unreachable!(),
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .expsum.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
