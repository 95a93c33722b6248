use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use netsift_forest::{MaxFeatures, RandomForestConfig, SplitCriterion};
use netsift_io::{DatasetId, DatasetRef, JsonResultStore};
use netsift_pipeline::{DEFAULT_N_TREES, Pipeline, PipelineConfig};
use netsift_prep::UnknownCategoryPolicy;

#[derive(Parser)]
#[command(name = "netsift")]
#[command(about = "Random forest separation of normal and attack network traffic")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Train and evaluate on one KDD-formatted file and store the result
    Process {
        /// Path to the headerless KDD Cup 99 CSV file
        #[arg(long)]
        data: PathBuf,

        /// Dataset id for the stored record (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        dataset_id: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// RNG seed for the split and the forest
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value_t = 0.3)]
        test_ratio: f64,

        /// Number of trees in the forest
        #[arg(long, default_value_t = DEFAULT_N_TREES)]
        n_trees: usize,

        /// Maximum tree depth (unlimited if omitted)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Minimum samples required to split a node
        #[arg(long, default_value_t = 2)]
        min_samples_split: usize,

        /// Minimum samples required in each leaf
        #[arg(long, default_value_t = 1)]
        min_samples_leaf: usize,

        /// Features considered per split: "sqrt", "log2", "all", or a count
        #[arg(long, default_value = "sqrt")]
        max_features: MaxFeatures,

        /// Split criterion: "gini" or "entropy"
        #[arg(long, default_value = "gini")]
        criterion: String,

        /// Handling of categorical values outside the fixed vocabularies:
        /// "missing", "reject", or "other"
        #[arg(long, default_value = "missing")]
        unknown_category: UnknownCategoryPolicy,
    },

    /// Print a stored result record
    Show {
        /// Dataset id of the record
        #[arg(long)]
        dataset_id: String,

        /// Directory the record was written to
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

#[derive(Serialize)]
struct ProcessOutput {
    dataset_id: String,
    accuracy: f64,
    n_rows: usize,
    n_train: usize,
    n_test: usize,
    n_trees: usize,
    top_features: Vec<String>,
    result_path: PathBuf,
}

fn parse_criterion(s: &str) -> Result<SplitCriterion> {
    match s {
        "gini" => Ok(SplitCriterion::Gini),
        "entropy" => Ok(SplitCriterion::Entropy),
        other => anyhow::bail!("unknown criterion: {other} (expected gini or entropy)"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Process {
            data,
            dataset_id,
            output_dir,
            seed,
            test_ratio,
            n_trees,
            max_depth,
            min_samples_split,
            min_samples_leaf,
            max_features,
            criterion,
            unknown_category,
        } => {
            let id = DatasetId::new(dataset_id)?;

            let forest = RandomForestConfig::new(n_trees)?
                .with_max_depth(max_depth)
                .with_min_samples_split(min_samples_split)
                .with_min_samples_leaf(min_samples_leaf)
                .with_max_features(max_features)
                .with_criterion(parse_criterion(&criterion)?);
            let config = PipelineConfig::new()
                .with_seed(seed)
                .with_test_ratio(test_ratio)
                .with_forest(forest)
                .with_unknown_category(unknown_category);

            let store = JsonResultStore::new(&output_dir)?;
            let result_path = store.path_for(&id);
            let pipeline = Pipeline::new(config, store);

            let dataset = DatasetRef::new(id, data);
            let record = pipeline.process(&dataset).map_err(|e| {
                let stage = e.stage();
                anyhow::Error::new(e).context(format!(
                    "processing {} stopped at the {stage} stage",
                    dataset.id()
                ))
            })?;

            let output = ProcessOutput {
                dataset_id: record.dataset_id,
                accuracy: record.accuracy,
                n_rows: record.parameters.n_rows,
                n_train: record.parameters.n_train,
                n_test: record.parameters.n_test,
                n_trees: record.parameters.n_trees,
                top_features: record
                    .evaluation
                    .feature_importances
                    .iter()
                    .take(5)
                    .map(|f| f.name.clone())
                    .collect(),
                result_path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Show {
            dataset_id,
            output_dir,
        } => {
            let id = DatasetId::new(dataset_id)?;
            let store = JsonResultStore::new(&output_dir)?;
            let record = store
                .load(&id)
                .with_context(|| format!("no readable result for {id}"))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}
