use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "AFI Design Contributors",
    version,
    about = "afidesign - Antifungal peptide design guided by the Antifungal Index (AFI): segmentation, single-point mutation scanning and seeded global optimisation.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full design pipeline (segmentation, mutation scan, global search) on one peptide.
    Design(DesignArgs),
    /// Compute the AFI of a list of sequences with the configured predictor.
    Score(ScoreArgs),
}

/// Arguments for the `design` subcommand.
#[derive(Args, Debug)]
pub struct DesignArgs {
    // --- Core Arguments ---
    /// Initial peptide sequence in one-letter code (e.g., RRYCRTYWRYGRLRRRCYRRR).
    #[arg(short, long, required = true, value_name = "SEQUENCE")]
    pub sequence: String,

    /// Directory that receives the score tables and the run summary.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    // --- Segmentation Overrides ---
    /// Override the minimum segment length.
    #[arg(long, value_name = "INT")]
    pub min_segment_length: Option<usize>,

    /// Override the maximum segment length.
    #[arg(long, value_name = "INT")]
    pub max_segment_length: Option<usize>,

    // --- Global Search Overrides ---
    /// Override the evaluation budget of the global search.
    #[arg(short = 'b', long = "budget", value_name = "INT")]
    pub evaluation_budget: Option<usize>,

    /// Override the number of positions changed per move.
    #[arg(short = 'k', long, value_name = "INT")]
    pub positions_per_move: Option<usize>,

    /// Override the random seed of the global search.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Keep a position unchanged during global search (1-based). Can be used multiple times.
    #[arg(long = "freeze", value_name = "POS")]
    pub frozen_positions: Vec<usize>,

    // --- Execution Overrides ---
    /// Override the maximum number of concurrent predictor calls.
    #[arg(long, value_name = "INT")]
    pub max_workers: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S global-search.evaluation-budget=500
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `score` subcommand.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Sequences to score in one-letter code.
    #[arg(value_name = "SEQUENCE")]
    pub sequences: Vec<String>,

    /// Read additional sequences from a file, one per line ('#' starts a comment).
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Write the score table to a CSV file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override the maximum number of concurrent predictor calls.
    #[arg(long, value_name = "INT")]
    pub max_workers: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S predictor.cache=false
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
