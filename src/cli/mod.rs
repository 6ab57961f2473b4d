//! Command-line parsing for the `fsel` feature-selection driver.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the search code. Numeric options can also be set through
//! `FSEL_*` environment variables (or a `.env` file).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::math::Criterion;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "fsel",
    version,
    about = "Exact AICc feature selection by branch and bound"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the branch-and-bound search and write the highscore list to JSON.
    Bnb(BnbArgs),
    /// Score every subset (small feature counts only).
    Brute(BruteArgs),
    /// Print a saved highscore list.
    Show(ShowArgs),
}

/// Dataset options shared by the search commands.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// CSV file with one header row.
    #[arg(long, value_name = "CSV", env = "FSEL_CSV")]
    pub csv: PathBuf,

    /// Target column; negative values count from the last column.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true, env = "FSEL_TARGET")]
    pub target: isize,

    /// Add products of columns up to this total degree.
    #[arg(long, env = "FSEL_MAX_POWER")]
    pub max_power: Option<u32>,

    /// Information criterion to minimise.
    #[arg(long, value_enum, default_value_t = Criterion::Aicc, env = "FSEL_CRITERION")]
    pub criterion: Criterion,
}

#[derive(Debug, Args, Clone)]
pub struct BnbArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Output JSON for the highscore list (also used for checkpoints).
    #[arg(long, default_value = "bnbSearch.json", env = "FSEL_OUT")]
    pub out: PathBuf,

    /// Slack added to the incumbent before pruning (larger prunes less).
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true, env = "FSEL_CUTOFF")]
    pub cutoff: f64,

    /// Backlog length at which parents are expanded depth-first.
    #[arg(long, default_value_t = 10_000_000, env = "FSEL_MAX_QUEUE")]
    pub max_queue: usize,

    /// Number of models kept in the highscore list.
    #[arg(long, default_value_t = 10, env = "FSEL_CAPACITY")]
    pub capacity: usize,

    /// Simulated-annealing sweeps for the warm start.
    #[arg(long, default_value_t = 100, env = "FSEL_SWEEPS")]
    pub sweeps: usize,

    /// Start from the empty model instead of an annealed one.
    #[arg(long)]
    pub no_warm_start: bool,

    /// Seed for the warm start.
    #[arg(long, default_value_t = 42, env = "FSEL_SEED")]
    pub seed: u64,

    /// Seconds between progress reports and checkpoints (0 disables both).
    #[arg(long, default_value_t = 60, env = "FSEL_REPORT_SECS")]
    pub report_secs: u64,

    /// Scoring worker threads (default: available parallelism).
    #[arg(long, env = "FSEL_SCORING_WORKERS")]
    pub scoring_workers: Option<usize>,

    /// Child-generation worker threads (default: half the scoring workers).
    #[arg(long, env = "FSEL_CHILD_WORKERS")]
    pub child_workers: Option<usize>,

    /// Rows shown in the final table.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Debug, Args, Clone)]
pub struct BruteArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Output JSON for the scored models.
    #[arg(long, default_value = "brute.json", env = "FSEL_OUT")]
    pub out: PathBuf,

    /// Rows shown in the final table.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Highscore JSON written by `fsel bnb` or `fsel brute`.
    #[arg(long, value_name = "JSON")]
    pub json: PathBuf,

    /// Dataset used for the search, to print feature names.
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,

    /// Target column of `--csv`.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub target: isize,

    /// Power expansion used for the search, to label product columns.
    #[arg(long)]
    pub max_power: Option<u32>,

    /// Rows shown.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}
