//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs the log subscriber
//! - parses CLI arguments
//! - runs the selected search through `pipeline`
//! - prints reports

use std::time::Duration;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::{BnbArgs, BruteArgs, Command, DataArgs, ShowArgs};
use crate::domain::{BnbRunConfig, DataSource, DesignMatrix, SearchConfig, WarmStart};
use crate::error::AppError;
use crate::report::{format_anneal, format_highscore, format_search_summary};

pub mod pipeline;

/// Entry point for the `fsel` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env file is not an error.
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Bnb(args) => handle_bnb(args),
        Command::Brute(args) => handle_brute(args),
        Command::Show(args) => handle_show(args),
    }
}

/// Log to stderr; `RUST_LOG` refines the INFO default.
fn init_tracing() {
    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into());
    // Already installed (e.g. when called twice from tests): keep the first.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_bnb(args: BnbArgs) -> Result<(), AppError> {
    let config = bnb_config_from_args(&args);
    let run = pipeline::run_bnb(&config)?;

    if let Some(ws) = &run.warm_start {
        println!("{}", format_anneal(ws, &run.data.labels));
    }
    println!(
        "{}",
        format_search_summary(
            run.data.design.nrows(),
            run.data.design.ncols(),
            &run.outcome.progress,
            &run.outcome.stats,
        )
    );
    println!("{}", format_highscore(&run.outcome.highscore, &run.data.labels, args.top));
    Ok(())
}

fn handle_brute(args: BruteArgs) -> Result<(), AppError> {
    let source = data_source_from_args(&args.data);
    let (data, outcome) = pipeline::run_brute(&source, args.data.criterion, &args.out)?;
    println!(
        "=== featselect - brute force ===\nModels scored: {}\n",
        outcome.num_explored
    );
    println!("{}", format_highscore(&outcome.highscore, &data.labels, args.top));
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let file = crate::io::read_highscore_json(&args.json)?;
    let highscore = crate::search::Highscore::from_file(&file)?;
    let num_features = file.items.first().map(|e| e.tot_num_features).unwrap_or(0);
    let source = args.csv.as_ref().map(|csv| DataSource {
        csv_path: csv.clone(),
        target: args.target,
        max_power: args.max_power,
    });
    let labels = pipeline::labels_for(source.as_ref(), num_features)?;
    println!("{}", format_highscore(&highscore, &labels, args.top));
    Ok(())
}

pub fn data_source_from_args(args: &DataArgs) -> DataSource {
    DataSource {
        csv_path: args.csv.clone(),
        target: args.target,
        max_power: args.max_power,
    }
}

pub fn search_config_from_args(args: &BnbArgs) -> SearchConfig {
    let defaults = SearchConfig::default();
    let scoring_workers = args.scoring_workers.unwrap_or(defaults.scoring_workers);
    SearchConfig {
        cutoff: args.cutoff,
        max_queue_size: args.max_queue,
        root_model: None,
        highscore_capacity: args.capacity,
        scoring_workers,
        child_workers: args
            .child_workers
            .unwrap_or_else(|| (scoring_workers / 2).max(1)),
        criterion: args.data.criterion,
        checkpoint_interval: None,
    }
}

pub fn bnb_config_from_args(args: &BnbArgs) -> BnbRunConfig {
    BnbRunConfig {
        data: data_source_from_args(&args.data),
        search: search_config_from_args(args),
        warm_start: (!args.no_warm_start).then_some(WarmStart {
            sweeps: args.sweeps,
            seed: args.seed,
        }),
        out_path: args.out.clone(),
        report_every: (args.report_secs > 0).then(|| Duration::from_secs(args.report_secs)),
    }
}
