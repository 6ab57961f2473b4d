//! Shared search pipeline used by the CLI commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> optional power expansion -> optional warm start -> search -> JSON
//!
//! `app` can then focus on presentation.

use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use chrono::Local;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::domain::{BnbRunConfig, DataSource, DesignMatrix, PowerMatrix};
use crate::error::AppError;
use crate::io::{Dataset, JsonCheckpoint, load_dataset, write_highscore_json};
use crate::math::Criterion;
use crate::report::format_progress_line;
use crate::search::{
    AnnealResult, BruteOutcome, ProgressTracker, SearchOutcome, anneal, brute_force_select, select_model,
};

/// A dataset together with the design matrix searched over.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub dataset: Dataset,
    pub design: PowerMatrix,
    /// One label per design column.
    pub labels: Vec<String>,
}

/// Outputs of a `fsel bnb` run.
#[derive(Debug, Clone)]
pub struct BnbRun {
    pub data: LoadedData,
    pub warm_start: Option<AnnealResult>,
    pub outcome: SearchOutcome,
}

pub fn load_data(source: &DataSource) -> Result<LoadedData, AppError> {
    let dataset = load_dataset(&source.csv_path, source.target)?;
    let design = PowerMatrix::new(dataset.x.clone(), source.max_power.unwrap_or(1));
    let names = dataset.feature_names();
    let labels = (0..design.ncols())
        .map(|c| design.column_label(c, &names))
        .collect();
    info!(
        path = %source.csv_path.display(),
        rows = dataset.rows(),
        base_features = dataset.num_features(),
        features = design.ncols(),
        target = dataset.target_name(),
        skipped_rows = dataset.row_errors.len(),
        "loaded dataset"
    );
    Ok(LoadedData {
        dataset,
        design,
        labels,
    })
}

/// Execute the full branch-and-bound pipeline and return the computed outputs.
///
/// The highscore list is checkpointed to `config.out_path` every report period
/// and written there once more when the search completes.
pub fn run_bnb(config: &BnbRunConfig) -> Result<BnbRun, AppError> {
    let data = load_data(&config.data)?;
    let mut search = config.search.clone();
    search.checkpoint_interval = config.report_every;

    let warm_start = match config.warm_start {
        Some(ws) if search.root_model.is_none() => {
            let mut rng = StdRng::seed_from_u64(ws.seed);
            let result = anneal(&data.design, &data.dataset.y, ws.sweeps, search.criterion, &mut rng)?;
            info!(
                score = result.score,
                num_features = result.selected.len(),
                "warm start finished"
            );
            search.root_model = result.to_model(data.design.ncols());
            Some(result)
        }
        _ => None,
    };

    let progress = ProgressTracker::new();
    let mut checkpoint = JsonCheckpoint::new(&config.out_path);
    let outcome = run_with_reporter(config.report_every, &progress, || {
        select_model(
            &data.design,
            &data.dataset.y,
            &search,
            &progress,
            Some(&mut checkpoint),
        )
    })?;
    info!(path = %config.out_path.display(), "highscore list written");

    Ok(BnbRun {
        data,
        warm_start,
        outcome,
    })
}

/// Run `job` while a reporter thread logs `progress` every `every`.
fn run_with_reporter<T>(
    every: Option<Duration>,
    progress: &ProgressTracker,
    job: impl FnOnce() -> Result<T, AppError>,
) -> Result<T, AppError> {
    let Some(every) = every else {
        return job();
    };

    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    thread::scope(|s| {
        s.spawn(move || {
            loop {
                match stop_rx.recv_timeout(every) {
                    Err(RecvTimeoutError::Timeout) => {
                        let line = format_progress_line(&Local::now(), &progress.get());
                        info!(target: "progress", "{line}");
                    }
                    _ => break,
                }
            }
        });
        let result = job();
        drop(stop_tx);
        result
    })
}

/// Score every subset and write the list to `out_path`.
pub fn run_brute(
    source: &DataSource,
    criterion: Criterion,
    out_path: &Path,
) -> Result<(LoadedData, BruteOutcome), AppError> {
    let data = load_data(source)?;
    let outcome = brute_force_select(&data.design, &data.dataset.y, criterion)?;
    write_highscore_json(out_path, &outcome.highscore)?;
    info!(path = %out_path.display(), models = outcome.num_explored, "brute-force list written");
    Ok((data, outcome))
}

/// Labels for a saved list: from the dataset if given, else `x0, x1, ...`.
pub fn labels_for(source: Option<&DataSource>, num_features: usize) -> Result<Vec<String>, AppError> {
    let Some(source) = source else {
        return Ok((0..num_features).map(|i| format!("x{i}")).collect());
    };
    let data = load_data(source)?;
    if data.labels.len() != num_features {
        warn!(
            dataset_features = data.labels.len(),
            saved_features = num_features,
            "dataset does not match the saved list; labels may be wrong"
        );
    }
    Ok(data.labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SearchConfig, WarmStart};
    use crate::io::load_highscore;
    use std::path::PathBuf;

    fn write_csv(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("featselect-pipeline-{}-{name}", std::process::id()));
        let mut body = String::from("x1,x2,x3,x4,y\n");
        for i in 0..12 {
            let t = i as f64;
            let x1 = t;
            let x2 = (t * 0.7).sin();
            let x3 = (t * 1.3).cos();
            let x4 = t * t / 10.0;
            let y = 0.5 + 2.0 * x1 - 1.5 * x3 + 0.01 * (t * 3.1).sin();
            body.push_str(&format!("{x1},{x2},{x3},{x4},{y}\n"));
        }
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn bnb_writes_the_best_model_found_by_brute_force() {
        let csv = write_csv("bnb.csv");
        let out = csv.with_extension("json");
        let source = DataSource {
            csv_path: csv.clone(),
            target: -1,
            max_power: None,
        };
        let config = BnbRunConfig {
            data: source.clone(),
            search: SearchConfig {
                scoring_workers: 2,
                child_workers: 1,
                ..SearchConfig::default()
            },
            warm_start: Some(WarmStart { sweeps: 5, seed: 1 }),
            out_path: out.clone(),
            report_every: None,
        };
        let run = run_bnb(&config).unwrap();
        assert!(run.warm_start.is_some());
        assert_eq!(run.data.labels, vec!["x1", "x2", "x3", "x4"]);

        let brute_out = csv.with_extension("brute.json");
        let (_, brute) = run_brute(&source, Criterion::Aicc, &brute_out).unwrap();
        assert!(
            (run.outcome.highscore.best_score() - brute.highscore.best_score()).abs() < 1e-10
        );

        let saved = load_highscore(&out).unwrap();
        assert_eq!(saved.to_file(), run.outcome.highscore.to_file());

        for path in [csv, out, brute_out] {
            std::fs::remove_file(path).unwrap();
        }
    }

    #[test]
    fn power_expansion_labels_products() {
        let csv = write_csv("power.csv");
        let data = load_data(&DataSource {
            csv_path: csv.clone(),
            target: -1,
            max_power: Some(2),
        })
        .unwrap();
        // 4 base columns + 10 degree-2 products.
        assert_eq!(data.labels.len(), 14);
        assert!(data.labels.contains(&"x1^2".to_string()));
        assert!(data.labels.contains(&"x1*x2".to_string()));
        std::fs::remove_file(csv).unwrap();
    }

    #[test]
    fn reporter_stops_with_the_job() {
        let progress = ProgressTracker::new();
        let value = run_with_reporter(Some(Duration::from_millis(5)), &progress, || {
            std::thread::sleep(Duration::from_millis(20));
            Ok(7)
        })
        .unwrap();
        assert_eq!(value, 7);
    }
}
