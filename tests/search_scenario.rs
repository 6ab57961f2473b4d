use std::collections::HashSet;

use featselect::domain::{HighscoreFile, PowerMatrix, SearchConfig};
use featselect::io::{load_highscore, parse_dataset, write_highscore_json};
use featselect::math::Criterion;
use featselect::search::{ProgressTracker, brute_force_select, select_model};
use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

const SCENARIO_CSV: &str = "\
c0,c1,c2,c3,c4,y
1,0,0,0,0,1
1,1,1,1,1,2
1,2,4,8,16,5
1,3,9,15,40,7
1,4,9,30,6,10
1,2,3,6,12,8
1,-2,5,4,3,15
";

fn config() -> SearchConfig {
    SearchConfig {
        scoring_workers: 4,
        child_workers: 2,
        ..SearchConfig::default()
    }
}

#[test]
fn scenario_from_csv_matches_brute_force() {
    let data = parse_dataset(SCENARIO_CSV.as_bytes(), -1).unwrap();
    assert_eq!((data.rows(), data.num_features()), (7, 5));

    let brute = brute_force_select(&data.x, &data.y, Criterion::Aicc).unwrap();
    assert_eq!(brute.num_explored, 31);

    let progress = ProgressTracker::new();
    let outcome = select_model(&data.x, &data.y, &config(), &progress, None).unwrap();
    assert_eq!(outcome.highscore.best_score(), brute.highscore.best_score());
    assert_eq!(progress.get().best_score, outcome.highscore.best_score());
    assert!(progress.get().num_explored <= 32);
}

#[test]
fn highscore_has_no_duplicate_coefficients() {
    let data = parse_dataset(SCENARIO_CSV.as_bytes(), -1).unwrap();
    let config = SearchConfig {
        highscore_capacity: 20,
        cutoff: 1e6,
        ..config()
    };
    let outcome = select_model(&data.x, &data.y, &config, &ProgressTracker::new(), None).unwrap();
    let coeffs: HashSet<Vec<u64>> = outcome
        .highscore
        .iter()
        .map(|n| n.coeff.iter().map(|c| c.to_bits()).collect())
        .collect();
    assert_eq!(coeffs.len(), outcome.highscore.len());
}

#[test]
fn saved_search_reloads_identically() {
    let data = parse_dataset(SCENARIO_CSV.as_bytes(), -1).unwrap();
    let outcome = select_model(&data.x, &data.y, &config(), &ProgressTracker::new(), None).unwrap();

    let path = std::env::temp_dir().join(format!("featselect-it-{}.json", std::process::id()));
    write_highscore_json(&path, &outcome.highscore).unwrap();
    let raw: HighscoreFile = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw.max_items, 10);
    let back = load_highscore(&path).unwrap();
    assert_eq!(back.to_file(), outcome.highscore.to_file());
    std::fs::remove_file(path).unwrap();
}

#[test]
fn noisy_polynomial_search_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(2024);
    let noise = Normal::new(0.0, 0.05).unwrap();
    let n = 30;
    let base = DMatrix::from_fn(n, 3, |i, j| ((i + 1) as f64 * (0.37 + 0.21 * j as f64)).sin());
    let y: Vec<f64> = (0..n)
        .map(|i| 1.2 * base[(i, 0)] - 0.8 * base[(i, 1)] * base[(i, 2)] + noise.sample(&mut rng))
        .collect();

    // 3 base columns + 6 degree-2 products.
    let design = PowerMatrix::new(base, 2);
    let brute = brute_force_select(&design, &y, Criterion::Aicc).unwrap();
    let outcome = select_model(&design, &y, &config(), &ProgressTracker::new(), None).unwrap();
    assert!((outcome.highscore.best_score() - brute.highscore.best_score()).abs() < 1e-10);
    assert_eq!(
        outcome.highscore.best().unwrap().model,
        brute.highscore.best().unwrap().model
    );
}
