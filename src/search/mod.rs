//! Subset search.
//!
//! Responsibilities:
//!
//! - fit and score single subsets (`fitter`)
//! - bracket the criterion over a subtree (`bounds`)
//! - run the concurrent branch-and-bound search (`scheduler`, `workers`)
//! - keep the best models and live telemetry (`highscore`, `progress`)
//! - exhaustive and annealing alternatives (`brute`, `anneal`)

pub mod anneal;
pub mod backlog;
pub mod bounds;
pub mod brute;
pub mod fitter;
pub mod highscore;
pub mod progress;
pub mod scheduler;
pub mod workers;

pub use anneal::{AnnealResult, anneal};
pub use bounds::bounds;
pub use brute::{BruteOutcome, brute_force_select};
pub use fitter::{SubsetFit, fit_subset, score_subset};
pub use highscore::Highscore;
pub use progress::{ProgressTracker, PruneThreshold, log2_pruned_update};
pub use scheduler::{Checkpoint, SearchOutcome, SearchStats, select_model};
