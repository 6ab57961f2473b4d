//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed into the search as configuration
//! - exported to JSON while a search runs (checkpoints) and once it finishes
//! - reloaded later for reporting or to resume comparisons

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::Criterion;
use crate::models::{Model, Node, NodeKind};

/// Fewest candidate features a search accepts.
pub const MIN_FEATURES: usize = 3;

/// Default backlog size at which the backlog switches to depth-first pops.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 10_000_000;

/// Branch-and-bound search configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Slack added to the incumbent before a subtree is pruned.
    ///
    /// A subtree is pruned when `lower > -best_score + cutoff`; `0.0` prunes
    /// exactly, positive values prune less.
    pub cutoff: f64,
    /// Backlog length at which parents are popped depth-first instead of FIFO.
    pub max_queue_size: usize,
    /// Initial feature mask for the root node (e.g. from a warm start).
    pub root_model: Option<Model>,
    /// Number of entries retained in the highscore list.
    pub highscore_capacity: usize,
    pub scoring_workers: usize,
    pub child_workers: usize,
    pub criterion: Criterion,
    /// How often the orchestrator hands the highscore list to a checkpoint sink.
    pub checkpoint_interval: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2);
        Self {
            cutoff: 0.0,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            root_model: None,
            highscore_capacity: 10,
            scoring_workers: workers.max(1),
            child_workers: (workers / 2).max(1),
            criterion: Criterion::Aicc,
            checkpoint_interval: None,
        }
    }
}

impl SearchConfig {
    /// Reject configurations the search cannot run with.
    ///
    /// Called before any worker starts; nothing inside the search loop reports
    /// configuration problems.
    pub fn validate(&self, rows: usize, num_features: usize, y_len: usize) -> Result<(), AppError> {
        if num_features < MIN_FEATURES {
            return Err(AppError::config(format!(
                "Branch and bound needs at least {MIN_FEATURES} candidate features, got {num_features}."
            )));
        }
        if y_len != rows {
            return Err(AppError::config(format!(
                "Target has {y_len} values but the design matrix has {rows} rows."
            )));
        }
        if let Some(root) = &self.root_model {
            if root.len() != num_features {
                return Err(AppError::config(format!(
                    "Root model has {} bits but there are {num_features} features.",
                    root.len()
                )));
            }
        }
        if self.highscore_capacity == 0 {
            return Err(AppError::config("Highscore capacity must be > 0."));
        }
        if self.scoring_workers == 0 || self.child_workers == 0 {
            return Err(AppError::config("Worker pool sizes must be > 0."));
        }
        if self.max_queue_size == 0 {
            return Err(AppError::config("Max queue size must be > 0."));
        }
        if !self.cutoff.is_finite() {
            return Err(AppError::config("Cutoff must be finite."));
        }
        Ok(())
    }
}

/// Where a dataset comes from and how it is expanded.
#[derive(Debug, Clone)]
pub struct DataSource {
    pub csv_path: PathBuf,
    /// Target column; negative counts from the last column.
    pub target: isize,
    /// Add column products up to this total degree (`None` or `< 2`: none).
    pub max_power: Option<u32>,
}

/// Simulated-annealing warm-start settings.
#[derive(Debug, Clone, Copy)]
pub struct WarmStart {
    pub sweeps: usize,
    pub seed: u64,
}

/// Everything one `fsel bnb` run needs.
#[derive(Debug, Clone)]
pub struct BnbRunConfig {
    pub data: DataSource,
    pub search: SearchConfig,
    pub warm_start: Option<WarmStart>,
    pub out_path: PathBuf,
    /// Progress report period; `None` disables the reporter.
    pub report_every: Option<Duration>,
}

/// One highscore entry as written to JSON.
///
/// Field names are part of the on-disk format other tooling reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighscoreEntry {
    pub selected: Vec<usize>,
    pub tot_num_features: usize,
    pub lower: f64,
    pub upper: f64,
    pub score: f64,
    pub level: usize,
    pub coeff: Vec<f64>,
}

impl HighscoreEntry {
    pub fn from_node(node: &Node) -> Self {
        Self {
            selected: node.model.selected(),
            tot_num_features: node.model.len(),
            lower: node.lower,
            upper: node.upper,
            score: node.score,
            level: node.level,
            coeff: node.coeff.clone(),
        }
    }

    /// Rebuild the node this entry was taken from.
    pub fn to_node(&self) -> Result<Node, AppError> {
        let model = Model::from_selected(&self.selected, self.tot_num_features).ok_or_else(|| {
            AppError::config(format!(
                "Highscore entry selects a feature outside 0..{}.",
                self.tot_num_features
            ))
        })?;
        if self.level > self.tot_num_features {
            return Err(AppError::config(format!(
                "Highscore entry level {} exceeds feature count {}.",
                self.level, self.tot_num_features
            )));
        }
        Ok(Node {
            model,
            coeff: self.coeff.clone(),
            level: self.level,
            lower: self.lower,
            upper: self.upper,
            score: self.score,
            // Recorded nodes are always new models.
            kind: if self.level == 0 {
                NodeKind::Root
            } else {
                NodeKind::Flipped
            },
        })
    }
}

/// Serialized highscore list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighscoreFile {
    pub max_items: usize,
    pub items: Vec<HighscoreEntry>,
}

/// Consistent view of search telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub best_score: f64,
    pub num_explored: u64,
    /// `log2` of the number of leaf models discarded by pruning; `-inf` while none.
    pub log2_num_pruned: f64,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            best_score: 0.0,
            num_explored: 0,
            log2_num_pruned: f64::NEG_INFINITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_too_few_features() {
        let config = SearchConfig::default();
        let err = config.validate(10, 2, 10).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
    }

    #[test]
    fn validate_rejects_root_length_mismatch() {
        let config = SearchConfig {
            root_model: Some(Model::empty(4)),
            ..SearchConfig::default()
        };
        assert!(config.validate(10, 5, 10).is_err());
        assert!(config.validate(10, 4, 10).is_ok());
    }

    #[test]
    fn validate_rejects_target_length_mismatch() {
        assert!(SearchConfig::default().validate(10, 5, 9).is_err());
    }

    #[test]
    fn entry_serializes_with_camel_case_fields() {
        let entry = HighscoreEntry {
            selected: vec![0, 2],
            tot_num_features: 3,
            lower: -1.5,
            upper: 2.5,
            score: 1.0,
            level: 2,
            coeff: vec![0.5, -0.25],
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"selected":[0,2],"totNumFeatures":3,"lower":-1.5,"upper":2.5,"score":1.0,"level":2,"coeff":[0.5,-0.25]}"#
        );
    }

    #[test]
    fn entry_round_trips_through_node() {
        let mut node = Node::root(Model::from_bools(&[true, false, true])).derive_child(true);
        node.score = -3.0;
        node.coeff = vec![1.0];
        let back = HighscoreEntry::from_node(&node).to_node().unwrap();
        assert_eq!(back.model, node.model);
        assert_eq!(back.level, 1);
        assert!(back.is_new());
    }

    #[test]
    fn entry_with_bad_index_is_rejected() {
        let entry = HighscoreEntry {
            selected: vec![5],
            tot_num_features: 3,
            lower: 0.0,
            upper: 0.0,
            score: 0.0,
            level: 0,
            coeff: vec![],
        };
        assert!(entry.to_node().is_err());
    }
}
