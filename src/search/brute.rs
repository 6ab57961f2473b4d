//! Exhaustive reference search.
//!
//! Fits every non-empty subset the branch-and-bound search could score. Only
//! usable for small feature counts, but it is the ground truth the pruned search
//! is checked against.

use nalgebra::DVector;
use rayon::prelude::*;
use tracing::info;

use crate::domain::DesignMatrix;
use crate::error::AppError;
use crate::math::Criterion;
use crate::models::{Model, Node};
use crate::search::fitter::score_subset;
use crate::search::highscore::Highscore;

/// Largest feature count brute force accepts (`2^24` fits).
pub const MAX_BRUTE_FEATURES: usize = 24;

#[derive(Debug, Clone)]
pub struct BruteOutcome {
    /// Every scored model, best first.
    pub highscore: Highscore,
    pub num_explored: u64,
}

/// Score every model with `0 < k < n` in parallel.
pub fn brute_force_select<X: DesignMatrix + ?Sized>(
    x: &X,
    y: &[f64],
    criterion: Criterion,
) -> Result<BruteOutcome, AppError> {
    let (rows, m) = x.dims();
    if m == 0 {
        return Err(AppError::config("Brute force needs at least one feature."));
    }
    if m > MAX_BRUTE_FEATURES {
        return Err(AppError::config(format!(
            "Brute force is limited to {MAX_BRUTE_FEATURES} features, got {m}."
        )));
    }
    if y.len() != rows {
        return Err(AppError::config(format!(
            "Target has {} values but the design matrix has {rows} rows.",
            y.len()
        )));
    }

    let y = DVector::from_column_slice(y);
    let total: u64 = 1 << m;
    info!(num_features = m, models = total - 1, "starting brute force");

    // Visit masks in order so ties land in the list deterministically.
    let nodes: Vec<Node> = (1..total)
        .into_par_iter()
        .filter_map(|mask| {
            let bits: Vec<bool> = (0..m).map(|i| mask & (1 << i) != 0).collect();
            let model = Model::from_bools(&bits);
            if model.num_features() >= rows {
                return None;
            }
            let (coeff, score) = score_subset(x, &y, &model, criterion)?;
            let mut node = Node::root(model);
            node.coeff = coeff;
            node.score = score;
            node.level = m;
            Some(node)
        })
        .collect();

    let num_explored = nodes.len() as u64;
    let mut highscore = Highscore::new(total as usize);
    for node in nodes {
        highscore.insert(node);
    }
    info!(num_explored, best_score = highscore.best_score(), "brute force finished");

    Ok(BruteOutcome {
        highscore,
        num_explored,
    })
}
