//! Exact criterion bounds over all completions of a tree prefix.
//!
//! A node at level `L` has bits `[0, L)` decided. Every model in its subtree is
//! a *completion*: the decided prefix plus some choice of the remaining bits.
//! Among the completions,
//!
//! - the GCS completion (all remaining bits on) has the most features and, by
//!   the least-squares projection property, the smallest RSS;
//! - the LCS completion (all remaining bits off) has the fewest features and
//!   the largest RSS.
//!
//! Since the criteria are increasing in both RSS and feature count,
//!
//! ```text
//! lower = crit(k_LCS, n, RSS_GCS) <= crit(k, n, RSS) <= crit(k_GCS, n, RSS_LCS) = upper
//! ```
//!
//! for every completion. The bracket is exact, so pruning on it never discards
//! the optimum.

use nalgebra::DVector;

use crate::domain::DesignMatrix;
use crate::math::Criterion;
use crate::models::{Model, BOUND_SENTINEL};
use crate::search::fitter::fit_subset;

/// The bracket used when a subtree cannot be bounded (never prunes).
pub const UNBOUNDED: (f64, f64) = (-BOUND_SENTINEL, BOUND_SENTINEL);

/// `(lower, upper)` criterion bounds over every completion of `model[..start]`.
///
/// If the GCS completion has at least as many features as there are rows no
/// finite bracket exists and [`UNBOUNDED`] is returned.
pub fn bounds<X: DesignMatrix + ?Sized>(
    model: &Model,
    start: usize,
    x: &X,
    y: &DVector<f64>,
    criterion: Criterion,
) -> (f64, f64) {
    let n = y.len();
    let gcs = model.gcs(start);
    let lcs = model.lcs(start);
    let k_gcs = gcs.num_features();
    let k_lcs = lcs.num_features();

    if k_gcs >= n {
        return UNBOUNDED;
    }

    let (Some(gcs_fit), Some(lcs_fit)) = (fit_subset(x, y, &gcs), fit_subset(x, y, &lcs)) else {
        return UNBOUNDED;
    };

    let lower = criterion.eval(k_lcs, n, gcs_fit.rss);
    let upper = criterion.eval(k_gcs, n, lcs_fit.rss);
    (lower, upper)
}
