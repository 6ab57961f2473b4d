//! State shared between the orchestrator and other threads.
//!
//! - [`ProgressTracker`]: telemetry written by the orchestrator and read by
//!   reporters. All three fields change together under one write lock.
//! - [`PruneThreshold`]: the incumbent criterion value read by child workers
//!   when deciding whether to prune.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::domain::ProgressSnapshot;

/// Cloneable handle to the search progress.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<RwLock<ProgressSnapshot>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, best_score: f64, num_explored: u64, log2_num_pruned: f64) {
        // A poisoned lock still holds a complete snapshot: each write replaces
        // the whole value.
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = ProgressSnapshot {
            best_score,
            num_explored,
            log2_num_pruned,
        };
    }

    pub fn get(&self) -> ProgressSnapshot {
        *self.inner.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// `log2(2^current + 2^k)` without leaving log space.
///
/// `current = -inf` stands for "nothing pruned yet", so the first fold yields `k`.
pub fn log2_pruned_update(current: f64, k: f64) -> f64 {
    let (hi, lo) = if current >= k { (current, k) } else { (k, current) };
    if hi == f64::NEG_INFINITY {
        return hi;
    }
    hi + (1.0 + (lo - hi).exp2()).log2()
}

/// Incumbent criterion value used for pruning.
///
/// Holds `-best_score` once the highscore list has an entry and `+inf` before,
/// stored as raw `f64` bits. The orchestrator only ever lowers it, so a worker
/// reading a stale value prunes less, never more.
#[derive(Debug)]
pub struct PruneThreshold {
    bits: AtomicU64,
}

impl PruneThreshold {
    pub fn new() -> Self {
        Self {
            bits: AtomicU64::new(f64::INFINITY.to_bits()),
        }
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Lower the threshold to `value` if that tightens it.
    pub fn tighten(&self, value: f64) {
        if value < self.get() {
            self.bits.store(value.to_bits(), Ordering::Release);
        }
    }

    /// True if a subtree whose criterion is at least `lower` cannot beat the
    /// incumbent by more than `cutoff`.
    pub fn prunes(&self, lower: f64, cutoff: f64) -> bool {
        lower > self.get() + cutoff
    }
}

impl Default for PruneThreshold {
    fn default() -> Self {
        Self::new()
    }
}
