//! Worker loops driven by the search orchestrator.
//!
//! Two pools run for the lifetime of a search:
//!
//! - scoring workers pull nodes from one shared queue, fit new models and
//!   report [`Event::Scored`];
//! - child workers each own an input channel, receive one parent at a time,
//!   derive and bound-check both children, and report [`Event::Ready`] when
//!   they can take the next parent.
//!
//! Every child a child worker derives ends in exactly one terminal event: it is
//! either forwarded to scoring (and later reported as `Scored`), or reported as
//! `Pruned` or `Discarded` directly. The orchestrator's in-flight count depends
//! on this.

use std::sync::Mutex;
use std::sync::mpsc::{Receiver, Sender, SyncSender};

use nalgebra::DVector;
use tracing::trace;

use crate::domain::DesignMatrix;
use crate::math::Criterion;
use crate::models::{Node, UNSCORED};
use crate::search::bounds::{UNBOUNDED, bounds};
use crate::search::fitter::score_subset;
use crate::search::progress::PruneThreshold;

/// Messages from workers to the orchestrator.
#[derive(Debug)]
pub enum Event {
    /// A node finished scoring (possibly with the unscored sentinel).
    Scored(Node),
    /// A child was pruned; `level` is its parent's level.
    Pruned { level: usize },
    /// Every completion of a child had at least as many features as data rows.
    Discarded,
    /// Child worker `id` finished its parent and is waiting for another.
    Ready(usize),
}

/// Read-only inputs shared by every worker.
pub struct WorkerContext<'a, X: ?Sized> {
    pub x: &'a X,
    pub y: &'a DVector<f64>,
    pub criterion: Criterion,
    pub cutoff: f64,
    pub threshold: &'a PruneThreshold,
}

/// What happens to one derived child.
#[derive(Debug)]
pub enum ChildOutcome {
    Score(Node),
    Pruned { level: usize },
    Discarded,
}

/// Fit `node` if it carries a new, non-empty model with fewer features than
/// rows; otherwise mark it unscored.
pub fn score_node<X: DesignMatrix + ?Sized>(ctx: &WorkerContext<'_, X>, node: &mut Node) {
    let k = node.num_features();
    if k > 0 && k < ctx.y.len() && node.is_new() {
        if let Some((coeff, score)) = score_subset(ctx.x, ctx.y, &node.model, ctx.criterion) {
            node.coeff = coeff;
            node.score = score;
            return;
        }
    }
    node.coeff.clear();
    node.score = UNSCORED;
}

/// Derive the child of `parent` in direction `flip` and decide its fate.
///
/// A child is only discarded when even its smallest completion cannot be
/// fitted. Bits `[level, M)` of a seeded model may still be switched off
/// further down, so the child's own feature count is not enough.
pub fn expand_child<X: DesignMatrix + ?Sized>(
    ctx: &WorkerContext<'_, X>,
    parent: &Node,
    flip: bool,
) -> ChildOutcome {
    let mut child = parent.derive_child(flip);
    if child.model.lcs(child.level).num_features() >= ctx.y.len() {
        return ChildOutcome::Discarded;
    }
    let k = child.num_features();

    let (lower, upper) = if k == 0 {
        UNBOUNDED
    } else {
        bounds(&child.model, child.level, ctx.x, ctx.y, ctx.criterion)
    };
    child.lower = lower;
    child.upper = upper;

    if ctx.threshold.prunes(lower, ctx.cutoff) {
        return ChildOutcome::Pruned {
            level: parent.level,
        };
    }
    ChildOutcome::Score(child)
}

/// Scoring worker: runs until the shared queue is closed.
pub fn run_scoring_worker<X: DesignMatrix + ?Sized>(
    ctx: &WorkerContext<'_, X>,
    queue: &Mutex<Receiver<Node>>,
    events: Sender<Event>,
) {
    loop {
        let next = {
            // Receiving cannot panic, so a poisoned lock still guards a usable receiver.
            let guard = queue.lock().unwrap_or_else(|e| e.into_inner());
            guard.recv()
        };
        let Ok(mut node) = next else {
            break;
        };
        score_node(ctx, &mut node);
        if events.send(Event::Scored(node)).is_err() {
            break;
        }
    }
}

/// Child-generation worker `id`: runs until its parent channel is closed.
pub fn run_child_worker<X: DesignMatrix + ?Sized>(
    ctx: &WorkerContext<'_, X>,
    id: usize,
    parents: Receiver<Node>,
    to_score: SyncSender<Node>,
    events: Sender<Event>,
) {
    for parent in parents.iter() {
        for flip in [false, true] {
            let sent = match expand_child(ctx, &parent, flip) {
                ChildOutcome::Score(child) => to_score.send(child).is_ok(),
                ChildOutcome::Pruned { level } => {
                    trace!(worker = id, level, "pruned subtree");
                    events.send(Event::Pruned { level }).is_ok()
                }
                ChildOutcome::Discarded => events.send(Event::Discarded).is_ok(),
            };
            if !sent {
                return;
            }
        }
        if events.send(Event::Ready(id)).is_err() {
            return;
        }
    }
}
