//! Branch-and-bound orchestrator.
//!
//! `select_model` runs the whole search inside one `std::thread::scope`:
//!
//! - a pool of scoring workers shares one bounded queue of nodes to fit;
//! - a pool of child workers, each fed one parent at a time through its own
//!   channel, derives and bound-checks children;
//! - the calling thread is the orchestrator. It alone owns the highscore list,
//!   the backlog, and the in-flight count, and learns about everything else
//!   through [`Event`]s.
//!
//! Termination: the orchestrator counts nodes that have been created but not yet
//! reported (`outstanding`). Sending the root adds one, handing a parent to a
//! child worker adds two, and every `Scored`, `Pruned` or `Discarded` event
//! removes one. The search is done once nothing is outstanding and the backlog
//! is empty.

use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

use nalgebra::DVector;
use tracing::{debug, info, warn};

use crate::domain::{DesignMatrix, ProgressSnapshot, SearchConfig};
use crate::error::AppError;
use crate::models::{Model, Node};
use crate::search::backlog::Backlog;
use crate::search::highscore::Highscore;
use crate::search::progress::{ProgressTracker, PruneThreshold, log2_pruned_update};
use crate::search::workers::{Event, WorkerContext, run_child_worker, run_scoring_worker};

/// Nodes buffered between child workers and scoring workers, per scoring worker.
const SCORE_QUEUE_DEPTH: usize = 64;

/// How long the orchestrator waits for an event before checking worker health.
const IDLE_TICK: Duration = Duration::from_millis(200);

/// Receives the highscore list periodically while a search runs.
pub trait Checkpoint {
    /// Persist the current list.
    ///
    /// Called on the orchestrator thread between events, so no node is recorded
    /// while it runs. `highscore` is borrowed read-only for the duration of the
    /// call.
    fn save(&mut self, highscore: &Highscore, progress: &ProgressSnapshot) -> Result<(), AppError>;
}

/// Counters describing how a search went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes that went through a scoring worker (new or not).
    pub scored: u64,
    pub pruned: u64,
    /// Children dropped because every completion had as many features as data rows.
    pub discarded: u64,
    pub peak_backlog: usize,
    /// Parents popped depth-first because the backlog hit `max_queue_size`.
    pub deferred_pops: u64,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub highscore: Highscore,
    pub progress: ProgressSnapshot,
    pub stats: SearchStats,
}

/// Run branch and bound over every subset of the columns of `x`.
///
/// `progress` is updated after every event and may be read from other threads
/// while the search runs. `checkpoint`, if given, is called on this thread every
/// `config.checkpoint_interval` and once more when the search completes. A
/// failing periodic checkpoint is logged and the search continues; a failing
/// final one is returned as the error.
pub fn select_model<X: DesignMatrix + ?Sized>(
    x: &X,
    y: &[f64],
    config: &SearchConfig,
    progress: &ProgressTracker,
    checkpoint: Option<&mut dyn Checkpoint>,
) -> Result<SearchOutcome, AppError> {
    let (rows, num_features) = x.dims();
    config.validate(rows, num_features, y.len())?;

    info!(
        rows,
        num_features,
        criterion = config.criterion.display_name(),
        scoring_workers = config.scoring_workers,
        child_workers = config.child_workers,
        cutoff = config.cutoff,
        "starting branch and bound"
    );
    let started = Instant::now();

    let y = DVector::from_column_slice(y);
    let threshold = PruneThreshold::new();
    let ctx = WorkerContext {
        x,
        y: &y,
        criterion: config.criterion,
        cutoff: config.cutoff,
        threshold: &threshold,
    };

    let (event_tx, event_rx) = mpsc::channel::<Event>();
    let (score_tx, score_rx) =
        mpsc::sync_channel::<Node>(SCORE_QUEUE_DEPTH * config.scoring_workers);
    let score_queue = Mutex::new(score_rx);
    let (parent_txs, parent_rxs): (Vec<SyncSender<Node>>, Vec<Receiver<Node>>) =
        (0..config.child_workers).map(|_| mpsc::sync_channel(1)).unzip();

    let root = Node::root(
        config
            .root_model
            .clone()
            .unwrap_or_else(|| Model::empty(num_features)),
    );
    let mut orchestrator = Orchestrator::new(num_features, config, progress, &threshold);

    let outcome = thread::scope(|s| {
        let mut handles = Vec::with_capacity(config.scoring_workers + config.child_workers);
        for _ in 0..config.scoring_workers {
            let events = event_tx.clone();
            let (ctx, queue) = (&ctx, &score_queue);
            handles.push(s.spawn(move || run_scoring_worker(ctx, queue, events)));
        }
        for (id, parents) in parent_rxs.into_iter().enumerate() {
            let events = event_tx.clone();
            let to_score = score_tx.clone();
            let ctx = &ctx;
            handles.push(s.spawn(move || run_child_worker(ctx, id, parents, to_score, events)));
        }
        drop(event_tx);

        let channels = Channels {
            events: event_rx,
            to_score: score_tx,
            parents: parent_txs,
        };
        let result = orchestrator.run(root, &channels, &handles, checkpoint);

        // Closing the input queues lets every worker return.
        drop(channels);
        let mut panicked = false;
        for handle in handles {
            panicked |= handle.join().is_err();
        }
        match result {
            Ok(()) if panicked => Err(AppError::internal("A search worker panicked.")),
            other => other,
        }
    });
    outcome?;

    let progress_snapshot = progress.get();
    let stats = orchestrator.stats();
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        best_score = progress_snapshot.best_score,
        num_explored = progress_snapshot.num_explored,
        log2_num_pruned = progress_snapshot.log2_num_pruned,
        pruned = stats.pruned,
        discarded = stats.discarded,
        peak_backlog = stats.peak_backlog,
        "branch and bound finished"
    );

    Ok(SearchOutcome {
        highscore: orchestrator.highscore,
        progress: progress_snapshot,
        stats,
    })
}

struct Channels {
    events: Receiver<Event>,
    to_score: SyncSender<Node>,
    parents: Vec<SyncSender<Node>>,
}

struct Orchestrator<'a> {
    num_features: usize,
    highscore: Highscore,
    backlog: Backlog,
    /// Nodes created but not yet reported back.
    outstanding: u64,
    /// Child workers waiting for a parent.
    idle: Vec<usize>,
    num_explored: u64,
    log2_num_pruned: f64,
    stats: SearchStats,
    checkpoint_interval: Option<Duration>,
    last_checkpoint: Instant,
    progress: &'a ProgressTracker,
    threshold: &'a PruneThreshold,
}

impl<'a> Orchestrator<'a> {
    fn new(
        num_features: usize,
        config: &SearchConfig,
        progress: &'a ProgressTracker,
        threshold: &'a PruneThreshold,
    ) -> Self {
        Self {
            num_features,
            highscore: Highscore::new(config.highscore_capacity),
            backlog: Backlog::new(config.max_queue_size),
            outstanding: 0,
            // Popped from the back, so worker 0 is handed work first.
            idle: (0..config.child_workers).rev().collect(),
            num_explored: 0,
            log2_num_pruned: f64::NEG_INFINITY,
            stats: SearchStats::default(),
            checkpoint_interval: config.checkpoint_interval,
            last_checkpoint: Instant::now(),
            progress,
            threshold,
        }
    }

    fn run(
        &mut self,
        root: Node,
        channels: &Channels,
        workers: &[ScopedJoinHandle<'_, ()>],
        mut checkpoint: Option<&mut dyn Checkpoint>,
    ) -> Result<(), AppError> {
        self.progress.set(0.0, 0, f64::NEG_INFINITY);
        channels
            .to_score
            .send(root)
            .map_err(|_| AppError::internal("Scoring workers exited before the search started."))?;
        self.outstanding = 1;

        while self.outstanding > 0 || !self.backlog.is_empty() {
            match channels.events.recv_timeout(IDLE_TICK) {
                Ok(event) => {
                    self.handle(event)?;
                    self.dispatch(&channels.parents)?;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if workers.iter().any(|w| w.is_finished()) {
                        return Err(AppError::internal("A search worker stopped unexpectedly."));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(AppError::internal("All search workers disconnected."));
                }
            }
            if let Some(sink) = checkpoint.as_deref_mut() {
                self.maybe_checkpoint(sink);
            }
        }
        self.stats.peak_backlog = self.backlog.peak_len();
        self.stats.deferred_pops = self.backlog.deferred_pops();
        if let Some(sink) = checkpoint {
            sink.save(&self.highscore, &self.progress.get())?;
        }
        Ok(())
    }

    fn handle(&mut self, event: Event) -> Result<(), AppError> {
        match event {
            Event::Scored(node) => {
                self.complete()?;
                self.stats.scored += 1;
                self.record(node);
            }
            Event::Pruned { level } => {
                self.complete()?;
                self.stats.pruned += 1;
                let k = self.num_features.saturating_sub(level) as f64;
                self.log2_num_pruned = log2_pruned_update(self.log2_num_pruned, k);
                self.publish();
            }
            Event::Discarded => {
                self.complete()?;
                self.stats.discarded += 1;
            }
            Event::Ready(worker) => self.idle.push(worker),
        }
        Ok(())
    }

    fn record(&mut self, node: Node) {
        if node.is_new() {
            self.num_explored += 1;
            if node.is_scored() {
                self.highscore.insert(node.clone());
                self.threshold.tighten(-self.highscore.best_score());
            }
        }
        self.publish();
        if !node.is_leaf() {
            self.backlog.push(node);
        }
    }

    /// Hand backlog parents to idle child workers.
    fn dispatch(&mut self, parents: &[SyncSender<Node>]) -> Result<(), AppError> {
        while let Some(&worker) = self.idle.last() {
            let Some(parent) = self.backlog.pop() else {
                break;
            };
            self.idle.pop();
            parents[worker]
                .send(parent)
                .map_err(|_| AppError::internal(format!("Child worker {worker} exited early.")))?;
            self.outstanding += 2;
        }
        Ok(())
    }

    fn complete(&mut self) -> Result<(), AppError> {
        debug_assert!(self.outstanding > 0, "event without an outstanding node");
        self.outstanding = self
            .outstanding
            .checked_sub(1)
            .ok_or_else(|| AppError::internal("Received more search events than nodes created."))?;
        Ok(())
    }

    fn publish(&self) {
        self.progress.set(
            self.highscore.best_score(),
            self.num_explored,
            self.log2_num_pruned,
        );
    }

    fn maybe_checkpoint(&mut self, sink: &mut dyn Checkpoint) {
        let Some(interval) = self.checkpoint_interval else {
            return;
        };
        if self.last_checkpoint.elapsed() < interval {
            return;
        }
        self.last_checkpoint = Instant::now();
        match sink.save(&self.highscore, &self.progress.get()) {
            Ok(()) => debug!(entries = self.highscore.len(), "checkpoint written"),
            Err(err) => warn!(error = %err, "checkpoint failed; search continues"),
        }
    }

    fn stats(&self) -> SearchStats {
        self.stats
    }
}
