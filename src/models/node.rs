//! Search-tree nodes.
//!
//! The search walks an implicit binary tree. A node at level `L` has the bits
//! `[0, L)` of its model decided by its ancestors. Each parent at level `L` has
//! two children at level `L + 1`:
//!
//! - the *inherited* child keeps bit `L` as the parent had it, so its model is
//!   the parent's model again;
//! - the *flipped* child toggles bit `L`, giving a model no other node has.
//!
//! Only the root and flipped children introduce a new candidate model. Inherited
//! children are still expanded (their descendants flip later bits) but must not
//! be fitted or recorded a second time.

use crate::models::Model;

/// Score carried by a node that has not been fitted.
pub const UNSCORED: f64 = f64::NEG_INFINITY;

/// Bound used when no finite bracket can be computed.
pub const BOUND_SENTINEL: f64 = f64::MAX;

/// How a node relates to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    /// Same model as the parent.
    Inherited,
    /// Bit `level - 1` differs from the parent: a new candidate model.
    Flipped,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub model: Model,
    /// Fitted coefficients for the selected columns, in column order.
    pub coeff: Vec<f64>,
    pub level: usize,
    pub lower: f64,
    pub upper: f64,
    /// `-AICc` once scored, [`UNSCORED`] otherwise.
    pub score: f64,
    pub kind: NodeKind,
}

impl Node {
    /// Root node over `model`, level 0, unbounded and unscored.
    pub fn root(model: Model) -> Self {
        Self {
            model,
            coeff: Vec::new(),
            level: 0,
            lower: -BOUND_SENTINEL,
            upper: BOUND_SENTINEL,
            score: UNSCORED,
            kind: NodeKind::Root,
        }
    }

    /// Derive the child at `self.level + 1`, toggling bit `self.level` when `flip` is set.
    ///
    /// # Panics
    /// Panics if the node is already at the last level.
    pub fn derive_child(&self, flip: bool) -> Node {
        let mut model = self.model.clone();
        if flip {
            model.flip(self.level);
        }
        Node {
            model,
            coeff: Vec::new(),
            level: self.level + 1,
            lower: -BOUND_SENTINEL,
            upper: BOUND_SENTINEL,
            score: UNSCORED,
            kind: if flip { NodeKind::Flipped } else { NodeKind::Inherited },
        }
    }

    /// True if this node is the first to carry its model.
    pub fn is_new(&self) -> bool {
        self.level == 0 || self.kind == NodeKind::Flipped
    }

    pub fn num_features(&self) -> usize {
        self.model.num_features()
    }

    pub fn is_scored(&self) -> bool {
        self.score.is_finite()
    }

    /// True once every bit has been decided.
    pub fn is_leaf(&self) -> bool {
        self.level >= self.model.len()
    }
}
