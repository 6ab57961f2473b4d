//! Parents waiting for child generation.
//!
//! The backlog is FIFO, which explores the tree level by level. A wide tree can
//! make a level-order backlog very large, so once it reaches `max_len` it pops
//! from the back instead: the most recently scored, deepest nodes are expanded
//! first until the backlog shrinks below the cap. No node is ever dropped, so
//! the search result is unchanged; only the visiting order differs.

use std::collections::VecDeque;

use tracing::warn;

use crate::models::Node;

#[derive(Debug)]
pub struct Backlog {
    nodes: VecDeque<Node>,
    max_len: usize,
    peak_len: usize,
    deferred_pops: u64,
    warned: bool,
}

impl Backlog {
    pub fn new(max_len: usize) -> Self {
        Self {
            nodes: VecDeque::new(),
            max_len: max_len.max(1),
            peak_len: 0,
            deferred_pops: 0,
            warned: false,
        }
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push_back(node);
        self.peak_len = self.peak_len.max(self.nodes.len());
        if self.nodes.len() >= self.max_len && !self.warned {
            self.warned = true;
            warn!(
                max_queue_size = self.max_len,
                "backlog reached its size cap; expanding deepest nodes first"
            );
        }
    }

    pub fn pop(&mut self) -> Option<Node> {
        if self.nodes.len() >= self.max_len {
            self.deferred_pops += 1;
            self.nodes.pop_back()
        } else {
            self.nodes.pop_front()
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn peak_len(&self) -> usize {
        self.peak_len
    }

    /// Pops served from the back because the cap was reached.
    pub fn deferred_pops(&self) -> u64 {
        self.deferred_pops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Model;

    fn node_at(level: usize) -> Node {
        let mut node = Node::root(Model::empty(8));
        node.level = level;
        node
    }

    #[test]
    fn pops_in_fifo_order_below_cap() {
        let mut backlog = Backlog::new(10);
        for level in 0..3 {
            backlog.push(node_at(level));
        }
        let order: Vec<usize> = std::iter::from_fn(|| backlog.pop()).map(|n| n.level).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(backlog.deferred_pops(), 0);
        assert_eq!(backlog.peak_len(), 3);
    }

    #[test]
    fn pops_from_back_at_cap() {
        let mut backlog = Backlog::new(3);
        for level in 0..4 {
            backlog.push(node_at(level));
        }
        // len 4 >= 3: newest first, then len 3 >= 3: newest again, then FIFO.
        assert_eq!(backlog.pop().map(|n| n.level), Some(3));
        assert_eq!(backlog.pop().map(|n| n.level), Some(2));
        assert_eq!(backlog.pop().map(|n| n.level), Some(0));
        assert_eq!(backlog.pop().map(|n| n.level), Some(1));
        assert!(backlog.pop().is_none());
        assert_eq!(backlog.deferred_pops(), 2);
        assert_eq!(backlog.peak_len(), 4);
    }
}
