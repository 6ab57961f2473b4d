//! Bounded list of the best models seen so far.
//!
//! Entries are kept sorted by descending score. The list is owned by the search
//! orchestrator thread; it has no interior locking and must not be shared for
//! mutation.

use crate::domain::{HighscoreEntry, HighscoreFile};
use crate::error::AppError;
use crate::models::Node;

#[derive(Debug, Clone)]
pub struct Highscore {
    items: Vec<Node>,
    max_items: usize,
}

impl Highscore {
    pub fn new(max_items: usize) -> Self {
        Self {
            items: Vec::with_capacity(max_items.min(1024)),
            max_items,
        }
    }

    /// Insert `node`, keeping the list sorted and at most `capacity()` long.
    ///
    /// A node tying an existing score goes behind it.
    pub fn insert(&mut self, node: Node) {
        if self.items.len() + 1 == self.max_items {
            if let Some(last) = self.items.last() {
                if node.score <= last.score {
                    return;
                }
            }
        }

        let pos = self
            .items
            .iter()
            .position(|item| item.score < node.score)
            .unwrap_or(self.items.len());
        self.items.insert(pos, node);
        self.items.truncate(self.max_items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_items
    }

    /// Score of the best entry, `0.0` when empty.
    pub fn best_score(&self) -> f64 {
        self.items.first().map(|n| n.score).unwrap_or(0.0)
    }

    pub fn best(&self) -> Option<&Node> {
        self.items.first()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.items.iter().map(|n| n.score).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.items.iter()
    }

    pub fn to_file(&self) -> HighscoreFile {
        HighscoreFile {
            max_items: self.max_items,
            items: self.items.iter().map(HighscoreEntry::from_node).collect(),
        }
    }

    /// Rebuild a saved list as it was written.
    ///
    /// Entries are taken verbatim rather than re-inserted, since insertion
    /// rejects ties once the list is nearly full.
    pub fn from_file(file: &HighscoreFile) -> Result<Self, AppError> {
        if file.items.len() > file.max_items {
            return Err(AppError::config(format!(
                "Highscore file holds {} entries but maxItems is {}.",
                file.items.len(),
                file.max_items
            )));
        }
        let items = file
            .items
            .iter()
            .map(HighscoreEntry::to_node)
            .collect::<Result<Vec<_>, _>>()?;
        if items.windows(2).any(|w| w[0].score < w[1].score) {
            return Err(AppError::config("Highscore file entries are not sorted by score."));
        }
        Ok(Self {
            items,
            max_items: file.max_items,
        })
    }
}
