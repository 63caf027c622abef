use serde::{Deserialize, Serialize};
use thin_vec::ThinVec;

/// A node in a localization graph, one feasible (site, box) combination
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Node {
    /// The site layer of this node
    pub layer: usize,
    /// The column (index in the localization boxes) of this node
    pub column: usize,
    /// The number of matched fragments that are only explained if the glycans of the
    /// sites up to and including this one are exactly the box of this node
    pub local_score: usize,
    /// The highest total score of any path from the first layer ending in this node
    pub max_score: usize,
    /// The columns of all predecessors in the previous layer that reach the highest score
    pub best_sources: ThinVec<usize>,
    /// The columns of all feasible predecessors in the previous layer
    pub all_sources: ThinVec<usize>,
}

impl Node {
    /// Create a node without predecessors
    pub fn new(layer: usize, column: usize, local_score: usize) -> Self {
        Self {
            layer,
            column,
            local_score,
            max_score: local_score,
            best_sources: ThinVec::new(),
            all_sources: ThinVec::new(),
        }
    }

    /// Register a feasible predecessor with the given max score, keeping all tied best predecessors
    pub(super) fn add_source(&mut self, column: usize, max_score: usize) {
        let current = self.max_score.saturating_sub(self.local_score);
        if self.best_sources.is_empty() || max_score > current {
            self.best_sources.clear();
            self.best_sources.push(column);
            self.max_score = max_score + self.local_score;
        } else if max_score == current {
            self.best_sources.push(column);
        }
        self.all_sources.push(column);
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn ties_are_kept() {
        let mut node = Node::new(1, 3, 2);
        node.add_source(0, 1);
        assert_eq!(node.max_score, 3);
        node.add_source(1, 4);
        node.add_source(2, 4);
        node.add_source(3, 0);
        assert_eq!(node.max_score, 6);
        assert_eq!(node.best_sources.as_slice(), &[1, 2]);
        assert_eq!(node.all_sources.as_slice(), &[0, 1, 2, 3]);
    }

    #[test]
    fn zero_scores_tie() {
        let mut node = Node::new(2, 0, 0);
        node.add_source(0, 0);
        node.add_source(1, 0);
        assert_eq!(node.max_score, 0);
        assert_eq!(node.best_sources.as_slice(), &[0, 1]);
    }
}
