//! Fingerprint lookup over a game tree: jump to any position in O(1).

use std::collections::HashMap;

use crate::tree::NodeId;

/// Maps board fingerprints to their owning tree node, with `first`/`last`
/// sentinels for the two ends of the mainline.
///
/// When two paths reach the same position (a transposition), the entry
/// inserted last wins; the index is rebuilt wholesale with its tree, so no
/// removal operation exists.
#[derive(Debug, Clone)]
pub struct PositionIndex {
    by_fen: HashMap<String, NodeId>,
    first: NodeId,
    last: NodeId,
}

impl PositionIndex {
    /// A fresh index for a tree rooted at `root` standing on `root_fen`.
    pub fn new(root: NodeId, root_fen: &str) -> Self {
        let mut by_fen = HashMap::new();
        by_fen.insert(root_fen.to_string(), root);
        Self {
            by_fen,
            first: root,
            last: root,
        }
    }

    /// Register a node under its fingerprint, overwriting any previous entry.
    pub fn insert(&mut self, fen: impl Into<String>, node: NodeId) {
        self.by_fen.insert(fen.into(), node);
    }

    pub fn lookup(&self, fen: &str) -> Option<NodeId> {
        self.by_fen.get(fen).copied()
    }

    /// The root of the game.
    pub fn first(&self) -> NodeId {
        self.first
    }

    /// The tip of the mainline.
    pub fn last(&self) -> NodeId {
        self.last
    }

    pub(crate) fn set_last(&mut self, node: NodeId) {
        self.last = node;
    }

    /// Number of distinct fingerprints.
    pub fn len(&self) -> usize {
        self.by_fen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_fen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::GameTree;

    #[test]
    fn test_root_is_first_and_findable() {
        let tree = GameTree::default();
        let index = PositionIndex::new(tree.root(), &tree.starting_fen);
        assert_eq!(index.first(), tree.root());
        assert_eq!(index.last(), tree.root());
        assert_eq!(index.lookup(&tree.starting_fen), Some(tree.root()));
        assert_eq!(index.lookup("missing"), None);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_insert_overwrites_same_fingerprint() {
        let mut tree = GameTree::default();
        let root = tree.root();
        let mv = cozy_chess::Move {
            from: cozy_chess::Square::A2,
            to: cozy_chess::Square::A3,
            promotion: None,
        };
        let a = tree.append_move(root, mv, "a3", "shared-fen", None);
        let b = tree.append_move(root, mv, "a3", "shared-fen", None);

        let mut index = PositionIndex::new(root, &tree.starting_fen);
        index.insert("shared-fen", a);
        index.insert("shared-fen", b);
        assert_eq!(index.lookup("shared-fen"), Some(b));
        assert_eq!(index.len(), 2);
    }
}
