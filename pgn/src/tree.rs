//! The move-variation tree: mainline plus arbitrarily nested sidelines.
//!
//! Nodes live in an arena owned by [`GameTree`]; parent links are plain
//! back-references for upward traversal, ownership only flows root→children.

use std::collections::HashMap;

use cozy_chess::Move;
use smallvec::SmallVec;

use crate::fen;

/// Handle to a node in a [`GameTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The move recorded on a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeMove {
    /// Resolved against the rules engine.
    Resolved { mv: Move, san: String },
    /// Placeholder for move text that did not resolve; kept so that the rest
    /// of the game stays traversable.
    Unresolved { raw: String },
}

/// One ply of the game.
#[derive(Debug, Clone)]
pub struct GameNode {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// `None` only for the root.
    pub mv: Option<NodeMove>,
    /// Fingerprint of the position this node stands on (for the root, the
    /// starting position; for a move node, the position after the move).
    pub fen: String,
    /// 1-based ply counter; the root sits at 0.
    pub half_move_num: u32,
    /// NAG codes in insertion order; duplicates allowed.
    pub nags: SmallVec<[u8; 4]>,
    /// Free text attached after this move.
    pub comment: Option<String>,
    /// Free text preceding this move, when it opens a sideline.
    pub starting_comment: Option<String>,
}

impl GameNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The mainline continuation (first child), if any.
    pub fn mainline_child(&self) -> Option<NodeId> {
        self.children.first().copied()
    }

    /// Sideline children (all children except the first).
    pub fn variation_children(&self) -> &[NodeId] {
        if self.children.len() > 1 {
            &self.children[1..]
        } else {
            &[]
        }
    }

    /// SAN of the move on this node, when it resolved.
    pub fn san(&self) -> Option<&str> {
        match &self.mv {
            Some(NodeMove::Resolved { san, .. }) => Some(san),
            _ => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.mv, Some(NodeMove::Unresolved { .. }))
    }
}

/// Game termination marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    #[default]
    Ongoing,
}

impl GameResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Ongoing => "*",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "1-0" => Some(Self::WhiteWins),
            "0-1" => Some(Self::BlackWins),
            "1/2-1/2" => Some(Self::Draw),
            "*" => Some(Self::Ongoing),
            _ => None,
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ruleset flag; decides how the rules engine reads FEN strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    Standard,
    Chess960,
}

/// Returns true if the given 1-indexed ply belongs to White.
/// Convention: odd plies (1, 3, 5, …) are White moves; even plies (2, 4, 6, …) are Black.
pub fn is_white_ply(ply: u32) -> bool {
    ply % 2 == 1
}

/// A whole game: header tags, starting position, and the node arena.
#[derive(Debug, Clone)]
pub struct GameTree {
    nodes: Vec<GameNode>,
    pub headers: HashMap<String, String>,
    pub starting_fen: String,
    pub result: GameResult,
    pub variant: Variant,
}

impl GameTree {
    /// Create an empty tree rooted at the given starting position.
    pub fn new(starting_fen: impl Into<String>, variant: Variant) -> Self {
        let starting_fen = starting_fen.into();
        let root = GameNode {
            parent: None,
            children: Vec::new(),
            mv: None,
            fen: starting_fen.clone(),
            half_move_num: 0,
            nags: SmallVec::new(),
            comment: None,
            starting_comment: None,
        };
        Self {
            nodes: vec![root],
            headers: HashMap::new(),
            starting_fen,
            result: GameResult::default(),
            variant,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Borrow a node. Panics if the id does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &GameNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut GameNode {
        &mut self.nodes[id.index()]
    }

    /// Attach a new node under `parent`. The first child of a node becomes
    /// its mainline continuation; later children are sidelines, in order.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        mv: NodeMove,
        fen: impl Into<String>,
        comment: Option<String>,
        starting_comment: Option<String>,
    ) -> NodeId {
        assert!(
            parent.index() < self.nodes.len(),
            "attachment node does not belong to this tree"
        );
        let half_move_num = self.nodes[parent.index()].half_move_num + 1;
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(GameNode {
            parent: Some(parent),
            children: Vec::new(),
            mv: Some(mv),
            fen: fen.into(),
            half_move_num,
            nags: SmallVec::new(),
            comment,
            starting_comment,
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Incremental single-move extension used during live play.
    ///
    /// The caller vouches for `mv` being the move that leads from `attach`'s
    /// position to `fen`; no legality check happens here.
    pub fn append_move(
        &mut self,
        attach: NodeId,
        mv: Move,
        san: impl Into<String>,
        fen: impl Into<String>,
        comment: Option<String>,
    ) -> NodeId {
        self.add_child(
            attach,
            NodeMove::Resolved {
                mv,
                san: san.into(),
            },
            fen,
            comment,
            None,
        )
    }

    /// Walk the mainline (`children[0]` at every step), excluding the root.
    pub fn mainline(&self) -> Mainline<'_> {
        Mainline {
            tree: self,
            next: self.node(self.root()).mainline_child(),
        }
    }

    /// The last node of the mainline; the root when the game has no moves.
    pub fn mainline_tip(&self) -> NodeId {
        let mut tip = self.root();
        while let Some(next) = self.node(tip).mainline_child() {
            tip = next;
        }
        tip
    }

    /// Mainline node at the given 1-based halfmove number.
    pub fn node_at_halfmove(&self, halfmove: u32) -> Option<NodeId> {
        if halfmove == 0 {
            return None;
        }
        self.mainline().nth(halfmove as usize - 1)
    }
}

impl Default for GameTree {
    fn default() -> Self {
        Self::new(fen::START_FEN, Variant::Standard)
    }
}

/// Iterator over mainline nodes, root excluded.
pub struct Mainline<'a> {
    tree: &'a GameTree,
    next: Option<NodeId>,
}

impl Iterator for Mainline<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.node(current).mainline_child();
        Some(current)
    }
}
