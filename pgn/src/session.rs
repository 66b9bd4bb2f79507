//! One loaded game: its tree, its position index, and a cursor.
//!
//! The tree and index are always replaced together: a reload swaps both
//! wholesale and re-anchors the cursor by fingerprint. Callers serialize
//! "load" against "append"; the session itself has no interior locking.

use cozy_chess::Move;

use crate::export::{export_game, HtmlExporter, TextExporter};
use crate::fen::{self, FenError};
use crate::index::PositionIndex;
use crate::parser::{parse_game, Diagnostic, ParseError, ParseOptions};
use crate::san::{self, SanError};
use crate::tree::{GameTree, NodeId, Variant};

/// A mutable "current game" slot with a position cursor.
#[derive(Debug, Clone)]
pub struct GameSession {
    tree: GameTree,
    index: PositionIndex,
    current: NodeId,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Illegal move")]
    IllegalMove,
    #[error(transparent)]
    Fen(#[from] FenError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    San(#[from] SanError),
}

impl GameSession {
    /// Empty game from the standard starting position.
    pub fn new() -> Self {
        Self::with_tree(GameTree::default())
    }

    /// Empty game from a custom position.
    pub fn from_fen(fen: &str, variant: Variant) -> Result<Self, SessionError> {
        let board = fen::parse_fen(fen)?;
        Ok(Self::with_tree(GameTree::new(
            fen::format_fen(&board),
            variant,
        )))
    }

    fn with_tree(tree: GameTree) -> Self {
        let index = PositionIndex::new(tree.root(), &tree.starting_fen);
        let current = tree.root();
        Self {
            tree,
            index,
            current,
        }
    }

    /// Replace the whole game with a parse of `text`. The cursor stays on its
    /// position when the new game still reaches it, otherwise it returns to
    /// the start. Returns the parse diagnostics.
    pub fn load(
        &mut self,
        text: &str,
        options: &ParseOptions,
    ) -> Result<Vec<Diagnostic>, SessionError> {
        let parsed = parse_game(text, options)?;
        let cursor_fen = self.tree.node(self.current).fen.clone();
        self.tree = parsed.tree;
        self.index = parsed.index;
        self.current = self
            .index
            .lookup(&cursor_fen)
            .unwrap_or_else(|| self.index.first());
        Ok(parsed.diagnostics)
    }

    pub fn tree(&self) -> &GameTree {
        &self.tree
    }

    pub fn index(&self) -> &PositionIndex {
        &self.index
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    /// Board at the cursor.
    pub fn current_board(&self) -> cozy_chess::Board {
        fen::parse_fen(&self.tree.node(self.current).fen).unwrap_or_default()
    }

    /// Play a move at the cursor. An existing child recording the same move
    /// is followed instead of duplicated; otherwise the move is validated
    /// against the rules engine and appended, and the index learns the new
    /// fingerprint.
    pub fn play_move(&mut self, mv: Move) -> Result<NodeId, SessionError> {
        let board = self.current_board();
        if !san::legal_moves(&board).contains(&mv) {
            return Err(SessionError::IllegalMove);
        }
        let san = san::format_san(&board, mv);

        for &child in self.tree.node(self.current).children() {
            if self.tree.node(child).san() == Some(san.as_str()) {
                self.current = child;
                return Ok(child);
            }
        }

        let mut after = board;
        after.play_unchecked(mv);
        let after_fen = fen::format_fen(&after);
        let node = self
            .tree
            .append_move(self.current, mv, san, after_fen.clone(), None);
        self.index.insert(after_fen, node);
        self.index.set_last(self.tree.mainline_tip());
        self.current = node;
        Ok(node)
    }

    /// Resolve possibly-sloppy move text at the cursor and play it.
    pub fn play_san(&mut self, text: &str) -> Result<NodeId, SessionError> {
        let board = self.current_board();
        let mv = san::resolve_san(&board, text)?;
        self.play_move(mv)
    }

    /// Jump the cursor to the node holding this fingerprint, if any.
    pub fn jump_to_fen(&mut self, fen: &str) -> Option<NodeId> {
        let node = self.index.lookup(fen)?;
        self.current = node;
        Some(node)
    }

    pub fn jump_first(&mut self) -> NodeId {
        self.current = self.index.first();
        self.current
    }

    pub fn jump_last(&mut self) -> NodeId {
        self.current = self.index.last();
        self.current
    }

    /// Step to the previous position; `None` at the start.
    pub fn back(&mut self) -> Option<NodeId> {
        let parent = self.tree.node(self.current).parent()?;
        self.current = parent;
        Some(parent)
    }

    /// Step along the mainline; `None` at a leaf.
    pub fn forward(&mut self) -> Option<NodeId> {
        let next = self.tree.node(self.current).mainline_child()?;
        self.current = next;
        Some(next)
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.tree.headers.insert(name.into(), value.into());
    }

    pub fn export_text(&self, columns: Option<usize>) -> String {
        let mut exporter = TextExporter::new(columns);
        export_game(&self.tree, &mut exporter, true, true)
    }

    pub fn export_html(&self, columns: Option<usize>) -> String {
        let mut exporter = HtmlExporter::new(columns);
        export_game(&self.tree, &mut exporter, true, true)
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_and_navigate() {
        let mut session = GameSession::new();
        let e4 = session.play_san("e4").unwrap();
        let e5 = session.play_san("e5").unwrap();
        assert_eq!(session.current(), e5);

        assert_eq!(session.back(), Some(e4));
        assert_eq!(session.forward(), Some(e5));
        assert_eq!(session.forward(), None);

        session.jump_first();
        assert_eq!(session.current(), session.tree().root());
        session.jump_last();
        assert_eq!(session.current(), e5);
    }

    #[test]
    fn test_existing_child_is_followed_not_duplicated() {
        let mut session = GameSession::new();
        session.play_san("e4").unwrap();
        session.jump_first();
        let again = session.play_san("e4").unwrap();
        assert_eq!(session.current(), again);
        assert_eq!(session.tree().node(session.tree().root()).children().len(), 1);
    }

    #[test]
    fn test_new_move_from_mid_game_becomes_sideline() {
        let mut session = GameSession::new();
        session.play_san("e4").unwrap();
        session.play_san("e5").unwrap();
        session.back();
        session.play_san("c5").unwrap();

        let root = session.tree().root();
        let e4 = session.tree().node(root).mainline_child().unwrap();
        let children = session.tree().node(e4).children();
        assert_eq!(children.len(), 2);
        assert_eq!(session.tree().node(children[0]).san(), Some("e5"));
        assert_eq!(session.tree().node(children[1]).san(), Some("c5"));
    }

    #[test]
    fn test_illegal_move_fails_fast() {
        let mut session = GameSession::new();
        let mv = Move {
            from: cozy_chess::Square::A1,
            to: cozy_chess::Square::H8,
            promotion: None,
        };
        assert!(matches!(
            session.play_move(mv),
            Err(SessionError::IllegalMove)
        ));
        assert!(matches!(
            session.play_san("Qh5"),
            Err(SessionError::San(_))
        ));
    }

    #[test]
    fn test_jump_by_fingerprint() {
        let mut session = GameSession::new();
        let e4 = session.play_san("e4").unwrap();
        session.play_san("e5").unwrap();

        let fen = session.tree().node(e4).fen.clone();
        session.jump_first();
        assert_eq!(session.jump_to_fen(&fen), Some(e4));
        assert_eq!(session.jump_to_fen("nowhere"), None);
        assert_eq!(session.current(), e4);
    }

    #[test]
    fn test_reload_keeps_cursor_position_when_it_survives() {
        let mut session = GameSession::new();
        session
            .load("1. e4 e5 2. Nf3 Nc6 *", &ParseOptions::default())
            .unwrap();
        session.jump_first();
        session.forward();
        session.forward();
        let fen = session.tree().node(session.current()).fen.clone();

        // Same opening, longer game: the cursor position still exists
        session
            .load("1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 *", &ParseOptions::default())
            .unwrap();
        assert_eq!(session.tree().node(session.current()).fen, fen);

        // A different game: back to the start
        session
            .load("1. d4 d5 *", &ParseOptions::default())
            .unwrap();
        assert_eq!(session.current(), session.index().first());
    }

    #[test]
    fn test_export_reflects_played_moves() {
        let mut session = GameSession::new();
        session.play_san("e4").unwrap();
        session.play_san("e5").unwrap();
        let out = session.export_text(None);
        assert!(out.ends_with("1. e4 e5 *"));
    }
}
