//! Serialization of a game tree back into linear text or annotated markup.
//!
//! The traversal is written once against the [`Exporter`] trait: at every
//! branch point the mainline move is emitted first, then each sideline is
//! fully resolved (nested sidelines included) before the mainline resumes.

mod html;
mod text;

pub use html::HtmlExporter;
pub use text::TextExporter;

use cozy_chess::{Board, Color};

use crate::fen;
use crate::san;
use crate::tree::{GameTree, NodeId, NodeMove};
use crate::uci::format_square;

/// Capability set a concrete exporter implements. Callbacks with a default
/// body are optional; the traversal calls all of them in document order.
pub trait Exporter {
    fn start_game(&mut self) {}
    fn end_game(&mut self) {}

    fn start_headers(&mut self) {}
    fn put_header(&mut self, _name: &str, _value: &str) {}
    fn end_headers(&mut self) {}

    fn start_variation(&mut self);
    fn end_variation(&mut self);

    fn put_starting_comment(&mut self, comment: &str) {
        self.put_comment(comment);
    }
    fn put_comment(&mut self, comment: &str);

    /// NAG codes are sorted ascending before emission.
    fn put_nags(&mut self, nags: &[u8]) {
        let mut sorted = nags.to_vec();
        sorted.sort_unstable();
        for nag in sorted {
            self.put_nag(nag);
        }
    }
    fn put_nag(&mut self, nag: u8);

    /// `variation_start` also covers Black's move resuming after a sideline.
    fn put_fullmove_number(&mut self, turn: Color, fullmove_number: u32, variation_start: bool);
    fn put_move(&mut self, board: &Board, mv: &NodeMove);
    fn put_result(&mut self, result: &str);

    /// Consume the buffered output.
    fn finish(&mut self) -> String;
}

/// Serialize a whole game: headers, movetext, result.
pub fn export_game<E: Exporter + ?Sized>(
    tree: &GameTree,
    exporter: &mut E,
    include_comments: bool,
    include_variations: bool,
) -> String {
    exporter.start_game();
    exporter.start_headers();
    for (name, value) in ordered_headers(tree) {
        exporter.put_header(&name, &value);
    }
    exporter.end_headers();

    let board = fen::parse_fen(&tree.starting_fen).unwrap_or_default();
    if include_comments {
        if let Some(comment) = &tree.node(tree.root()).comment {
            exporter.put_comment(comment);
        }
    }
    write_subtree(
        tree,
        tree.root(),
        exporter,
        include_comments,
        include_variations,
        &board,
        false,
    );
    exporter.put_result(tree.result.as_str());
    exporter.end_game();
    exporter.finish()
}

fn write_subtree<E: Exporter + ?Sized>(
    tree: &GameTree,
    node: NodeId,
    exporter: &mut E,
    include_comments: bool,
    include_variations: bool,
    board: &Board,
    after_variation: bool,
) {
    let current = tree.node(node);

    // The mainline move at this branch point comes first, unwrapped.
    if let Some(main) = current.mainline_child() {
        let main_node = tree.node(main);
        if let Some(mv) = &main_node.mv {
            exporter.put_fullmove_number(
                board.side_to_move(),
                u32::from(board.fullmove_number()),
                after_variation,
            );
            exporter.put_move(board, mv);
            if include_comments {
                exporter.put_nags(&main_node.nags);
                if let Some(comment) = &main_node.comment {
                    exporter.put_comment(comment);
                }
            }
        }
    }

    // Then every sideline, each fully resolved before the next.
    if include_variations {
        for &variation in current.variation_children() {
            let var_node = tree.node(variation);
            exporter.start_variation();
            if include_comments {
                if let Some(comment) = &var_node.starting_comment {
                    exporter.put_starting_comment(comment);
                }
            }
            if let Some(mv) = &var_node.mv {
                exporter.put_fullmove_number(
                    board.side_to_move(),
                    u32::from(board.fullmove_number()),
                    true,
                );
                exporter.put_move(board, mv);
                if include_comments {
                    exporter.put_nags(&var_node.nags);
                    if let Some(comment) = &var_node.comment {
                        exporter.put_comment(comment);
                    }
                }
                match advance(board, mv) {
                    Some(next) => write_subtree(
                        tree,
                        variation,
                        exporter,
                        include_comments,
                        include_variations,
                        &next,
                        false,
                    ),
                    None => write_subtree(
                        tree,
                        variation,
                        exporter,
                        include_comments,
                        include_variations,
                        board,
                        false,
                    ),
                }
            }
            exporter.end_variation();
        }
    }

    // The mainline is continued last.
    if let Some(main) = current.mainline_child() {
        let had_variations = include_variations && current.children().len() > 1;
        if let Some(mv) = &tree.node(main).mv {
            match advance(board, mv) {
                Some(next) => write_subtree(
                    tree,
                    main,
                    exporter,
                    include_comments,
                    include_variations,
                    &next,
                    had_variations,
                ),
                None => write_subtree(
                    tree,
                    main,
                    exporter,
                    include_comments,
                    include_variations,
                    board,
                    had_variations,
                ),
            }
        }
    }
}

/// Board after `mv`, or `None` when it cannot be applied (placeholder nodes,
/// externally mutated trees).
fn advance(board: &Board, mv: &NodeMove) -> Option<Board> {
    match mv {
        NodeMove::Resolved { mv, .. } => san::try_apply(board, *mv),
        NodeMove::Unresolved { .. } => None,
    }
}

/// Re-derive a node's move token against `board`. Returns the token and the
/// fingerprint after the move; a move that no longer applies yields the error
/// sentinel and leaves the fingerprint where it was.
pub(crate) fn apply_for_export(board: &Board, mv: &NodeMove) -> (String, String) {
    match mv {
        NodeMove::Resolved { mv, .. } => match san::try_apply(board, *mv) {
            Some(next) => (san::format_san(board, *mv), fen::format_fen(&next)),
            None => {
                tracing::warn!(
                    "move {}{} does not apply at {}",
                    format_square(mv.from),
                    format_square(mv.to),
                    fen::format_fen(board)
                );
                (
                    format!("X{}{}", format_square(mv.from), format_square(mv.to)),
                    fen::format_fen(board),
                )
            }
        },
        NodeMove::Unresolved { raw } => (format!("X{raw}"), fen::format_fen(board)),
    }
}

/// Line buffer with an optional column budget. A token that would overflow
/// the budget flushes the current line (trailing whitespace trimmed) first.
pub(crate) struct LineWriter {
    lines: Vec<String>,
    current: String,
    columns: Option<usize>,
}

impl LineWriter {
    pub(crate) fn new(columns: Option<usize>) -> Self {
        Self {
            lines: Vec::new(),
            current: String::new(),
            columns,
        }
    }

    pub(crate) fn write_token(&mut self, token: &str) {
        if let Some(columns) = self.columns {
            if columns.saturating_sub(self.current.len()) < token.len() {
                self.flush_current_line();
            }
        }
        self.current.push_str(token);
    }

    pub(crate) fn write_line(&mut self, line: &str) {
        self.flush_current_line();
        self.lines.push(line.trim_end().to_string());
    }

    fn flush_current_line(&mut self) {
        if !self.current.is_empty() {
            let line = self.current.trim_end().to_string();
            self.lines.push(line);
            self.current.clear();
        }
    }

    pub(crate) fn finish(&mut self) -> String {
        self.flush_current_line();
        let joined = self.lines.join("\n");
        self.lines.clear();
        joined.trim_end().to_string()
    }
}

const SEVEN_TAG_ROSTER: [&str; 7] = ["Event", "Site", "Date", "Round", "White", "Black", "Result"];

/// Header tags with the original system's defaults filled in, Seven Tag
/// Roster first, remaining tags in sorted order.
fn ordered_headers(tree: &GameTree) -> Vec<(String, String)> {
    let defaults: [(&str, &str); 10] = [
        ("Event", "?"),
        ("Site", "?"),
        ("Date", "?"),
        ("Round", "?"),
        ("White", "*"),
        ("Black", "*"),
        ("Result", "*"),
        ("WhiteElo", "-"),
        ("BlackElo", "-"),
        ("Time", "00:00:00"),
    ];

    let mut merged: std::collections::HashMap<String, String> = defaults
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    for (name, value) in &tree.headers {
        merged.insert(name.clone(), value.clone());
    }
    merged.insert("Result".to_string(), tree.result.as_str().to_string());

    let mut ordered = Vec::with_capacity(merged.len());
    for name in SEVEN_TAG_ROSTER {
        if let Some(value) = merged.remove(name) {
            ordered.push((name.to_string(), value));
        }
    }
    let mut rest: Vec<_> = merged.into_iter().collect();
    rest.sort();
    ordered.extend(rest);
    ordered
}
