//! PGN parsing: header scan plus a stack-driven fold of the body token
//! stream into a [`GameTree`] and its [`PositionIndex`].
//!
//! Malformed game text never aborts a parse. Move text that fails to resolve
//! becomes a placeholder node plus a [`Diagnostic`]; unbalanced parentheses
//! are tolerated; anything the tokenizer does not recognize is skipped.

use std::collections::HashMap;

use cozy_chess::Board;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::fen::{self, FenError, START_FEN};
use crate::index::PositionIndex;
use crate::nag;
use crate::san;
use crate::tokenizer::{self, Token};
use crate::tree::{GameResult, GameTree, NodeId, NodeMove, Variant};

static HEADER_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[([A-Za-z0-9_]+)\s+"(.*)"\]"#).expect("header tag pattern"));

/// One move token that failed to resolve against the rules engine.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// The raw move text.
    pub raw: String,
    /// Fingerprint of the board the text was tried against.
    pub fen: String,
    /// Byte offset of the token in the game body.
    pub offset: usize,
}

/// Caller-side inputs to a parse.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Starting position when the text carries no `FEN`/`SetUp` headers.
    pub initial_fen: Option<String>,
    /// Seed header tags; tags parsed from the text take precedence.
    pub headers: HashMap<String, String>,
    /// Ruleset when the text carries no `Variant` header.
    pub variant: Variant,
}

/// Everything a parse produces. Tree and index always replace each other as
/// a pair; diagnostics describe the places where the text lost information.
#[derive(Debug, Clone)]
pub struct ParsedGame {
    pub tree: GameTree,
    pub index: PositionIndex,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid starting position: {0}")]
    InvalidFen(#[from] FenError),
}

/// Parse one PGN game (headers and body) into a tree and position index.
pub fn parse_game(text: &str, options: &ParseOptions) -> Result<ParsedGame, ParseError> {
    let mut headers = options.headers.clone();
    let mut body = String::new();
    let mut in_headers = true;
    for line in text.lines() {
        if in_headers {
            if let Some(caps) = HEADER_TAG.captures(line) {
                headers.insert(caps[1].to_string(), caps[2].to_string());
                continue;
            }
            in_headers = false;
        }
        body.push_str(line);
        body.push('\n');
    }

    let variant = if headers.get("Variant").map(String::as_str) == Some("Chess960") {
        Variant::Chess960
    } else {
        options.variant
    };
    let setup_fen = if headers.contains_key("SetUp") {
        headers.get("FEN")
    } else {
        None
    };
    let starting_fen = setup_fen
        .or(options.initial_fen.as_ref())
        .map(String::as_str)
        .unwrap_or(START_FEN);
    let initial_board = fen::parse_fen(starting_fen)?;

    // The root fingerprint is the engine's own rendering, so that lookups by
    // generated fingerprints always agree with it.
    let mut tree = GameTree::new(fen::format_fen(&initial_board), variant);
    let mut index = PositionIndex::new(tree.root(), &tree.starting_fen);
    let mut diagnostics = Vec::new();

    // One entry per open nesting level; the top is the current line.
    let mut board_stack: Vec<Board> = vec![initial_board];
    let mut variation_stack: Vec<NodeId> = vec![tree.root()];
    // False right after a `(`, before the sideline's first move has landed.
    let mut in_variation = false;
    let mut starting_comment = String::new();

    for scanned in tokenizer::tokens(&body) {
        let top = variation_stack[variation_stack.len() - 1];
        match scanned.token {
            Token::PercentComment => {}
            Token::Result => {
                if let Some(result) = GameResult::from_token(scanned.text) {
                    tree.result = result;
                    headers.insert("Result".to_string(), scanned.text.to_string());
                }
            }
            Token::BraceComment => {
                let text = normalize_comment(scanned.text);
                if text.is_empty() {
                    continue;
                }
                if in_variation || tree.node(top).parent().is_none() {
                    // Trailing comment on the move just played (or on the
                    // root, for text before the first move).
                    let node = tree.node_mut(top);
                    node.comment = Some(match node.comment.take() {
                        Some(existing) => format!("{existing} {text}"),
                        None => text,
                    });
                } else {
                    // Between a move and the sideline it introduces: staged
                    // as the sideline's starting comment.
                    if starting_comment.is_empty() {
                        starting_comment = text;
                    } else {
                        starting_comment = format!("{starting_comment} {text}");
                    }
                }
            }
            Token::OpenParen => {
                // A sideline branches from the parent of the current node;
                // at the root there is nothing to branch from.
                if let Some(parent) = tree.node(top).parent() {
                    if let Ok(board) = fen::parse_fen(&tree.node(parent).fen) {
                        variation_stack.push(parent);
                        board_stack.push(board);
                        in_variation = false;
                    }
                }
            }
            Token::CloseParen => {
                if variation_stack.len() > 1 {
                    variation_stack.pop();
                    board_stack.pop();
                }
            }
            Token::Nag => {
                if let Ok(code) = scanned.text[1..].parse::<u8>() {
                    tree.node_mut(top).nags.push(code);
                }
            }
            Token::Glyph => {
                if let Some(code) = nag::from_glyph(scanned.text) {
                    tree.node_mut(top).nags.push(code);
                }
            }
            Token::MoveText => {
                let depth = board_stack.len() - 1;
                let node = match san::resolve_san(&board_stack[depth], scanned.text) {
                    Ok(mv) => {
                        let san = san::format_san(&board_stack[depth], mv);
                        board_stack[depth].play_unchecked(mv);
                        let after = fen::format_fen(&board_stack[depth]);
                        let node = tree.add_child(
                            top,
                            NodeMove::Resolved { mv, san },
                            after.clone(),
                            None,
                            take_nonempty(&mut starting_comment),
                        );
                        index.insert(after, node);
                        node
                    }
                    Err(err) => {
                        let at = fen::format_fen(&board_stack[depth]);
                        tracing::warn!("unresolved move {:?} at {}: {}", scanned.text, at, err);
                        diagnostics.push(Diagnostic {
                            raw: scanned.text.to_string(),
                            fen: at.clone(),
                            offset: scanned.span.start,
                        });
                        // Placeholder keeps the tree traversable; the board
                        // stays where it was.
                        let node = tree.add_child(
                            top,
                            NodeMove::Unresolved {
                                raw: scanned.text.to_string(),
                            },
                            at.clone(),
                            None,
                            take_nonempty(&mut starting_comment),
                        );
                        index.insert(at, node);
                        node
                    }
                };
                let depth = variation_stack.len() - 1;
                variation_stack[depth] = node;
                in_variation = true;
            }
        }
    }

    tree.headers = headers;
    index.set_last(tree.mainline_tip());

    Ok(ParsedGame {
        tree,
        index,
        diagnostics,
    })
}

/// Strip the braces and squash internal line breaks to single spaces.
fn normalize_comment(token: &str) -> String {
    let inner = token
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(token);
    inner
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn take_nonempty(text: &mut String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(std::mem::take(text))
    }
}
