//! PGN ingestion and re-serialization.
//!
//! A tokenizer scans raw game text, a stack-driven builder folds the token
//! stream into a move-variation tree with a fingerprint index for O(1)
//! jump-to-position, and a pair of exporters walk the tree back into plain
//! PGN text or annotated HTML markup. Move legality and SAN live in
//! [`san`]/[`uci`] on top of the cozy-chess rules engine; nothing here
//! re-implements chess itself.

pub mod export;
pub mod fen;
pub mod index;
pub mod nag;
pub mod parser;
pub mod san;
pub mod session;
pub mod tokenizer;
pub mod tree;
pub mod uci;

pub use export::{export_game, Exporter, HtmlExporter, TextExporter};
pub use fen::{format_fen, parse_fen, strip_fen, FenError, START_FEN};
pub use index::PositionIndex;
pub use parser::{parse_game, Diagnostic, ParseError, ParseOptions, ParsedGame};
pub use san::{format_san, legal_moves, resolve_san, try_apply, SanError};
pub use session::{GameSession, SessionError};
pub use tokenizer::{tokens, Token};
pub use tree::{
    is_white_ply, GameNode, GameResult, GameTree, NodeId, NodeMove, Variant,
};
pub use uci::{convert_uci_castling_to_cozy, format_uci_move};
