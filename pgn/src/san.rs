//! Standard Algebraic Notation (SAN) generation and resolution.
//!
//! The rules engine knows nothing about SAN, so both directions live here:
//! [`format_san`] renders a legal move against its board, and [`resolve_san`]
//! matches possibly-sloppy move text (abbreviated SAN, long algebraic, UCI
//! coordinates, either castling spelling) back to a legal move.

use cozy_chess::{Board, Move, Piece, Square};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::uci::{
    convert_uci_castling_to_cozy, file_char, file_from_char, format_uci_move, piece_from_char,
    rank_char, rank_from_char,
};

/// Collect all legal moves for the given position.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

/// Board after `mv`, or `None` when `mv` is not legal on `board`.
pub fn try_apply(board: &Board, mv: Move) -> Option<Board> {
    if !legal_moves(board).contains(&mv) {
        return None;
    }
    let mut next = board.clone();
    next.play_unchecked(mv);
    Some(next)
}

/// Format a move as SAN.
///
/// `mv` must be legal on `board`; a move that is not falls back to bare
/// coordinates so that callers rendering untrusted trees never panic.
pub fn format_san(board: &Board, mv: Move) -> String {
    let piece = match board.piece_on(mv.from) {
        Some(p) => p,
        None => return format_uci_move(mv),
    };
    let stm = board.side_to_move();
    let mut san = String::new();

    // The engine encodes castling as king-takes-own-rook.
    let castling = piece == Piece::King && board.color_on(mv.to) == Some(stm);
    if castling {
        if (mv.to.file() as usize) > (mv.from.file() as usize) {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else {
        let capture = board.color_on(mv.to).is_some_and(|c| c != stm)
            || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

        match piece {
            Piece::Pawn => {
                if capture {
                    san.push(file_char(mv.from.file()));
                }
            }
            Piece::Knight => san.push('N'),
            Piece::Bishop => san.push('B'),
            Piece::Rook => san.push('R'),
            Piece::Queen => san.push('Q'),
            Piece::King => san.push('K'),
        }

        if !matches!(piece, Piece::Pawn | Piece::King) {
            san.push_str(&disambiguation(board, mv, piece));
        }

        if capture {
            san.push('x');
        }
        san.push(file_char(mv.to.file()));
        san.push(rank_char(mv.to.rank()));

        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(match promo {
                Piece::Queen => 'Q',
                Piece::Rook => 'R',
                Piece::Bishop => 'B',
                Piece::Knight => 'N',
                _ => '?',
            });
        }
    }

    if let Some(after) = try_apply(board, mv) {
        if !after.checkers().is_empty() {
            // generate_moves returns whether the listener short-circuited,
            // i.e. whether any legal reply exists
            let has_reply = after.generate_moves(|_| true);
            san.push(if has_reply { '+' } else { '#' });
        }
    }

    san
}

/// Departure-square qualifier when another piece of the same kind could also
/// reach the destination.
fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let mut rivals: Vec<Square> = Vec::new();
    for other in legal_moves(board) {
        if other.to == mv.to && other.from != mv.from && board.piece_on(other.from) == Some(piece) {
            rivals.push(other.from);
        }
    }
    if rivals.is_empty() {
        return String::new();
    }

    let file_taken = rivals.iter().any(|s| s.file() == mv.from.file());
    let rank_taken = rivals.iter().any(|s| s.rank() == mv.from.rank());
    let mut out = String::new();
    if !file_taken {
        out.push(file_char(mv.from.file()));
    } else if !rank_taken {
        out.push(rank_char(mv.from.rank()));
    } else {
        out.push(file_char(mv.from.file()));
        out.push(rank_char(mv.from.rank()));
    }
    out
}

static SLOPPY_MOVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([NBKRQ])?([a-h])?([1-8])?[-x]?([a-h])([1-8])(?:=?([nbrqNBRQ]))?$")
        .expect("sloppy move pattern")
});

/// Parse Standard Algebraic Notation (SAN) move
///
/// Matching is permissive: check/mate/glyph suffixes are ignored, `0-0`
/// spellings are accepted, and long-algebraic or UCI coordinate forms resolve
/// as long as they name exactly one legal move.
pub fn resolve_san(board: &Board, text: &str) -> Result<Move, SanError> {
    let stripped = text.trim_end_matches(['+', '#', '!', '?']);
    let normalized = match stripped {
        "0-0" => "O-O",
        "0-0-0" => "O-O-O",
        other => other,
    };
    if normalized.is_empty() {
        return Err(SanError::InvalidFormat(text.to_string()));
    }

    let legal = legal_moves(board);

    // Exact SAN, suffixes aside, wins outright.
    for &mv in &legal {
        let san = format_san(board, mv);
        if san.trim_end_matches(['+', '#']) == normalized {
            return Ok(mv);
        }
    }

    let caps = match SLOPPY_MOVE.captures(normalized) {
        Some(caps) => caps,
        None => return Err(SanError::NoLegalMove(text.to_string())),
    };
    let piece_hint = caps.get(1).and_then(|m| piece_from_char(char_of(m.as_str())));
    let from_file = caps.get(2).and_then(|m| file_from_char(char_of(m.as_str())));
    let from_rank = caps.get(3).and_then(|m| rank_from_char(char_of(m.as_str())));
    let to_file = file_from_char(char_of(&caps[4])).ok_or_else(|| invalid_square(&caps))?;
    let to_rank = rank_from_char(char_of(&caps[5])).ok_or_else(|| invalid_square(&caps))?;
    let to = Square::new(to_file, to_rank);
    let promotion = caps.get(6).and_then(|m| piece_from_char(char_of(m.as_str())));

    // A full from-square with no piece letter is a coordinate move; castling
    // needs translation into the engine's king-takes-rook encoding.
    if piece_hint.is_none() {
        if let (Some(f), Some(r)) = (from_file, from_rank) {
            let candidate = convert_uci_castling_to_cozy(
                Move {
                    from: Square::new(f, r),
                    to,
                    promotion,
                },
                &legal,
            );
            if legal.contains(&candidate) {
                return Ok(candidate);
            }
        }
    }

    let mut candidates = legal.iter().copied().filter(|m| {
        m.to == to
            && m.promotion == promotion
            && match piece_hint {
                Some(p) => board.piece_on(m.from) == Some(p),
                None => board.piece_on(m.from) == Some(Piece::Pawn),
            }
            && from_file.map_or(true, |f| m.from.file() == f)
            && from_rank.map_or(true, |r| m.from.rank() == r)
    });

    match (candidates.next(), candidates.next()) {
        (Some(mv), None) => Ok(mv),
        (Some(_), Some(_)) => Err(SanError::AmbiguousMove(text.to_string())),
        (None, _) => Err(SanError::NoLegalMove(text.to_string())),
    }
}

fn char_of(s: &str) -> char {
    s.chars().next().unwrap_or('\0')
}

fn invalid_square(caps: &regex::Captures<'_>) -> SanError {
    SanError::InvalidSquare(format!("{}{}", &caps[4], &caps[5]))
}

#[derive(Debug, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;

    fn resolve(fen: &str, text: &str) -> Result<Move, SanError> {
        resolve_san(&parse_fen(fen).unwrap(), text)
    }

    fn san_of(fen: &str, text: &str) -> String {
        let board = parse_fen(fen).unwrap();
        let mv = resolve_san(&board, text).unwrap();
        format_san(&board, mv)
    }

    #[test]
    fn test_simple_pawn_and_piece_moves() {
        let board = Board::default();
        let e4 = resolve_san(&board, "e4").unwrap();
        assert_eq!(format_san(&board, e4), "e4");
        let nf3 = resolve_san(&board, "Nf3").unwrap();
        assert_eq!(format_san(&board, nf3), "Nf3");
    }

    #[test]
    fn test_uci_and_long_algebraic_forms() {
        let board = Board::default();
        assert_eq!(
            resolve_san(&board, "e2e4").unwrap(),
            resolve_san(&board, "e4").unwrap()
        );
        assert_eq!(
            resolve_san(&board, "Ng1f3").unwrap(),
            resolve_san(&board, "Nf3").unwrap()
        );
        assert_eq!(
            resolve_san(&board, "e2-e4").unwrap(),
            resolve_san(&board, "e4").unwrap()
        );
    }

    #[test]
    fn test_castling_both_spellings() {
        // White ready to castle either side
        let fen = "r3k2r/pppqppbp/2npbnp1/8/8/2NPBNP1/PPPQPPBP/R3K2R w KQkq - 0 1";
        let mv = resolve(fen, "O-O").unwrap();
        assert_eq!(san_of(fen, "O-O"), "O-O");
        assert_eq!(resolve(fen, "0-0").unwrap(), mv);
        // UCI king-two-squares spelling resolves to the same move
        assert_eq!(resolve(fen, "e1g1").unwrap(), mv);
        assert_eq!(san_of(fen, "O-O-O"), "O-O-O");
    }

    #[test]
    fn test_capture_and_en_passant_file_prefix() {
        let fen = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        assert_eq!(san_of(fen, "exd5"), "exd5");
        // en passant is a capture to an empty square; the file prefix stays
        let ep = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        assert_eq!(san_of(ep, "exf6"), "exf6");
    }

    #[test]
    fn test_disambiguation_by_file_rank_and_both() {
        // Knights on b1 and f3 can both reach the empty d2 square
        let two_knights = "rnbqkbnr/pppppppp/8/8/8/5N2/PPP1PPPP/RNBQKB1R w KQkq - 0 1";
        assert_eq!(san_of(two_knights, "Nbd2"), "Nbd2");
        assert_eq!(san_of(two_knights, "Nfd2"), "Nfd2");
        // Rooks doubled on a file disambiguate by rank
        let rooks = "4k3/8/8/R7/8/R7/8/4K3 w - - 0 1";
        assert_eq!(san_of(rooks, "R5a4"), "R5a4");
        assert_eq!(san_of(rooks, "R3a4"), "R3a4");
        // Three queens reaching the same square need file and rank
        let queens = "7k/8/8/8/4Q2Q/8/8/K6Q w - - 0 1";
        assert_eq!(san_of(queens, "Qh4e1"), "Qh4e1");
        assert!(matches!(
            resolve(queens, "Qe1"),
            Err(SanError::AmbiguousMove(_))
        ));
    }

    #[test]
    fn test_promotion_with_and_without_equals() {
        let fen = "8/4P3/8/8/8/2k5/8/4K3 w - - 0 1";
        let mv = resolve(fen, "e8=Q").unwrap();
        assert_eq!(mv.promotion, Some(Piece::Queen));
        assert_eq!(resolve(fen, "e8Q").unwrap(), mv);
        assert_eq!(resolve(fen, "e7e8q").unwrap(), mv);
        assert_eq!(san_of(fen, "e8=N"), "e8=N");
        // a promotion must spell out its piece
        assert!(matches!(resolve(fen, "e8"), Err(SanError::NoLegalMove(_))));
    }

    #[test]
    fn test_check_and_mate_suffixes() {
        let check = "4k3/8/8/8/8/8/8/R3K3 w - - 0 1";
        assert_eq!(san_of(check, "Ra8"), "Ra8+");
        // Suffixes on the input are tolerated
        assert!(resolve(check, "Ra8+").is_ok());
        let mate = "6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1";
        assert_eq!(san_of(mate, "Ra8"), "Ra8#");
    }

    #[test]
    fn test_unresolvable_moves() {
        let board = Board::default();
        assert!(matches!(
            resolve_san(&board, "Nd5"),
            Err(SanError::NoLegalMove(_))
        ));
        assert!(matches!(
            resolve_san(&board, "--"),
            Err(SanError::NoLegalMove(_))
        ));
        assert!(matches!(
            resolve_san(&board, "O-O"),
            Err(SanError::NoLegalMove(_))
        ));
    }
}
