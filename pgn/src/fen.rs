//! FEN parsing and formatting via the rules engine.

use cozy_chess::Board;

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string into a Board.
///
/// Standard castling-rights notation is tried first, then the Shredder-style
/// notation that Chess960 setups use.
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    if fen.split_whitespace().next().is_none() {
        return Err(FenError::InvalidFormat);
    }

    fen.parse()
        .or_else(|_| Board::from_fen(fen, true))
        .map_err(|_| FenError::InvalidFormat)
}

/// Format a Board as a FEN string.
pub fn format_fen(board: &Board) -> String {
    // cozy-chess renders the full FEN through Display
    board.to_string()
}

/// Collapse a FEN into an anchor-friendly form by dropping the rank separators.
pub fn strip_fen(fen: &str) -> String {
    fen.replace('/', "")
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format")]
    InvalidFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_position() {
        let board = parse_fen(START_FEN).unwrap();
        assert_eq!(format_fen(&board), START_FEN);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_fen("").is_err());
        assert!(parse_fen("not a fen").is_err());
        assert!(parse_fen("8/8/8/8 w - - 0 1").is_err());
    }

    #[test]
    fn test_round_trip_custom_position() {
        let fen = "4k3/3r4/5N2/8/8/8/8/4K3 b - - 0 1";
        let board = parse_fen(fen).unwrap();
        assert_eq!(format_fen(&board), fen);
    }

    #[test]
    fn test_strip_fen() {
        assert_eq!(
            strip_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            "rnbqkbnrpppppppp8888PPPPPPPPRNBQKBNR w KQkq - 0 1"
        );
    }
}
