//! Lexer for the body of a PGN game.
//!
//! Produces a lazy, restartable stream of classified tokens. Recognition is
//! longest-match over a fixed grammar; characters that match nothing (move
//! numbers, dots, stray punctuation) are skipped silently. No semantic
//! validation happens here; an illegal move is still `MoveText`.

use logos::{Logos, Span};

/// One recognized token class of the game-body grammar.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    /// `%`-escaped comment running to the end of the line.
    #[regex(r"%[^\n\r]*")]
    PercentComment,

    /// Brace-delimited comment; may span multiple lines.
    #[regex(r"\{[^}]*\}")]
    BraceComment,

    /// Numeric Annotation Glyph marker, e.g. `$14`.
    #[regex(r"\$[0-9]+")]
    Nag,

    /// Start of a sideline.
    #[token("(")]
    OpenParen,

    /// End of a sideline.
    #[token(")")]
    CloseParen,

    /// Game termination marker.
    #[regex(r"1-0|0-1|1/2-1/2|\*")]
    Result,

    /// SAN-shaped move text, castling in either spelling, or the null move.
    #[regex(r"[NBKRQ]?[a-h]?[1-8]?[-x]?[a-h][1-8](?:=?[nbrqNBRQ])?[+#]?|--|O-O(?:-O)?[+#]?|0-0(?:-0)?[+#]?")]
    MoveText,

    /// Suffix annotation attached after a move, e.g. `!?`.
    #[regex(r"[?!]{1,2}")]
    Glyph,
}

/// A token together with its source text and byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanned<'a> {
    pub token: Token,
    pub text: &'a str,
    pub span: Span,
}

/// Tokenize a game body. The returned iterator is lazy; calling this again
/// restarts the scan from the beginning of `body`.
pub fn tokens(body: &str) -> Tokens<'_> {
    Tokens {
        inner: Token::lexer(body),
    }
}

pub struct Tokens<'a> {
    inner: logos::Lexer<'a, Token>,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Scanned<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(result) = self.inner.next() {
            // unrecognized characters between tokens are dropped
            if let Ok(token) = result {
                return Some(Scanned {
                    token,
                    text: self.inner.slice(),
                    span: self.inner.span(),
                });
            }
        }
        None
    }
}
