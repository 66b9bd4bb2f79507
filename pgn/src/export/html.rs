//! Annotated markup exporter for the web game view.
//!
//! Every move becomes a span carrying the resulting board fingerprint, so a
//! click on the rendered move can jump straight to its position. Header tags
//! are not emitted; the view renders those separately.

use cozy_chess::{Board, Color};

use super::{apply_for_export, Exporter, LineWriter};
use crate::fen::strip_fen;
use crate::nag;
use crate::tree::NodeMove;

/// Emits the move tree as HTML fragments with position anchors, glyph NAGs,
/// and figurine piece letters.
pub struct HtmlExporter {
    w: LineWriter,
}

impl HtmlExporter {
    pub fn new(columns: Option<usize>) -> Self {
        Self {
            w: LineWriter::new(columns),
        }
    }
}

impl Exporter for HtmlExporter {
    fn end_game(&mut self) {
        self.w.write_line("");
    }

    fn start_variation(&mut self) {
        self.w.write_token("<span class=\"gameVariation\"> [ ");
    }

    fn end_variation(&mut self) {
        self.w.write_token(" ] </span>");
    }

    fn put_comment(&mut self, comment: &str) {
        self.w.write_token(&format!(
            "<span class=\"gameComment\"><a href=\"#\" class=\"comment\"> {comment} </a></span>"
        ));
    }

    fn put_nag(&mut self, nag: u8) {
        match nag::glyph(nag) {
            Some(glyph) => self.w.write_token(&format!(" {glyph} ")),
            None => self.w.write_token(&format!("${nag} ")),
        }
    }

    fn put_fullmove_number(&mut self, turn: Color, fullmove_number: u32, variation_start: bool) {
        if turn == Color::White {
            self.w.write_token(&format!("{fullmove_number}. "));
        } else if variation_start {
            self.w.write_token(&format!("{fullmove_number}... "));
        }
    }

    fn put_move(&mut self, board: &Board, mv: &NodeMove) {
        let (token, after_fen) = apply_for_export(board, mv);
        self.w.write_token(&format!(
            "<span class=\"gameMove{}\"><a href=\"#\" class=\"fen\" data-fen=\"{}\" id=\"{}\"> {} </a></span>",
            board.fullmove_number(),
            after_fen,
            strip_fen(&after_fen),
            figurine(&token),
        ));
    }

    fn put_result(&mut self, result: &str) {
        self.w.write_token(&format!("{result} "));
    }

    fn finish(&mut self) -> String {
        self.w.finish()
    }
}

/// Substitute piece letters with figurine entities; `X` is the error-move
/// marker and renders as a warning sign.
fn figurine(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for c in token.chars() {
        match c {
            'N' => out.push_str("&#9816;"),
            'B' => out.push_str("&#9815;"),
            'R' => out.push_str("&#9814;"),
            'K' => out.push_str("&#9812;"),
            'Q' => out.push_str("&#9813;"),
            'X' => out.push_str("&#9888;"),
            _ => out.push(c),
        }
    }
    out
}
