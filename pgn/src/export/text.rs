//! Plain-text PGN exporter.

use cozy_chess::{Board, Color};

use super::{apply_for_export, Exporter, LineWriter};
use crate::tree::NodeMove;

/// Emits canonical PGN text, optionally wrapped at a column budget.
pub struct TextExporter {
    w: LineWriter,
}

impl TextExporter {
    pub fn new(columns: Option<usize>) -> Self {
        Self {
            w: LineWriter::new(columns),
        }
    }
}

impl Exporter for TextExporter {
    fn end_game(&mut self) {
        self.w.write_line("");
    }

    fn put_header(&mut self, name: &str, value: &str) {
        self.w.write_line(&format!("[{name} \"{value}\"]"));
    }

    fn end_headers(&mut self) {
        self.w.write_line("");
    }

    fn start_variation(&mut self) {
        self.w.write_token("( ");
    }

    fn end_variation(&mut self) {
        self.w.write_token(") ");
    }

    fn put_comment(&mut self, comment: &str) {
        // A brace inside the text would end the comment early
        let safe = comment.replace('}', "");
        self.w.write_token(&format!("{{ {} }} ", safe.trim()));
    }

    fn put_nag(&mut self, nag: u8) {
        self.w.write_token(&format!("${nag} "));
    }

    fn put_fullmove_number(&mut self, turn: Color, fullmove_number: u32, variation_start: bool) {
        if turn == Color::White {
            self.w.write_token(&format!("{fullmove_number}. "));
        } else if variation_start {
            self.w.write_token(&format!("{fullmove_number}... "));
        }
    }

    fn put_move(&mut self, board: &Board, mv: &NodeMove) {
        let (token, _) = apply_for_export(board, mv);
        self.w.write_token(&format!("{token} "));
    }

    fn put_result(&mut self, result: &str) {
        self.w.write_token(&format!("{result} "));
    }

    fn finish(&mut self) -> String {
        self.w.finish()
    }
}
