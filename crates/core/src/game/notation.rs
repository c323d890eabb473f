//! Algebraic-style move notation
//!
//! Piece letter (none for pawns), `x` for captures (pawns prefix their
//! origin file), destination, then ` e.p.`, `=Q`, `+` or `#` as they apply.
//! No disambiguation between identical pieces is attempted.

use serde::Serialize;

use crate::board::{Color, PieceKind};

use super::MoveRecord;

pub fn describe(record: &MoveRecord) -> String {
    let mut text = String::new();

    if record.flags.castling {
        text.push_str(if record.to.file() > record.from.file() {
            "O-O"
        } else {
            "O-O-O"
        });
    } else {
        if record.kind != PieceKind::Pawn {
            text.push(record.kind.letter());
        }
        if record.is_capture() {
            if record.kind == PieceKind::Pawn {
                text.push(record.from.file_char());
            }
            text.push('x');
        }
        text.push_str(&record.to.to_string());
        if record.flags.en_passant {
            text.push_str(" e.p.");
        }
        if record.flags.promotion {
            text.push_str("=Q");
        }
    }

    if record.checkmate {
        text.push('#');
    } else if record.check {
        text.push('+');
    }
    text
}

/// One numbered line of the move list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRow {
    pub number: u32,
    pub white: Option<String>,
    pub black: Option<String>,
}

/// Groups history into numbered rows, white and black side by side.
pub fn move_rows(history: &[MoveRecord]) -> Vec<MoveRow> {
    let mut rows: Vec<MoveRow> = Vec::new();
    for record in history {
        let number = record.fullmove_number();
        let needs_row = rows.last().map_or(true, |row| row.number != number);
        if needs_row {
            rows.push(MoveRow {
                number,
                white: None,
                black: None,
            });
        }
        if let Some(row) = rows.last_mut() {
            match record.color {
                Color::White => row.white = Some(record.notation.clone()),
                Color::Black => row.black = Some(record.notation.clone()),
            }
        }
    }
    rows
}

/// Single-line movetext, e.g. `1. e4 e5 2. Nf3`.
pub fn movetext(history: &[MoveRecord]) -> String {
    let mut parts = Vec::new();
    for row in move_rows(history) {
        match (row.white, row.black) {
            (Some(white), Some(black)) => parts.push(format!("{}. {} {}", row.number, white, black)),
            (Some(white), None) => parts.push(format!("{}. {}", row.number, white)),
            (None, Some(black)) => parts.push(format!("{}... {}", row.number, black)),
            (None, None) => {}
        }
    }
    parts.join(" ")
}
