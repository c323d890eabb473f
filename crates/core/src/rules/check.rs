//! Check detection
//!
//! Uses raw attack geometry only. Nothing here consults the move
//! validator, so a check test can never recurse into another check test.

use crate::board::{Board, Color, Square};

use super::geometry;

/// Whether any piece of `attacker` threatens `square`.
pub fn is_square_attacked(board: &Board, square: Square, attacker: Color) -> bool {
    board
        .pieces_of(attacker)
        .any(|piece| geometry::attacks(board, piece, square))
}

/// Whether `color`'s king is currently attacked. A board without that
/// king is never in check.
pub fn is_in_check(board: &Board, color: Color) -> bool {
    match board.find_king(color) {
        Some(king) => is_square_attacked(board, king.square, color.opposite()),
        None => false,
    }
}
