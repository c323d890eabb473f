//! Full move legality
//!
//! Combines piece geometry, occupancy and a check-safety test played out
//! on a scratch copy of the board. Every function here is a total query:
//! it never mutates the board or the game state it is given.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Piece, PieceId, PieceKind, Square};
use crate::game::GameState;

use super::{check, geometry, special};

/// A legal move for one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub piece: PieceId,
    pub kind: PieceKind,
    pub from: Square,
    pub to: Square,
    pub capture: bool,
}

pub fn is_legal(board: &Board, state: &GameState, piece: &Piece, target: Square) -> bool {
    if piece.color != state.turn {
        return false;
    }
    // stale piece handles never match the board
    if board.get(piece.square).map(|p| p.id) != Some(piece.id) || piece.square == target {
        return false;
    }
    if let Some(occupant) = board.get(target) {
        if occupant.color == piece.color || occupant.kind == PieceKind::King {
            return false;
        }
    }

    if special::castle_side(piece, target).is_some() {
        return special::can_castle(board, state, piece, target);
    }

    if !geometry::is_geometric_move(board, piece, target, state.en_passant_target) {
        return false;
    }

    !leaves_king_in_check(board, piece, target, state.en_passant_target)
}

/// Plays the move on a throwaway copy and asks whether the mover's king
/// is attacked afterwards.
fn leaves_king_in_check(
    board: &Board,
    piece: &Piece,
    target: Square,
    en_passant_target: Option<Square>,
) -> bool {
    let mut scratch = board.clone();
    if let Some(victim) = special::en_passant_victim(board, piece, target, en_passant_target) {
        scratch.remove(victim);
    }
    scratch.move_piece(piece.square, target);
    check::is_in_check(&scratch, piece.color)
}

/// Every legal move for `color`. Empty whenever it is not `color`'s turn.
///
/// Tries every piece against every square; fine at board scale but not
/// something to call on every rendered frame.
pub fn get_all_legal_moves(board: &Board, state: &GameState, color: Color) -> Vec<Move> {
    let mut moves = Vec::new();
    for piece in board.pieces_of(color) {
        for target in Square::all() {
            if is_legal(board, state, piece, target) {
                moves.push(Move {
                    piece: piece.id,
                    kind: piece.kind,
                    from: piece.square,
                    to: target,
                    capture: board.get(target).is_some()
                        || special::en_passant_victim(board, piece, target, state.en_passant_target)
                            .is_some(),
                });
            }
        }
    }
    moves
}

/// Legal destinations of whatever stands on `from`, for highlighting.
pub fn legal_destinations(board: &Board, state: &GameState, from: Square) -> Vec<Square> {
    match board.get(from) {
        Some(piece) => Square::all()
            .filter(|target| is_legal(board, state, piece, *target))
            .collect(),
        None => Vec::new(),
    }
}
