//! Movement shapes for each piece kind
//!
//! Pure functions over square deltas. `dx` is the file delta and `dz` the
//! rank delta, neither flipped for color; pawn direction comes from
//! [`Color::pawn_direction`].

use crate::board::{Board, Color, Piece, PieceKind, Square};

pub fn is_knight_shape(dx: i8, dz: i8) -> bool {
    matches!((dx.abs(), dz.abs()), (2, 1) | (1, 2))
}

pub fn is_bishop_shape(dx: i8, dz: i8) -> bool {
    dx != 0 && dx.abs() == dz.abs()
}

pub fn is_rook_shape(dx: i8, dz: i8) -> bool {
    (dx == 0) != (dz == 0)
}

pub fn is_queen_shape(dx: i8, dz: i8) -> bool {
    is_bishop_shape(dx, dz) || is_rook_shape(dx, dz)
}

pub fn is_king_shape(dx: i8, dz: i8) -> bool {
    dx.abs() <= 1 && dz.abs() <= 1 && (dx, dz) != (0, 0)
}

/// Diagonal one step forward: the only squares a pawn threatens.
pub fn is_pawn_attack_shape(color: Color, dx: i8, dz: i8) -> bool {
    dx.abs() == 1 && dz == color.pawn_direction()
}

/// Every square strictly between `from` and `to` is empty.
///
/// Only meaningful for straight or diagonal lines.
pub fn is_path_clear(board: &Board, from: Square, to: Square) -> bool {
    let (dx, dz) = from.delta_to(to);
    let steps = dx.abs().max(dz.abs());
    if steps <= 1 {
        return true;
    }

    let (step_x, step_z) = (dx / steps, dz / steps);
    (1..steps).all(|i| {
        from.offset(step_x * i, step_z * i)
            .map_or(false, |square| board.is_empty(square))
    })
}

/// Forward pushes and captures for a pawn, including en passant onto the
/// active target square.
pub fn is_pawn_move(
    board: &Board,
    pawn: &Piece,
    to: Square,
    en_passant_target: Option<Square>,
) -> bool {
    let direction = pawn.color.pawn_direction();
    let (dx, dz) = pawn.square.delta_to(to);

    if dx == 0 {
        if dz == direction {
            return board.is_empty(to);
        }
        if dz == 2 * direction && pawn.square.rank() == pawn.color.pawn_rank() {
            let intermediate = pawn.square.offset(0, direction);
            return intermediate.map_or(false, |square| board.is_empty(square))
                && board.is_empty(to);
        }
        return false;
    }

    if is_pawn_attack_shape(pawn.color, dx, dz) {
        return match board.color_at(to) {
            Some(color) => color != pawn.color,
            None => en_passant_target == Some(to),
        };
    }

    false
}

/// Raw reachability for a non-pawn piece: shape plus path clearance.
fn is_piece_shape_move(board: &Board, piece: &Piece, to: Square) -> bool {
    let (dx, dz) = piece.square.delta_to(to);
    let shape = match piece.kind {
        PieceKind::Knight => is_knight_shape(dx, dz),
        PieceKind::Bishop => is_bishop_shape(dx, dz),
        PieceKind::Rook => is_rook_shape(dx, dz),
        PieceKind::Queen => is_queen_shape(dx, dz),
        PieceKind::King => is_king_shape(dx, dz),
        PieceKind::Pawn => return false,
    };
    shape && (!piece.kind.is_slider() || is_path_clear(board, piece.square, to))
}

/// Whether `piece` threatens `target`. Pawns threaten diagonally only.
pub fn attacks(board: &Board, piece: &Piece, target: Square) -> bool {
    match piece.kind {
        PieceKind::Pawn => {
            let (dx, dz) = piece.square.delta_to(target);
            is_pawn_attack_shape(piece.color, dx, dz)
        }
        _ => is_piece_shape_move(board, piece, target),
    }
}

/// Whether `piece` may travel to `to` by its own movement rule, ignoring
/// castling, friendly-fire and check safety.
pub fn is_geometric_move(
    board: &Board,
    piece: &Piece,
    to: Square,
    en_passant_target: Option<Square>,
) -> bool {
    match piece.kind {
        PieceKind::Pawn => is_pawn_move(board, piece, to, en_passant_target),
        _ => is_piece_shape_move(board, piece, to),
    }
}
