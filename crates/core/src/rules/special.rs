//! Castling, en passant and promotion

use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Piece, PieceId, PieceKind, Square};
use crate::game::GameState;

use super::check;

const KING_FILE: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastleSide {
    KingSide,
    QueenSide,
}

impl CastleSide {
    fn rook_file(self) -> u8 {
        match self {
            CastleSide::KingSide => 7,
            CastleSide::QueenSide => 0,
        }
    }

    fn direction(self) -> i8 {
        match self {
            CastleSide::KingSide => 1,
            CastleSide::QueenSide => -1,
        }
    }

    pub fn notation(self) -> &'static str {
        match self {
            CastleSide::KingSide => "O-O",
            CastleSide::QueenSide => "O-O-O",
        }
    }

    /// Rook start and destination squares for `color`.
    pub fn rook_squares(self, color: Color) -> Option<(Square, Square)> {
        let rank = color.back_rank();
        let from = Square::new(self.rook_file(), rank)?;
        let to = Square::new((KING_FILE as i8 + self.direction()) as u8, rank)?;
        Some((from, to))
    }
}

/// The castling side a two-file king step on its own rank asks for.
pub fn castle_side(king: &Piece, target: Square) -> Option<CastleSide> {
    if king.kind != PieceKind::King {
        return None;
    }
    match king.square.delta_to(target) {
        (2, 0) => Some(CastleSide::KingSide),
        (-2, 0) => Some(CastleSide::QueenSide),
        _ => None,
    }
}

fn home_square(color: Color) -> Option<Square> {
    Square::new(KING_FILE, color.back_rank())
}

/// The unmoved rook `side` castling needs, if it is still there.
fn castling_rook(board: &Board, color: Color, side: CastleSide) -> Option<&Piece> {
    let (rook_square, _) = side.rook_squares(color)?;
    board.get(rook_square).filter(|rook| {
        rook.kind == PieceKind::Rook && rook.color == color && !rook.has_moved
    })
}

fn king_is_home(board: &Board, color: Color) -> bool {
    board.find_king(color).map_or(false, |king| {
        !king.has_moved && Some(king.square) == home_square(color)
    })
}

/// Full castling eligibility for `king` moving to `target`.
///
/// Attacked squares are tested on scratch copies of the board; the
/// authoritative board is never touched.
pub fn can_castle(board: &Board, state: &GameState, king: &Piece, target: Square) -> bool {
    let Some(side) = castle_side(king, target) else {
        return false;
    };
    let color = king.color;

    if state.turn != color || king.has_moved || Some(king.square) != home_square(color) {
        return false;
    }
    if check::is_in_check(board, color) {
        return false;
    }
    let Some(rook) = castling_rook(board, color, side) else {
        return false;
    };

    let distance = king.square.delta_to(rook.square).0.abs();
    let path_clear = (1..distance).all(|i| {
        king.square
            .offset(side.direction() * i, 0)
            .map_or(false, |square| board.is_empty(square))
    });
    if !path_clear {
        return false;
    }

    (1..=2).all(|i| {
        let Some(step) = king.square.offset(side.direction() * i, 0) else {
            return false;
        };
        let mut scratch = board.clone();
        scratch.move_piece(king.square, step);
        !check::is_in_check(&scratch, color)
    })
}

/// Moves king and rook for a castling move already judged legal.
pub(crate) fn execute_castling(board: &mut Board, king_square: Square, side: CastleSide) -> bool {
    let Some(color) = board.color_at(king_square) else {
        return false;
    };
    let (Some((rook_from, rook_to)), Some(king_to)) = (
        side.rook_squares(color),
        king_square.offset(2 * side.direction(), 0),
    ) else {
        return false;
    };

    board.move_piece(king_square, king_to);
    board.move_piece(rook_from, rook_to);
    true
}

/// Square of the pawn an en passant capture would remove.
///
/// The victim stands on the target's file and the capturing pawn's rank.
pub fn en_passant_victim(
    board: &Board,
    pawn: &Piece,
    target: Square,
    en_passant_target: Option<Square>,
) -> Option<Square> {
    if pawn.kind != PieceKind::Pawn
        || en_passant_target != Some(target)
        || pawn.square.file() == target.file()
        || !board.is_empty(target)
    {
        return None;
    }
    let victim = Square::new(target.file(), pawn.square.rank())?;
    board
        .get(victim)
        .filter(|p| p.kind == PieceKind::Pawn && p.color != pawn.color)
        .map(|p| p.square)
}

/// The square behind a pawn that advanced two squares from its home rank.
pub fn double_push_target(pawn: &Piece, to: Square) -> Option<Square> {
    if pawn.kind != PieceKind::Pawn || pawn.square.rank() != pawn.color.pawn_rank() {
        return None;
    }
    let direction = pawn.color.pawn_direction();
    if pawn.square.delta_to(to) != (0, 2 * direction) {
        return None;
    }
    pawn.square.offset(0, direction)
}

/// A pawn arriving on the opponent's back rank promotes.
pub fn is_promotion_square(pawn: &Piece, to: Square) -> bool {
    pawn.kind == PieceKind::Pawn && to.rank() == pawn.color.opposite().back_rank()
}

/// Replaces the pawn on `square` with a fresh queen of the same color.
pub(crate) fn promote(board: &mut Board, square: Square) -> Option<PieceId> {
    let pawn = board.remove(square)?;
    let id = board.place(PieceKind::Queen, pawn.color, square);
    board.set_has_moved(square, true);
    Some(id)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl CastlingRights {
    pub fn get(&self, color: Color, side: CastleSide) -> bool {
        match (color, side) {
            (Color::White, CastleSide::KingSide) => self.white_king_side,
            (Color::White, CastleSide::QueenSide) => self.white_queen_side,
            (Color::Black, CastleSide::KingSide) => self.black_king_side,
            (Color::Black, CastleSide::QueenSide) => self.black_queen_side,
        }
    }

    pub fn none(&self) -> bool {
        *self == CastlingRights::default()
    }
}

/// Rights derived from the king's and the specific rook's move history.
pub fn castling_rights(board: &Board) -> CastlingRights {
    let right = |color: Color, side: CastleSide| {
        king_is_home(board, color) && castling_rook(board, color, side).is_some()
    };
    CastlingRights {
        white_king_side: right(Color::White, CastleSide::KingSide),
        white_queen_side: right(Color::White, CastleSide::QueenSide),
        black_king_side: right(Color::Black, CastleSide::KingSide),
        black_queen_side: right(Color::Black, CastleSide::QueenSide),
    }
}
