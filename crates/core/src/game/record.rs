//! Move history entries

use serde::{Deserialize, Serialize};

use crate::board::{Color, PieceKind, Square};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveFlags {
    pub castling: bool,
    pub en_passant: bool,
    pub promotion: bool,
}

/// One applied move. Castling is a single record for king and rook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// 1-based ply this move was played on.
    pub ply: u32,
    pub from: Square,
    pub to: Square,
    /// Kind of the moving piece before any promotion.
    pub kind: PieceKind,
    pub color: Color,
    pub captured: Option<PieceKind>,
    pub flags: MoveFlags,
    pub check: bool,
    pub checkmate: bool,
    pub notation: String,
}

impl MoveRecord {
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// Coordinate form used by the engine protocol, e.g. `e2e4`.
    pub fn uci(&self) -> String {
        format!("{}{}", self.from, self.to)
    }

    /// Fullmove number this ply belongs to.
    pub fn fullmove_number(&self) -> u32 {
        self.ply.div_ceil(2)
    }
}
