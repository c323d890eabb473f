//! Square-indexed piece registry
//!
//! The board is plain data. Validators only ever read it; copies of it
//! serve as scratch boards for hypothetical moves.

mod piece;
mod square;

use std::fmt;

pub use piece::{Color, Piece, PieceId, PieceKind};
pub use square::Square;

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [Option<Piece>; 64],
    next_id: u8,
}

impl Board {
    pub fn empty() -> Self {
        Board {
            squares: [None; 64],
            next_id: 0,
        }
    }

    /// The standard starting position.
    pub fn standard() -> Self {
        let mut board = Board::empty();
        for color in [Color::White, Color::Black] {
            for (file, kind) in BACK_RANK.into_iter().enumerate() {
                if let Some(square) = Square::new(file as u8, color.back_rank()) {
                    board.place(kind, color, square);
                }
                if let Some(square) = Square::new(file as u8, color.pawn_rank()) {
                    board.place(PieceKind::Pawn, color, square);
                }
            }
        }
        board
    }

    pub fn get(&self, square: Square) -> Option<&Piece> {
        self.squares[square.index()].as_ref()
    }

    pub fn is_empty(&self, square: Square) -> bool {
        self.squares[square.index()].is_none()
    }

    pub fn color_at(&self, square: Square) -> Option<Color> {
        self.get(square).map(|piece| piece.color)
    }

    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.squares.iter().flatten()
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = &Piece> {
        self.pieces().filter(move |piece| piece.color == color)
    }

    pub fn find_king(&self, color: Color) -> Option<&Piece> {
        self.pieces_of(color)
            .find(|piece| piece.kind == PieceKind::King)
    }

    pub fn find_by_id(&self, id: PieceId) -> Option<&Piece> {
        self.pieces().find(|piece| piece.id == id)
    }

    /// Puts a fresh piece on `square`, replacing whatever stood there.
    pub fn place(&mut self, kind: PieceKind, color: Color, square: Square) -> PieceId {
        let id = PieceId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.squares[square.index()] = Some(Piece {
            id,
            kind,
            color,
            square,
            has_moved: false,
        });
        id
    }

    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        self.squares[square.index()].take()
    }

    /// Relocates the piece on `from` to `to`, marking it as moved.
    ///
    /// Returns whatever piece was standing on `to`.
    pub fn move_piece(&mut self, from: Square, to: Square) -> Option<Piece> {
        let mut piece = self.squares[from.index()].take()?;
        piece.square = to;
        piece.has_moved = true;
        self.squares[to.index()].replace(piece)
    }

    pub(crate) fn set_has_moved(&mut self, square: Square, has_moved: bool) {
        if let Some(piece) = self.squares[square.index()].as_mut() {
            piece.has_moved = has_moved;
        }
    }

    pub fn piece_count(&self) -> usize {
        self.pieces().count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::standard()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8u8 {
                let symbol = Square::new(file, rank)
                    .and_then(|square| self.get(square))
                    .map(Piece::fen_char)
                    .unwrap_or('.');
                write!(f, " {}", symbol)?;
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}
