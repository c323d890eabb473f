//! Game state owned by the state machine

use serde::{Deserialize, Serialize};

use crate::board::{Color, PieceKind, Square};

use super::MoveRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Check,
    Checkmate,
    Stalemate,
    Resigned { winner: Color },
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GameStatus::Checkmate | GameStatus::Stalemate | GameStatus::Resigned { .. }
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::InProgress => "in_progress",
            GameStatus::Check => "check",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::Resigned { .. } => "resigned",
        }
    }
}

/// Result of a game, in PGN terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ongoing,
    Win(Color),
    Draw,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ongoing => "*",
            Outcome::Win(Color::White) => "1-0",
            Outcome::Win(Color::Black) => "0-1",
            Outcome::Draw => "1/2-1/2",
        }
    }
}

/// Captured pieces, keyed by the color of the piece that was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captured {
    pub white: Vec<PieceKind>,
    pub black: Vec<PieceKind>,
}

impl Captured {
    pub fn push(&mut self, color: Color, kind: PieceKind) {
        match color {
            Color::White => self.white.push(kind),
            Color::Black => self.black.push(kind),
        }
    }

    pub fn of(&self, color: Color) -> &[PieceKind] {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    /// Most valuable first, for the captured-pieces tray.
    pub fn by_value(&self, color: Color) -> Vec<PieceKind> {
        let mut kinds = self.of(color).to_vec();
        kinds.sort_by(|a, b| b.value().cmp(&a.value()));
        kinds
    }

    /// Material taken from `color`.
    pub fn material(&self, color: Color) -> u32 {
        self.of(color).iter().map(|kind| kind.value() as u32).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub turn: Color,
    pub status: GameStatus,
    pub en_passant_target: Option<Square>,
    /// 1-based ply of the next move; the FEN fullmove number is
    /// `ceil(move_number / 2)`.
    pub move_number: u32,
    pub captured: Captured,
    pub history: Vec<MoveRecord>,
}

impl GameState {
    pub fn new() -> Self {
        GameState {
            turn: Color::White,
            status: GameStatus::InProgress,
            en_passant_target: None,
            move_number: 1,
            captured: Captured::default(),
            history: Vec::new(),
        }
    }

    pub fn in_check(&self) -> bool {
        matches!(self.status, GameStatus::Check | GameStatus::Checkmate)
    }

    pub fn is_checkmate(&self) -> bool {
        self.status == GameStatus::Checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.status == GameStatus::Stalemate
    }

    pub fn is_resigned(&self) -> bool {
        matches!(self.status, GameStatus::Resigned { .. })
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn fullmove_number(&self) -> u32 {
        self.move_number.div_ceil(2)
    }

    pub fn outcome(&self) -> Outcome {
        match self.status {
            GameStatus::InProgress | GameStatus::Check => Outcome::Ongoing,
            // the side to move is the side that got mated
            GameStatus::Checkmate => Outcome::Win(self.turn.opposite()),
            GameStatus::Stalemate => Outcome::Draw,
            GameStatus::Resigned { winner } => Outcome::Win(winner),
        }
    }

    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.history.last()
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = GameState::new();
        assert_eq!(state.turn, Color::White);
        assert!(state.is_active());
        assert!(!state.in_check());
        assert_eq!(state.fullmove_number(), 1);
        assert_eq!(state.outcome(), Outcome::Ongoing);
    }

    #[test]
    fn test_terminal_flags_are_exclusive() {
        let mut state = GameState::new();
        state.status = GameStatus::Checkmate;
        assert!(state.is_checkmate() && !state.is_stalemate() && !state.is_active());
        state.status = GameStatus::Stalemate;
        assert!(!state.is_checkmate() && state.is_stalemate() && !state.is_active());
        assert_eq!(state.outcome().as_str(), "1/2-1/2");
    }

    #[test]
    fn test_captured_sorted_by_value() {
        let mut captured = Captured::default();
        captured.push(Color::Black, PieceKind::Pawn);
        captured.push(Color::Black, PieceKind::Queen);
        captured.push(Color::Black, PieceKind::Knight);
        assert_eq!(
            captured.by_value(Color::Black),
            vec![PieceKind::Queen, PieceKind::Knight, PieceKind::Pawn]
        );
        assert_eq!(captured.material(Color::Black), 13);
        assert!(captured.of(Color::White).is_empty());
    }
}
