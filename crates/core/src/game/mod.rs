//! Game state machine
//!
//! [`Game`] owns the authoritative board and game state. `apply_move` is
//! the only path that mutates either of them.

pub mod notation;
mod record;
mod state;

use tracing::{debug, info};

use crate::board::{Board, Color, Piece, PieceId, Square};
use crate::error::{Error, Result};
use crate::fen;
use crate::rules::{self, special, Move};

pub use record::{MoveFlags, MoveRecord};
pub use state::{Captured, GameState, GameStatus, Outcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    state: GameState,
}

impl Game {
    /// A fresh game from the standard starting position.
    pub fn new() -> Self {
        Game {
            board: Board::standard(),
            state: GameState::new(),
        }
    }

    /// Loads a position; check, checkmate and stalemate are recomputed.
    pub fn from_fen(text: &str) -> Result<Self> {
        let (board, state) = fen::parse_fen(text)?;
        let mut game = Game { board, state };
        game.refresh_status();
        Ok(game)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn turn(&self) -> Color {
        self.state.turn
    }

    pub fn status(&self) -> GameStatus {
        self.state.status
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn outcome(&self) -> Outcome {
        self.state.outcome()
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.state.history
    }

    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.board.get(square)
    }

    pub fn fen(&self) -> String {
        fen::to_fen(&self.board, &self.state)
    }

    pub fn is_legal(&self, piece: &Piece, target: Square) -> bool {
        self.is_active() && rules::is_legal(&self.board, &self.state, piece, target)
    }

    /// Legality by squares, for callers that only know coordinates.
    pub fn is_legal_move(&self, from: Square, to: Square) -> bool {
        self.board
            .get(from)
            .map_or(false, |piece| self.is_legal(piece, to))
    }

    /// Legal moves for the side to move; empty once the game is over.
    pub fn legal_moves(&self) -> Vec<Move> {
        if !self.is_active() {
            return Vec::new();
        }
        rules::get_all_legal_moves(&self.board, &self.state, self.state.turn)
    }

    pub fn legal_destinations(&self, from: Square) -> Vec<Square> {
        if !self.is_active() {
            return Vec::new();
        }
        rules::legal_destinations(&self.board, &self.state, from)
    }

    /// Plays the piece standing on `from`.
    pub fn play(&mut self, from: Square, to: Square) -> Result<MoveRecord> {
        let id = self
            .board
            .get(from)
            .map(|piece| piece.id)
            .ok_or(Error::NoPieceAt { square: from })?;
        self.apply_move(id, to)
    }

    /// Validates and applies one move, then advances turn and status.
    pub fn apply_move(&mut self, id: PieceId, target: Square) -> Result<MoveRecord> {
        if !self.is_active() {
            return Err(Error::GameNotActive);
        }
        let piece = *self.board.find_by_id(id).ok_or(Error::UnknownPiece(id.0))?;
        if piece.color != self.state.turn {
            return Err(Error::NotYourTurn { color: piece.color });
        }
        if !rules::is_legal(&self.board, &self.state, &piece, target) {
            return Err(Error::IllegalMove {
                from: piece.square,
                to: target,
            });
        }

        let from = piece.square;
        let mut flags = MoveFlags::default();

        let captured = match special::en_passant_victim(
            &self.board,
            &piece,
            target,
            self.state.en_passant_target,
        ) {
            Some(victim) => {
                flags.en_passant = true;
                self.board.remove(victim).map(|pawn| pawn.kind)
            }
            None => self.board.get(target).map(|occupant| occupant.kind),
        };
        if let Some(kind) = captured {
            self.state.captured.push(piece.color.opposite(), kind);
        }

        self.state.en_passant_target = None;

        match special::castle_side(&piece, target) {
            Some(side) => {
                flags.castling = special::execute_castling(&mut self.board, from, side);
            }
            None => {
                self.board.move_piece(from, target);
            }
        }

        self.state.en_passant_target = special::double_push_target(&piece, target);

        if special::is_promotion_square(&piece, target) {
            flags.promotion = special::promote(&mut self.board, target).is_some();
        }

        let ply = self.state.move_number;
        self.state.turn = self.state.turn.opposite();
        self.state.move_number += 1;
        self.refresh_status();

        let mut record = MoveRecord {
            ply,
            from,
            to: target,
            kind: piece.kind,
            color: piece.color,
            captured,
            flags,
            check: self.state.in_check(),
            checkmate: self.state.is_checkmate(),
            notation: String::new(),
        };
        record.notation = notation::describe(&record);
        debug!(notation = %record.notation, fen = %self.fen(), "applied move");

        self.state.history.push(record.clone());
        Ok(record)
    }

    /// `color` gives up; the other side wins.
    pub fn resign(&mut self, color: Color) -> Result<()> {
        if !self.is_active() {
            return Err(Error::GameNotActive);
        }
        self.state.status = GameStatus::Resigned {
            winner: color.opposite(),
        };
        info!(%color, "resigned");
        Ok(())
    }

    /// Recomputes check, checkmate and stalemate for the side to move.
    fn refresh_status(&mut self) {
        if self.state.is_resigned() {
            return;
        }
        let side = self.state.turn;
        let in_check = rules::is_in_check(&self.board, side);
        let has_moves = !rules::get_all_legal_moves(&self.board, &self.state, side).is_empty();

        self.state.status = match (in_check, has_moves) {
            (true, true) => GameStatus::Check,
            (true, false) => GameStatus::Checkmate,
            (false, true) => GameStatus::InProgress,
            (false, false) => GameStatus::Stalemate,
        };

        match self.state.status {
            GameStatus::Checkmate => info!(winner = %side.opposite(), "checkmate"),
            GameStatus::Stalemate => info!("stalemate"),
            GameStatus::Check => info!(%side, "check"),
            _ => {}
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PieceKind;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn play_all(game: &mut Game, moves: &[(&str, &str)]) {
        for (from, to) in moves {
            game.play(sq(from), sq(to)).unwrap();
        }
    }

    fn assert_board_invariants(game: &Game) {
        for color in [Color::White, Color::Black] {
            let kings = game
                .board()
                .pieces_of(color)
                .filter(|p| p.kind == PieceKind::King)
                .count();
            assert_eq!(kings, 1);
        }
        for piece in game.board().pieces() {
            assert_eq!(game.board().get(piece.square).map(|p| p.id), Some(piece.id));
        }
    }

    #[test]
    fn test_fools_mate() {
        let mut game = Game::new();
        play_all(&mut game, &[("f2", "f3"), ("e7", "e5"), ("g2", "g4")]);
        let mate = game.play(sq("d8"), sq("h4")).unwrap();

        assert_eq!(mate.notation, "Qh4#");
        assert!(game.state().is_checkmate());
        assert!(!game.state().is_stalemate());
        assert!(!game.is_active());
        assert_eq!(game.outcome(), Outcome::Win(Color::Black));
        assert!(rules::get_all_legal_moves(game.board(), game.state(), Color::White).is_empty());
        assert_board_invariants(&game);
    }

    #[test]
    fn test_moves_rejected_after_game_over() {
        let mut game = Game::new();
        play_all(
            &mut game,
            &[("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")],
        );
        let before = game.clone();
        assert!(matches!(game.play(sq("a2"), sq("a3")), Err(Error::GameNotActive)));
        assert!(matches!(game.resign(Color::White), Err(Error::GameNotActive)));
        assert_eq!(game, before);
    }

    #[test]
    fn test_wrong_turn_and_illegal_moves_change_nothing() {
        let mut game = Game::new();
        let before = game.clone();

        let err = game.play(sq("e7"), sq("e5")).unwrap_err();
        assert!(matches!(err, Error::NotYourTurn { color: Color::Black }));
        assert!(err.is_illegal_move());

        let err = game.play(sq("e2"), sq("e5")).unwrap_err();
        assert!(matches!(err, Error::IllegalMove { .. }));

        assert!(matches!(game.play(sq("e4"), sq("e5")), Err(Error::NoPieceAt { .. })));
        assert_eq!(game, before);
    }

    #[test]
    fn test_en_passant_window() {
        let mut game = Game::new();
        play_all(
            &mut game,
            &[("h2", "h3"), ("e7", "e5"), ("h3", "h4"), ("e5", "e4")],
        );
        game.play(sq("d2"), sq("d4")).unwrap();
        assert_eq!(game.state().en_passant_target, Some(sq("d3")));
        assert!(game.is_legal_move(sq("e4"), sq("d3")));

        let record = game.play(sq("e4"), sq("d3")).unwrap();
        assert!(record.flags.en_passant);
        assert_eq!(record.captured, Some(PieceKind::Pawn));
        assert_eq!(record.notation, "exd3 e.p.");
        assert!(game.piece_at(sq("d4")).is_none());
        assert_eq!(game.state().captured.white, vec![PieceKind::Pawn]);
        assert_eq!(game.state().en_passant_target, None);
    }

    #[test]
    fn test_en_passant_expires_after_other_move() {
        let mut game = Game::new();
        play_all(
            &mut game,
            &[("h2", "h3"), ("e7", "e5"), ("h3", "h4"), ("e5", "e4"), ("d2", "d4")],
        );
        play_all(&mut game, &[("a7", "a6"), ("a2", "a3")]);
        assert_eq!(game.state().en_passant_target, None);
        assert!(!game.is_legal_move(sq("e4"), sq("d3")));
    }

    #[test]
    fn test_castling_kingside() {
        let mut game = Game::new();
        play_all(
            &mut game,
            &[("e2", "e4"), ("e7", "e5"), ("g1", "f3"), ("b8", "c6"), ("f1", "c4"), ("g8", "f6")],
        );
        let record = game.play(sq("e1"), sq("g1")).unwrap();
        assert!(record.flags.castling);
        assert_eq!(record.notation, "O-O");
        assert_eq!(game.piece_at(sq("g1")).unwrap().kind, PieceKind::King);
        assert_eq!(game.piece_at(sq("f1")).unwrap().kind, PieceKind::Rook);
        assert!(game.piece_at(sq("h1")).is_none());
        // one history entry for king and rook together
        assert_eq!(game.history().len(), 7);
        assert_eq!(game.turn(), Color::Black);
        assert!(game.fen().contains(" b kq "));
    }

    #[test]
    fn test_castling_through_attacked_square() {
        // black bishop on c4 covers f1; g1 and the f/g files are otherwise empty
        let game = Game::from_fen("4k3/8/8/8/2b5/8/8/4K2R w K - 0 1").unwrap();
        assert!(game.piece_at(sq("g1")).is_none());
        assert!(!game.is_legal_move(sq("e1"), sq("g1")));
        assert!(game.is_legal_move(sq("e1"), sq("d1")));
    }

    #[test]
    fn test_promotion_to_queen() {
        let mut game = Game::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let pawn_id = game.piece_at(sq("a7")).unwrap().id;
        let record = game.play(sq("a7"), sq("a8")).unwrap();

        assert!(record.flags.promotion);
        assert_eq!(record.kind, PieceKind::Pawn);
        assert_eq!(record.notation, "a8=Q+");
        let queen = game.piece_at(sq("a8")).unwrap();
        assert_eq!(queen.kind, PieceKind::Queen);
        assert_ne!(queen.id, pawn_id);
        assert_eq!(game.status(), GameStatus::Check);
    }

    #[test]
    fn test_stalemate() {
        let mut game = Game::from_fen("7k/8/6K1/8/8/8/8/5Q2 w - - 0 1").unwrap();
        game.play(sq("f1"), sq("f7")).unwrap();
        assert!(game.state().is_stalemate());
        assert!(!game.state().is_checkmate());
        assert_eq!(game.outcome(), Outcome::Draw);
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn test_resignation() {
        let mut game = Game::new();
        game.play(sq("e2"), sq("e4")).unwrap();
        game.resign(Color::Black).unwrap();
        assert!(game.state().is_resigned());
        assert_eq!(game.outcome(), Outcome::Win(Color::White));
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn test_check_is_reported_and_must_be_answered() {
        let mut game = Game::new();
        play_all(&mut game, &[("e2", "e4"), ("f7", "f6")]);
        let record = game.play(sq("d1"), sq("h5")).unwrap();
        assert_eq!(record.notation, "Qh5+");
        assert_eq!(game.status(), GameStatus::Check);
        // only g6 interposes; the king has no flight square
        let moves = game.legal_moves();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].to, sq("g6"));
    }

    #[test]
    fn test_capture_tally_and_notation() {
        let mut game = Game::new();
        play_all(&mut game, &[("e2", "e4"), ("d7", "d5")]);
        let record = game.play(sq("e4"), sq("d5")).unwrap();
        assert_eq!(record.notation, "exd5");
        assert_eq!(game.state().captured.black, vec![PieceKind::Pawn]);
        assert_eq!(game.board().piece_count(), 31);
        assert_board_invariants(&game);
    }
}
