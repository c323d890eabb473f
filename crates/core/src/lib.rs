//! Checkmate3D core library
//!
//! Chess rules, game state and engine orchestration behind the 3D board.
//! Rendering lives elsewhere; this crate only answers "is this legal?" and
//! "what happened?".

pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod fen;
pub mod game;
pub mod rules;
pub mod session;
pub mod storage;

pub use board::{Board, Color, Piece, PieceId, PieceKind, Square};
pub use config::GameConfig;
pub use engine::{Difficulty, Engine, EngineAdapter, MockEngine, StockfishEngine};
pub use error::{Error, Result};
pub use game::{Game, GameState, GameStatus, MoveRecord, Outcome};
pub use session::{GameMode, GameSession, SessionEvent, SessionSettings};
pub use storage::{Database, StoredGame};
