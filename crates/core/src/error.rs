//! Error types for checkmate3d-core

use std::time::Duration;

use thiserror::Error;

use crate::board::{Color, Square};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Illegal move: {from} to {to}")]
    IllegalMove { from: Square, to: Square },

    #[error("Not {color}'s turn")]
    NotYourTurn { color: Color },

    #[error("Game is not active")]
    GameNotActive,

    #[error("Another move is already in flight")]
    MoveInFlight,

    #[error("No piece at {square}")]
    NoPieceAt { square: Square },

    #[error("No piece with id {0}")]
    UnknownPiece(u8),

    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Engine reported a move from empty square {square}")]
    EngineDesync { square: Square },

    #[error("Malformed engine reply: {0}")]
    MalformedEngineReply(String),

    #[error("Engine did not answer within {0:?}")]
    EngineTimeout(Duration),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// `NotYourTurn` counts as an illegal move for callers that only
    /// want to show "invalid move" feedback.
    pub fn is_illegal_move(&self) -> bool {
        matches!(self, Error::IllegalMove { .. } | Error::NotYourTurn { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
