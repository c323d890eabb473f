//! Bridge between an engine and the game's move pipeline

use std::time::Duration;

use rand::seq::IndexedRandom;
use tracing::{info, warn};

use super::{Engine, EngineCommand, EngineReply};
use crate::error::{Error, Result};
use crate::game::{Game, MoveRecord};

pub struct EngineAdapter {
    engine: Box<dyn Engine>,
    timeout: Duration,
}

impl EngineAdapter {
    pub fn new(engine: Box<dyn Engine>, timeout: Duration) -> Self {
        EngineAdapter { engine, timeout }
    }

    /// Sends the position and a search request, then waits for the reply.
    pub async fn request_move(&mut self, fen: &str, depth: u8) -> Result<EngineReply> {
        tokio::time::timeout(self.timeout, self.engine.resync())
            .await
            .map_err(|_| Error::EngineTimeout(self.timeout))??;

        self.engine
            .send(&EngineCommand::Position { fen: fen.to_string() })
            .await?;
        self.engine.send(&EngineCommand::Go { depth }).await?;

        let line = tokio::time::timeout(self.timeout, self.engine.read_reply())
            .await
            .map_err(|_| Error::EngineTimeout(self.timeout))??;
        EngineReply::parse(&line)
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.engine.quit().await
    }
}

/// Applies an engine answer through [`Game::play`], so the move is
/// validated like any other.
///
/// A reply naming an empty square or an illegal move, a timeout or a
/// broken engine all fall back to a random legal move. Unparseable
/// replies and `(none)` apply nothing.
pub fn apply_reply(game: &mut Game, reply: Result<EngineReply>) -> Result<Option<MoveRecord>> {
    if !game.is_active() {
        return Err(Error::GameNotActive);
    }

    match reply {
        Ok(EngineReply::NoMove) => {
            info!("engine reports no move");
            Ok(None)
        }
        Ok(EngineReply::BestMove { from, to }) => match game.play(from, to) {
            Ok(record) => Ok(Some(record)),
            Err(Error::NoPieceAt { square }) => {
                warn!(error = %Error::EngineDesync { square }, "falling back to a random move");
                play_random_move(game)
            }
            Err(e) if e.is_illegal_move() => {
                warn!(error = %e, "engine suggested an illegal move, falling back to a random move");
                play_random_move(game)
            }
            Err(e) => Err(e),
        },
        Err(Error::MalformedEngineReply(text)) => {
            warn!(reply = %text, "ignoring malformed engine reply");
            Ok(None)
        }
        Err(e) => {
            warn!(error = %e, "engine failed, falling back to a random move");
            play_random_move(game)
        }
    }
}

/// Plays a uniformly random legal move for the side to move.
pub fn play_random_move(game: &mut Game) -> Result<Option<MoveRecord>> {
    let moves = game.legal_moves();
    let Some(mv) = moves.choose(&mut rand::rng()).copied() else {
        return Ok(None);
    };
    game.apply_move(mv.piece, mv.to).map(Some)
}
