//! In-process stand-in for an external engine
//!
//! Rebuilds the position it was sent and answers with a legal move after
//! a short "thinking" delay, preferring captures most of the time.

use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::{Engine, EngineCommand, EngineReply};
use crate::error::{Error, Result};
use crate::game::Game;
use crate::rules::Move;

/// Probability of picking a capture when one is available.
const CAPTURE_BIAS: f64 = 0.7;

pub struct MockEngine {
    position: Option<String>,
    pending_depth: Option<u8>,
    delay: Duration,
    rng: StdRng,
}

impl MockEngine {
    pub fn new(delay: Duration) -> Self {
        Self::with_rng(delay, StdRng::seed_from_u64(rand::random()))
    }

    /// Deterministic choices, for tests and replays.
    pub fn seeded(delay: Duration, seed: u64) -> Self {
        Self::with_rng(delay, StdRng::seed_from_u64(seed))
    }

    fn with_rng(delay: Duration, rng: StdRng) -> Self {
        MockEngine {
            position: None,
            pending_depth: None,
            delay,
            rng,
        }
    }

    fn choose(&mut self, moves: &[Move]) -> Option<Move> {
        let captures: Vec<Move> = moves.iter().copied().filter(|m| m.capture).collect();
        if !captures.is_empty() && self.rng.random_bool(CAPTURE_BIAS) {
            return captures.choose(&mut self.rng).copied();
        }
        moves.choose(&mut self.rng).copied()
    }
}

#[async_trait]
impl Engine for MockEngine {
    async fn send(&mut self, command: &EngineCommand) -> Result<()> {
        match command {
            EngineCommand::Position { fen } => self.position = Some(fen.clone()),
            EngineCommand::Go { depth } => self.pending_depth = Some(*depth),
        }
        Ok(())
    }

    async fn read_reply(&mut self) -> Result<String> {
        if self.pending_depth.take().is_none() {
            return Err(Error::Engine("no search was requested".into()));
        }
        let fen = self
            .position
            .as_deref()
            .ok_or_else(|| Error::Engine("no position was set".into()))?;
        let game = Game::from_fen(fen)?;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let reply = match self.choose(&game.legal_moves()) {
            Some(mv) => EngineReply::BestMove {
                from: mv.from,
                to: mv.to,
            },
            None => EngineReply::NoMove,
        };
        Ok(reply.to_string())
    }
}
