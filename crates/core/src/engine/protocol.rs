//! UCI subset spoken with move-suggesting engines
//!
//! Outbound `position fen <FEN>` and `go depth <N>`; inbound
//! `bestmove <from><to>` or `bestmove (none)`.

use std::fmt;

use crate::board::Square;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Position { fen: String },
    Go { depth: u8 },
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Position { fen } => write!(f, "position fen {}", fen),
            EngineCommand::Go { depth } => write!(f, "go depth {}", depth),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineReply {
    BestMove { from: Square, to: Square },
    NoMove,
}

impl EngineReply {
    /// Parses a `bestmove` line. Trailing `ponder ...` tokens and a
    /// promotion letter on the move are accepted and ignored.
    pub fn parse(line: &str) -> Result<Self> {
        let malformed = || Error::MalformedEngineReply(line.to_string());
        let mut parts = line.split_whitespace();

        if parts.next() != Some("bestmove") {
            return Err(malformed());
        }
        let mv = parts.next().ok_or_else(malformed)?;
        if mv == "(none)" {
            return Ok(EngineReply::NoMove);
        }
        if !(mv.len() == 4 || mv.len() == 5) || !mv.is_ascii() {
            return Err(malformed());
        }

        let from: Square = mv[0..2].parse().map_err(|_| malformed())?;
        let to: Square = mv[2..4].parse().map_err(|_| malformed())?;
        Ok(EngineReply::BestMove { from, to })
    }
}

impl fmt::Display for EngineReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineReply::BestMove { from, to } => write!(f, "bestmove {}{}", from, to),
            EngineReply::NoMove => write!(f, "bestmove (none)"),
        }
    }
}
