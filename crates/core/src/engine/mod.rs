//! Chess engine integration
//!
//! Provides the text protocol, an interface over engine processes, and the
//! adapter that turns engine answers into moves on a [`Game`].
//!
//! [`Game`]: crate::game::Game

pub mod adapter;
pub mod difficulty;
pub mod mock;
pub mod protocol;
pub mod stockfish;

use async_trait::async_trait;

use crate::config::GameConfig;
use crate::error::Result;

// Re-export main types for convenience
pub use adapter::{apply_reply, play_random_move, EngineAdapter};
pub use difficulty::Difficulty;
pub use mock::MockEngine;
pub use protocol::{EngineCommand, EngineReply};
pub use stockfish::StockfishEngine;

/// A move-suggesting engine reached over a line-based text protocol.
#[async_trait]
pub trait Engine: Send {
    /// Delivers one outbound command.
    async fn send(&mut self, command: &EngineCommand) -> Result<()>;

    /// Waits for the `bestmove` line answering the last `go`.
    async fn read_reply(&mut self) -> Result<String>;

    /// Brings the engine back to an idle state before a new request, e.g.
    /// after a search whose reply was never read.
    async fn resync(&mut self) -> Result<()> {
        Ok(())
    }

    async fn quit(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Builds the adapter the configuration asks for: the mock engine unless
/// an engine binary is configured.
pub async fn engine_from_config(config: &GameConfig) -> Result<EngineAdapter> {
    let engine: Box<dyn Engine> = match config.engine_path() {
        Some(path) => Box::new(StockfishEngine::spawn(path).await?),
        None => Box::new(MockEngine::new(config.engine_delay())),
    };
    Ok(EngineAdapter::new(engine, config.engine_timeout()))
}
