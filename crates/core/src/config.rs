//! Game configuration
//!
//! Read from a JSON file; every field has a default so a missing or
//! partial file still yields a playable setup.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::board::Color;
use crate::engine::Difficulty;
use crate::error::Result;
use crate::session::{GameMode, SessionSettings};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "CHECKMATE3D_CONFIG";

/// Engine name selecting the built-in mock engine.
pub const MOCK_ENGINE: &str = "mock";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub mode: GameMode,
    pub player_color: Color,
    pub difficulty: Difficulty,
    /// `"mock"` or a path to a UCI engine binary.
    pub engine: String,
    pub engine_timeout_ms: u64,
    /// Mock engine "thinking" delay.
    pub engine_delay_ms: u64,
    pub database_path: String,
    pub bind_address: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            mode: GameMode::Engine,
            player_color: Color::White,
            difficulty: Difficulty::Medium,
            engine: MOCK_ENGINE.to_string(),
            engine_timeout_ms: 10_000,
            engine_delay_ms: 500,
            database_path: "checkmate3d.db".to_string(),
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

impl GameConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&text)?;
        info!(path = %path.as_ref().display(), "loaded config");
        Ok(config)
    }

    /// Loads the file named by `CHECKMATE3D_CONFIG`, or the defaults when
    /// the variable is unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Path of the external engine, or `None` for the mock.
    pub fn engine_path(&self) -> Option<&str> {
        let engine = self.engine.trim();
        if engine.is_empty() || engine.eq_ignore_ascii_case(MOCK_ENGINE) {
            None
        } else {
            Some(engine)
        }
    }

    pub fn engine_timeout(&self) -> Duration {
        Duration::from_millis(self.engine_timeout_ms)
    }

    pub fn engine_delay(&self) -> Duration {
        Duration::from_millis(self.engine_delay_ms)
    }

    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            mode: self.mode,
            player_color: self.player_color,
            difficulty: self.difficulty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.engine_path(), None);
        assert_eq!(config.engine_timeout(), Duration::from_secs(10));
        assert_eq!(config.engine_delay(), Duration::from_millis(500));
        assert_eq!(config.settings().difficulty.depth(), 10);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "mode": "multiplayer", "difficulty": "expert", "player_color": "black" }"#;
        let config: GameConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.mode, GameMode::Multiplayer);
        assert_eq!(config.difficulty, Difficulty::Expert);
        assert_eq!(config.player_color, Color::Black);
        assert_eq!(config.engine_timeout_ms, 10_000);
        assert_eq!(config.engine, "mock");
    }

    #[test]
    fn test_engine_path() {
        let config = GameConfig {
            engine: "/usr/bin/stockfish".into(),
            ..GameConfig::default()
        };
        assert_eq!(config.engine_path(), Some("/usr/bin/stockfish"));

        let config = GameConfig {
            engine: "MOCK".into(),
            ..GameConfig::default()
        };
        assert_eq!(config.engine_path(), None);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("checkmate3d-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "engine_delay_ms": 0, "database_path": ":memory:" }"#).unwrap();
        let config = GameConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.engine_delay_ms, 0);
        assert_eq!(config.database_path, ":memory:");
        assert_eq!(config.mode, GameMode::Engine);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(GameConfig::from_file("/nonexistent/checkmate3d.json").is_err());
    }
}
