//! Database models

use serde::{Deserialize, Serialize};

/// A finished game as archived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGame {
    pub id: i64,
    pub mode: String,
    /// `1-0`, `0-1`, `1/2-1/2` or `*`.
    pub result: String,
    /// `checkmate`, `stalemate`, `resigned`, ...
    pub termination: String,
    pub moves: String,
    pub final_fen: String,
    pub ply_count: u32,
    pub played_at: u64,
}

impl StoredGame {
    pub fn is_decisive(&self) -> bool {
        self.result == "1-0" || self.result == "0-1"
    }
}
