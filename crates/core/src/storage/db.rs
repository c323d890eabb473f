//! Database operations

use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use super::models::*;
use crate::error::Result;
use crate::game::{notation, Game};
use crate::session::GameMode;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mode TEXT NOT NULL,
                result TEXT NOT NULL,
                termination TEXT NOT NULL,
                moves TEXT NOT NULL,
                final_fen TEXT NOT NULL,
                ply_count INTEGER NOT NULL,
                played_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_games_played_at ON games(played_at);
            "#,
        )?;
        Ok(())
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn row_to_game(row: &Row<'_>) -> rusqlite::Result<StoredGame> {
        Ok(StoredGame {
            id: row.get(0)?,
            mode: row.get(1)?,
            result: row.get(2)?,
            termination: row.get(3)?,
            moves: row.get(4)?,
            final_fen: row.get(5)?,
            ply_count: row.get(6)?,
            played_at: row.get(7)?,
        })
    }

    /// Archives `game` as it stands now.
    pub fn insert_game(&self, game: &Game, mode: GameMode) -> Result<i64> {
        let history = game.history();

        self.conn.execute(
            r#"
            INSERT INTO games
            (mode, result, termination, moves, final_fen, ply_count, played_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                mode.as_str(),
                game.outcome().as_str(),
                game.status().as_str(),
                notation::movetext(history),
                game.fen(),
                history.len() as u32,
                Self::now(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(id, result = game.outcome().as_str(), "archived game");
        Ok(id)
    }

    pub fn get_game(&self, id: i64) -> Result<Option<StoredGame>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mode, result, termination, moves, final_fen, ply_count, played_at
             FROM games WHERE id = ?1",
        )?;

        let game = match stmt.query_row(params![id], Self::row_to_game) {
            Ok(game) => Some(game),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        Ok(game)
    }

    pub fn get_recent_games(&self, limit: u32) -> Result<Vec<StoredGame>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mode, result, termination, moves, final_fen, ply_count, played_at
             FROM games ORDER BY played_at DESC, id DESC LIMIT ?1",
        )?;

        let games = stmt
            .query_map(params![limit], Self::row_to_game)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(games)
    }

    pub fn count_games(&self) -> Result<u32> {
        let count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Color, Square};

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn fools_mate() -> Game {
        let mut game = Game::new();
        for (from, to) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")] {
            game.play(sq(from), sq(to)).unwrap();
        }
        game
    }

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_game(&fools_mate(), GameMode::Multiplayer).unwrap();

        let stored = db.get_game(id).unwrap().unwrap();
        assert_eq!(stored.mode, "multiplayer");
        assert_eq!(stored.result, "0-1");
        assert_eq!(stored.termination, "checkmate");
        assert_eq!(stored.moves, "1. f3 e5 2. g4 Qh4#");
        assert_eq!(stored.ply_count, 4);
        assert!(stored.final_fen.starts_with("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w"));
        assert!(stored.is_decisive());
    }

    #[test]
    fn test_missing_game() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_game(42).unwrap(), None);
    }

    #[test]
    fn test_recent_games_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let mut resigned = Game::new();
        resigned.resign(Color::White).unwrap();

        let first = db.insert_game(&fools_mate(), GameMode::Engine).unwrap();
        let second = db.insert_game(&resigned, GameMode::Engine).unwrap();

        assert_eq!(db.count_games().unwrap(), 2);
        let recent = db.get_recent_games(10).unwrap();
        assert_eq!(recent.iter().map(|g| g.id).collect::<Vec<_>>(), vec![second, first]);
        assert_eq!(recent[0].termination, "resigned");
        assert_eq!(recent[0].moves, "");

        assert_eq!(db.get_recent_games(1).unwrap().len(), 1);
    }
}
