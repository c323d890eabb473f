//! Game sessions
//!
//! A [`GameSession`] owns one [`Game`] plus, in engine mode, the adapter
//! that plays the other side. Human moves are applied immediately; the
//! engine's answer is requested on a background task and applied when it
//! arrives. One move is processed at a time: submissions that arrive while
//! a move (or an engine reply) is pending are rejected with
//! [`Error::MoveInFlight`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::board::{Color, Square};
use crate::engine::{apply_reply, Difficulty, EngineAdapter};
use crate::error::{Error, Result};
use crate::game::{Game, MoveRecord, Outcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Both sides moved by people at the same board.
    Multiplayer,
    #[default]
    Engine,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Multiplayer => "multiplayer",
            GameMode::Engine => "engine",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub mode: GameMode,
    /// The human's side in engine mode.
    pub player_color: Color,
    pub difficulty: Difficulty,
}

impl SessionSettings {
    pub fn engine_color(&self) -> Option<Color> {
        match self.mode {
            GameMode::Engine => Some(self.player_color.opposite()),
            GameMode::Multiplayer => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Moved(MoveRecord),
    /// Carries the final position so listeners need not hold the session.
    Finished { outcome: Outcome, game: Box<Game> },
}

/// Holds the in-flight flag until dropped.
struct FlightGuard(Arc<AtomicBool>);

impl FlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::MoveInFlight)?;
        Ok(FlightGuard(Arc::clone(flag)))
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct GameSession {
    game: Arc<Mutex<Game>>,
    settings: SessionSettings,
    engine: Option<Arc<tokio::sync::Mutex<EngineAdapter>>>,
    in_flight: Arc<AtomicBool>,
    events: broadcast::Sender<SessionEvent>,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn publish(events: &broadcast::Sender<SessionEvent>, record: &MoveRecord, game: &Game) {
    // no subscribers is fine
    let _ = events.send(SessionEvent::Moved(record.clone()));
    if !game.is_active() {
        publish_finish(events, game);
    }
}

fn publish_finish(events: &broadcast::Sender<SessionEvent>, game: &Game) {
    info!(result = game.outcome().as_str(), status = game.status().as_str(), "game finished");
    let _ = events.send(SessionEvent::Finished {
        outcome: game.outcome(),
        game: Box::new(game.clone()),
    });
}

impl GameSession {
    /// A session from the standard starting position.
    pub fn new(settings: SessionSettings, engine: Option<EngineAdapter>) -> Result<Self> {
        Self::with_game(Game::new(), settings, engine)
    }

    /// A session continuing `game`. Engine mode needs an engine; multiplayer
    /// ignores one.
    pub fn with_game(
        game: Game,
        settings: SessionSettings,
        engine: Option<EngineAdapter>,
    ) -> Result<Self> {
        let engine = match settings.mode {
            GameMode::Engine => Some(
                engine.ok_or_else(|| Error::Engine("engine mode needs an engine".into()))?,
            ),
            GameMode::Multiplayer => None,
        };
        let (events, _) = broadcast::channel(64);

        info!(
            mode = settings.mode.as_str(),
            player = %settings.player_color,
            difficulty = %settings.difficulty,
            "new session"
        );

        Ok(GameSession {
            game: Arc::new(Mutex::new(game)),
            settings,
            engine: engine.map(|adapter| Arc::new(tokio::sync::Mutex::new(adapter))),
            in_flight: Arc::new(AtomicBool::new(false)),
            events,
            pending: Arc::new(Mutex::new(None)),
        })
    }

    /// Lets the engine open the game when it has the first move.
    pub fn start(&self) -> Result<()> {
        if self.is_engine_turn() {
            let guard = FlightGuard::acquire(&self.in_flight)?;
            self.spawn_engine_turn(guard);
        }
        Ok(())
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// A copy of the current game.
    pub fn snapshot(&self) -> Game {
        lock(&self.game).clone()
    }

    pub fn fen(&self) -> String {
        lock(&self.game).fen()
    }

    /// True while a move is being applied or the engine is thinking.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_legal(&self, from: Square, to: Square) -> bool {
        self.may_touch(from) && lock(&self.game).is_legal_move(from, to)
    }

    /// Destinations for highlighting; empty for the engine's pieces.
    pub fn legal_destinations(&self, from: Square) -> Vec<Square> {
        if !self.may_touch(from) {
            return Vec::new();
        }
        lock(&self.game).legal_destinations(from)
    }

    /// Applies a human move, then lets the engine reply in the background.
    /// In engine mode this must run inside a tokio runtime.
    pub fn submit_move(&self, from: Square, to: Square) -> Result<MoveRecord> {
        let guard = FlightGuard::acquire(&self.in_flight)?;

        let record = {
            let mut game = lock(&self.game);
            if let Some(engine_color) = self.settings.engine_color() {
                if game.is_active() && game.turn() == engine_color {
                    return Err(Error::NotYourTurn {
                        color: self.settings.player_color,
                    });
                }
            }
            let record = game.play(from, to)?;
            publish(&self.events, &record, &game);
            record
        };

        if self.is_engine_turn() {
            self.spawn_engine_turn(guard);
        }
        Ok(record)
    }

    pub fn resign(&self, color: Color) -> Result<()> {
        let mut game = lock(&self.game);
        game.resign(color)?;
        publish_finish(&self.events, &game);
        Ok(())
    }

    /// Waits for a pending engine reply, if any.
    pub async fn engine_idle(&self) {
        let handle = lock(&self.pending).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "engine task ended abnormally");
            }
        }
    }

    /// Stops any pending engine request and shuts the engine down.
    pub async fn close(&self) {
        let handle = lock(&self.pending).take();
        if let Some(handle) = handle {
            handle.abort();
        }
        if let Some(engine) = &self.engine {
            if let Err(e) = engine.lock().await.shutdown().await {
                warn!(error = %e, "engine shutdown failed");
            }
        }
    }

    fn is_engine_turn(&self) -> bool {
        let game = lock(&self.game);
        self.settings.engine_color() == Some(game.turn()) && game.is_active()
    }

    /// In engine mode only the human's pieces can be picked up.
    fn may_touch(&self, from: Square) -> bool {
        match self.settings.mode {
            GameMode::Multiplayer => true,
            GameMode::Engine => lock(&self.game)
                .piece_at(from)
                .map_or(false, |piece| piece.color == self.settings.player_color),
        }
    }

    fn spawn_engine_turn(&self, guard: FlightGuard) {
        let Some(engine) = self.engine.clone() else {
            return;
        };
        let game = Arc::clone(&self.game);
        let events = self.events.clone();
        let depth = self.settings.difficulty.depth();

        let handle = tokio::spawn(async move {
            let _guard = guard;
            let fen = lock(&game).fen();
            debug!(%fen, depth, "requesting engine move");

            let reply = engine.lock().await.request_move(&fen, depth).await;

            let mut game = lock(&game);
            match apply_reply(&mut game, reply) {
                Ok(Some(record)) => publish(&events, &record, &game),
                Ok(None) => {}
                Err(Error::GameNotActive) => debug!("game ended while the engine was thinking"),
                Err(e) => warn!(error = %e, "engine move could not be applied"),
            }
        });

        *lock(&self.pending) = Some(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use crate::game::GameStatus;
    use std::time::Duration;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn mock(seed: u64, delay: Duration) -> EngineAdapter {
        EngineAdapter::new(
            Box::new(MockEngine::seeded(delay, seed)),
            Duration::from_secs(5),
        )
    }

    fn engine_settings(player_color: Color) -> SessionSettings {
        SessionSettings {
            mode: GameMode::Engine,
            player_color,
            difficulty: Difficulty::Easy,
        }
    }

    #[tokio::test]
    async fn test_engine_replies_to_human_move() {
        let session = GameSession::new(engine_settings(Color::White), Some(mock(1, Duration::ZERO))).unwrap();
        let mut events = session.subscribe();

        session.submit_move(sq("e2"), sq("e4")).unwrap();
        session.engine_idle().await;

        let game = session.snapshot();
        assert_eq!(game.history().len(), 2);
        assert_eq!(game.history()[1].color, Color::Black);
        assert_eq!(game.turn(), Color::White);
        assert!(!session.is_busy());

        assert!(matches!(events.recv().await.unwrap(), SessionEvent::Moved(r) if r.color == Color::White));
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::Moved(r) if r.color == Color::Black));
    }

    #[tokio::test]
    async fn test_engine_opens_when_player_is_black() {
        let session = GameSession::new(engine_settings(Color::Black), Some(mock(2, Duration::ZERO))).unwrap();
        session.start().unwrap();
        session.engine_idle().await;

        let game = session.snapshot();
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.history()[0].color, Color::White);
        assert_eq!(game.turn(), Color::Black);
    }

    #[tokio::test]
    async fn test_moves_rejected_while_engine_thinks() {
        let session = GameSession::new(
            engine_settings(Color::White),
            Some(mock(3, Duration::from_millis(200))),
        )
        .unwrap();
        session.submit_move(sq("e2"), sq("e4")).unwrap();

        assert!(session.is_busy());
        assert!(matches!(
            session.submit_move(sq("d2"), sq("d4")),
            Err(Error::MoveInFlight)
        ));

        session.engine_idle().await;
        assert!(!session.is_busy());
        session.submit_move(sq("d2"), sq("d4")).unwrap();
    }

    #[tokio::test]
    async fn test_engine_pieces_are_off_limits() {
        let session = GameSession::new(engine_settings(Color::White), Some(mock(4, Duration::ZERO))).unwrap();
        assert!(session.legal_destinations(sq("e7")).is_empty());
        assert!(!session.is_legal(sq("e7"), sq("e5")));
        assert_eq!(session.legal_destinations(sq("e2")), vec![sq("e3"), sq("e4")]);

        let err = session.submit_move(sq("e7"), sq("e5")).unwrap_err();
        assert!(err.is_illegal_move());
        assert_eq!(session.snapshot(), Game::new());
    }

    #[tokio::test]
    async fn test_illegal_move_releases_guard() {
        let session = GameSession::new(engine_settings(Color::White), Some(mock(5, Duration::ZERO))).unwrap();
        assert!(session.submit_move(sq("e2"), sq("e5")).is_err());
        assert!(!session.is_busy());
        session.submit_move(sq("e2"), sq("e4")).unwrap();
        session.engine_idle().await;
    }

    #[tokio::test]
    async fn test_multiplayer_alternates_without_engine() {
        let settings = SessionSettings {
            mode: GameMode::Multiplayer,
            ..SessionSettings::default()
        };
        let session = GameSession::new(settings, None).unwrap();
        let mut events = session.subscribe();

        for (from, to) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")] {
            session.submit_move(sq(from), sq(to)).unwrap();
        }

        let game = session.snapshot();
        assert_eq!(game.status(), GameStatus::Checkmate);
        assert!(matches!(
            session.submit_move(sq("a2"), sq("a3")),
            Err(Error::GameNotActive)
        ));

        let mut finished = None;
        while let Ok(event) = events.try_recv() {
            if let SessionEvent::Finished { outcome, game } = event {
                assert_eq!(game.status(), GameStatus::Checkmate);
                finished = Some(outcome);
            }
        }
        assert_eq!(finished, Some(Outcome::Win(Color::Black)));
    }

    #[tokio::test]
    async fn test_resign_while_engine_thinks() {
        let session = GameSession::new(
            engine_settings(Color::White),
            Some(mock(6, Duration::from_millis(100))),
        )
        .unwrap();
        session.submit_move(sq("e2"), sq("e4")).unwrap();
        session.resign(Color::White).unwrap();
        session.engine_idle().await;

        let game = session.snapshot();
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.outcome(), Outcome::Win(Color::Black));
    }

    #[test]
    fn test_engine_mode_requires_engine() {
        assert!(GameSession::new(engine_settings(Color::White), None).is_err());
    }
}
