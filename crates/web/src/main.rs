use axum::{
    routing::{get, post},
    Router,
};
use std::sync::{Arc, Mutex, RwLock};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use checkmate3d_core::engine::engine_from_config;
use checkmate3d_core::{Database, GameConfig, GameMode, GameSession, SessionEvent};

mod routes;

pub struct AppState {
    pub config: GameConfig,
    pub db: Arc<Mutex<Database>>,
    pub session: RwLock<GameSession>,
}

impl AppState {
    /// The current session; replaced wholesale by a new game.
    pub fn session(&self) -> GameSession {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn replace_session(&self, session: GameSession) -> GameSession {
        let mut current = self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *current, session)
    }
}

/// Builds a session for `config`, archives it once it finishes, and lets
/// the engine open if it plays white.
pub async fn create_session(
    config: &GameConfig,
    db: Arc<Mutex<Database>>,
) -> checkmate3d_core::Result<GameSession> {
    let engine = match config.mode {
        GameMode::Engine => Some(engine_from_config(config).await?),
        GameMode::Multiplayer => None,
    };
    let session = GameSession::new(config.settings(), engine)?;
    archive_when_finished(&session, db);
    session.start()?;
    Ok(session)
}

fn archive_when_finished(session: &GameSession, db: Arc<Mutex<Database>>) {
    let mut events = session.subscribe();
    let mode = session.settings().mode;

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::Finished { game, .. }) => {
                    let db = db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                    if let Err(e) = db.insert_game(&game, mode) {
                        warn!(error = %e, "failed to archive game");
                    }
                    break;
                }
                Ok(SessionEvent::Moved(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "archive listener lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/games", get(routes::games_list))
        .route("/health", get(routes::health))
        .route("/game", get(routes::game::current))
        .route("/game/new", post(routes::game::new_game))
        .route("/game/legal", get(routes::game::legal_destinations))
        .route("/game/move", post(routes::game::submit_move))
        .route("/game/resign", post(routes::game::resign))
        .nest_service("/static", ServeDir::new("crates/web/static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = GameConfig::from_env().expect("Failed to load config");
    let db = Database::open(&config.database_path).expect("Failed to open database");
    let db = Arc::new(Mutex::new(db));

    let session = create_session(&config, Arc::clone(&db))
        .await
        .expect("Failed to start game session");

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        session: RwLock::new(session),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("Failed to bind");

    info!(address = %config.bind_address, "server running");

    axum::serve(listener, app(state))
        .await
        .expect("Server error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn test_state() -> Arc<AppState> {
        let config = GameConfig {
            mode: GameMode::Multiplayer,
            engine_delay_ms: 0,
            ..GameConfig::default()
        };
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let session = create_session(&config, Arc::clone(&db)).await.unwrap();
        Arc::new(AppState {
            config,
            db,
            session: RwLock::new(session),
        })
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(test_state().await)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_move_and_legal_destinations() {
        let state = test_state().await;

        let response = app(Arc::clone(&state))
            .oneshot(Request::get("/game/legal?from=e2").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["destinations"], serde_json::json!(["e3", "e4"]));

        let response = app(Arc::clone(&state))
            .oneshot(post_json("/game/move", r#"{"from":"e2","to":"e4"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["move"]["notation"], "e4");
        assert_eq!(body["game"]["turn"], "black");
    }

    #[tokio::test]
    async fn test_engine_opens_when_player_is_black() {
        let state = test_state().await;
        let response = app(Arc::clone(&state))
            .oneshot(post_json("/game/new", r#"{"mode":"engine","player_color":"black"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["mode"], "engine");
        assert_eq!(body["player_color"], "black");

        state.session().engine_idle().await;

        let response = app(Arc::clone(&state))
            .oneshot(Request::get("/game").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["last_move"]["color"], "white");
        assert_eq!(body["moves"].as_array().unwrap().len(), 1);
        assert_eq!(body["turn"], "black");
        assert_eq!(body["engine_thinking"], false);
    }

    #[tokio::test]
    async fn test_illegal_move_is_rejected() {
        let state = test_state().await;
        let response = app(Arc::clone(&state))
            .oneshot(post_json("/game/move", r#"{"from":"e2","to":"e5"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(state.session().snapshot().history().len(), 0);
    }

    #[tokio::test]
    async fn test_resignation_is_archived() {
        let state = test_state().await;
        let response = app(Arc::clone(&state))
            .oneshot(post_json("/game/resign", r#"{"color":"white"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["outcome"], "0-1");

        // the archive listener runs on its own task
        for _ in 0..50 {
            if state.db.lock().unwrap().count_games().unwrap() == 1 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("resigned game was not archived");
    }
}
