//! JSON API for the board renderer

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use checkmate3d_core::engine::Difficulty;
use checkmate3d_core::game::notation::{self, MoveRow};
use checkmate3d_core::{
    Color, Error, GameConfig, GameMode, GameSession, GameStatus, MoveRecord, PieceKind, Square,
};

use crate::{create_session, AppState};

// ============================================================================
// ERRORS
// ============================================================================

pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            e if e.is_illegal_move() => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NoPieceAt { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::GameNotActive | Error::MoveInFlight => StatusCode::CONFLICT,
            Error::InvalidSquare(_) | Error::InvalidFen(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!(error = %self.0, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

// ============================================================================
// VIEWS
// ============================================================================

#[derive(Serialize)]
pub struct PieceView {
    pub id: u8,
    /// Asset name, e.g. `whiteKnight`.
    pub model: String,
    pub kind: PieceKind,
    pub color: Color,
    pub square: Square,
}

#[derive(Serialize)]
pub struct CapturedView {
    pub white: Vec<char>,
    pub black: Vec<char>,
}

#[derive(Serialize)]
pub struct GameView {
    pub fen: String,
    pub turn: Color,
    pub status: GameStatus,
    pub outcome: &'static str,
    pub in_check: bool,
    pub checkmate: bool,
    pub stalemate: bool,
    pub resigned: bool,
    pub engine_thinking: bool,
    pub mode: GameMode,
    pub player_color: Color,
    pub difficulty: &'static str,
    pub pieces: Vec<PieceView>,
    /// Pieces taken from each color, most valuable first.
    pub captured: CapturedView,
    pub moves: Vec<MoveRow>,
    pub movetext: String,
    pub last_move: Option<MoveRecord>,
}

impl GameView {
    pub fn of(session: &GameSession) -> Self {
        let game = session.snapshot();
        let settings = session.settings();
        let state = game.state();
        let symbols = |color: Color| -> Vec<char> {
            state
                .captured
                .by_value(color)
                .into_iter()
                .map(PieceKind::symbol)
                .collect()
        };

        GameView {
            fen: game.fen(),
            turn: game.turn(),
            status: game.status(),
            outcome: game.outcome().as_str(),
            in_check: state.in_check(),
            checkmate: state.is_checkmate(),
            stalemate: state.is_stalemate(),
            resigned: state.is_resigned(),
            engine_thinking: session.is_busy(),
            mode: settings.mode,
            player_color: settings.player_color,
            difficulty: settings.difficulty.label(),
            pieces: game
                .board()
                .pieces()
                .map(|p| PieceView {
                    id: p.id.0,
                    model: p.model_name(),
                    kind: p.kind,
                    color: p.color,
                    square: p.square,
                })
                .collect(),
            captured: CapturedView {
                white: symbols(Color::White),
                black: symbols(Color::Black),
            },
            moves: notation::move_rows(game.history()),
            movetext: notation::movetext(game.history()),
            last_move: state.last_move().cloned(),
        }
    }
}

// ============================================================================
// REQUESTS
// ============================================================================

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct NewGameRequest {
    pub mode: Option<GameMode>,
    pub player_color: Option<Color>,
    pub difficulty: Option<Difficulty>,
}

#[derive(Deserialize)]
pub struct LegalQuery {
    pub from: Square,
}

#[derive(Serialize)]
pub struct LegalResponse {
    pub from: Square,
    pub destinations: Vec<Square>,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
}

#[derive(Serialize)]
pub struct MoveResponse {
    #[serde(rename = "move")]
    pub record: MoveRecord,
    pub game: GameView,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ResignRequest {
    pub color: Option<Color>,
}

// ============================================================================
// HANDLERS
// ============================================================================

pub async fn current(State(state): State<Arc<AppState>>) -> Json<GameView> {
    Json(GameView::of(&state.session()))
}

/// Replaces the current game with a fresh one.
pub async fn new_game(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewGameRequest>,
) -> Result<Json<GameView>, ApiError> {
    let config = GameConfig {
        mode: request.mode.unwrap_or(state.config.mode),
        player_color: request.player_color.unwrap_or(state.config.player_color),
        difficulty: request.difficulty.unwrap_or(state.config.difficulty),
        ..state.config.clone()
    };

    let session = create_session(&config, Arc::clone(&state.db)).await?;
    let view = GameView::of(&session);
    let old = state.replace_session(session);
    old.close().await;

    Ok(Json(view))
}

pub async fn legal_destinations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LegalQuery>,
) -> Json<LegalResponse> {
    let destinations = state.session().legal_destinations(query.from);
    Json(LegalResponse {
        from: query.from,
        destinations,
    })
}

pub async fn submit_move(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let session = state.session();
    let record = session.submit_move(request.from, request.to)?;
    Ok(Json(MoveResponse {
        record,
        game: GameView::of(&session),
    }))
}

/// Resigns for the given color; defaults to the human in engine games
/// and the side to move otherwise.
pub async fn resign(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResignRequest>,
) -> Result<Json<GameView>, ApiError> {
    let session = state.session();
    let color = request.color.unwrap_or_else(|| {
        let settings = session.settings();
        match settings.mode {
            GameMode::Engine => settings.player_color,
            GameMode::Multiplayer => session.snapshot().turn(),
        }
    });
    session.resign(color)?;
    Ok(Json(GameView::of(&session)))
}
