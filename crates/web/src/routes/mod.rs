use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;

use checkmate3d_core::game::notation;

use crate::AppState;

pub mod game;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub games_count: u32,
    pub mode: String,
    pub difficulty: String,
    pub player_color: String,
    pub status: String,
    pub moves: Vec<notation::MoveRow>,
}

#[derive(Template)]
#[template(path = "games.html")]
pub struct GamesTemplate {
    pub title: String,
    pub games: Vec<GameRow>,
}

pub struct GameRow {
    pub id: i64,
    pub mode: String,
    pub result: String,
    pub termination: String,
    pub plies: u32,
    pub moves: String,
    pub date: String,
}

fn render<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "template rendering failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    let games_count = {
        let db = state.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        db.count_games().unwrap_or(0)
    };
    let session = state.session();
    let settings = session.settings();
    let game = session.snapshot();

    render(IndexTemplate {
        title: "Checkmate3D".to_string(),
        games_count,
        mode: settings.mode.as_str().to_string(),
        difficulty: settings.difficulty.label().to_string(),
        player_color: settings.player_color.to_string(),
        status: game.status().as_str().to_string(),
        moves: notation::move_rows(game.history()),
    })
}

pub async fn games_list(State(state): State<Arc<AppState>>) -> Response {
    let stored_games = {
        let db = state.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        db.get_recent_games(50).unwrap_or_default()
    };

    let games: Vec<GameRow> = stored_games
        .into_iter()
        .map(|g| {
            let date = chrono::DateTime::from_timestamp(g.played_at as i64, 0)
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();

            GameRow {
                id: g.id,
                mode: g.mode,
                result: g.result,
                termination: g.termination,
                plies: g.ply_count,
                moves: g.moves,
                date,
            }
        })
        .collect();

    render(GamesTemplate {
        title: "Finished Games".to_string(),
        games,
    })
}

pub async fn health() -> &'static str {
    "OK"
}
