//! Plays a game between two engines and prints it
//!
//! Usage: selfplay [white-engine] [black-engine] [max-plies]
//!
//! Each engine is `mock` or a path to a UCI binary. Anything not given on
//! the command line comes from the config file named by CHECKMATE3D_CONFIG.

use checkmate3d_core::engine::{apply_reply, engine_from_config};
use checkmate3d_core::game::notation;
use checkmate3d_core::{Color, Database, Game, GameConfig, GameMode, Result};

const DEFAULT_MAX_PLIES: u32 = 300;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = GameConfig::from_env()?;
    let mut args = std::env::args().skip(1);

    let white_config = GameConfig {
        engine: args.next().unwrap_or_else(|| config.engine.clone()),
        ..config.clone()
    };
    let black_config = GameConfig {
        engine: args.next().unwrap_or_else(|| config.engine.clone()),
        ..config.clone()
    };
    let max_plies = match args.next() {
        Some(arg) => arg.parse().unwrap_or_else(|_| {
            eprintln!("Usage: selfplay [white-engine] [black-engine] [max-plies]");
            std::process::exit(1);
        }),
        None => DEFAULT_MAX_PLIES,
    };

    let mut white = engine_from_config(&white_config).await?;
    let mut black = engine_from_config(&black_config).await?;
    let depth = config.difficulty.depth();

    println!("White: {}  Black: {}  ({})", white_config.engine, black_config.engine, config.difficulty);

    let mut game = Game::new();
    while game.is_active() && (game.history().len() as u32) < max_plies {
        let adapter = match game.turn() {
            Color::White => &mut white,
            Color::Black => &mut black,
        };
        let reply = adapter.request_move(&game.fen(), depth).await;
        if apply_reply(&mut game, reply)?.is_none() {
            break;
        }
    }

    white.shutdown().await?;
    black.shutdown().await?;

    for row in notation::move_rows(game.history()) {
        println!(
            "{:>3}. {:<10} {}",
            row.number,
            row.white.as_deref().unwrap_or("..."),
            row.black.as_deref().unwrap_or("")
        );
    }
    println!();
    println!("{} {}", notation::movetext(game.history()), game.outcome().as_str());
    println!("Final position: {}", game.fen());
    println!("Status: {}", game.status().as_str());

    if !game.is_active() {
        let db = Database::open(&config.database_path)?;
        let id = db.insert_game(&game, GameMode::Engine)?;
        println!("Saved as game #{}", id);
    }

    Ok(())
}
