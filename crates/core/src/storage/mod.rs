//! SQLite archive of finished games

mod db;
mod models;

pub use db::Database;
pub use models::*;
