//! Chess rules
//!
//! Geometry, check detection, legality and the special moves. All of it
//! reads the board; only `special`'s crate-private executors write to it.

pub mod check;
pub mod geometry;
pub mod special;
pub mod validator;

pub use check::{is_in_check, is_square_attacked};
pub use special::{can_castle, castling_rights, CastleSide, CastlingRights};
pub use validator::{get_all_legal_moves, is_legal, legal_destinations, Move};
