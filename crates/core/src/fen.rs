//! FEN-like position text
//!
//! Six space-separated fields: placement (rank 8 first), side to move,
//! castling rights, en passant square, halfmove clock and fullmove number.
//! The halfmove clock is not tracked and is always written as `0`.

use crate::board::{Board, Color, PieceKind, Square};
use crate::error::{Error, Result};
use crate::game::GameState;
use crate::rules::special::{castling_rights, CastleSide, CastlingRights};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Placement field alone.
pub fn placement(board: &Board) -> String {
    let mut text = String::new();
    for rank in (0..8u8).rev() {
        let mut empty = 0;
        for file in 0..8u8 {
            match Square::new(file, rank).and_then(|square| board.get(square)) {
                Some(piece) => {
                    if empty > 0 {
                        text.push_str(&empty.to_string());
                        empty = 0;
                    }
                    text.push(piece.fen_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            text.push_str(&empty.to_string());
        }
        if rank > 0 {
            text.push('/');
        }
    }
    text
}

fn castling_field(rights: CastlingRights) -> String {
    if rights.none() {
        return "-".to_string();
    }
    [
        (rights.white_king_side, 'K'),
        (rights.white_queen_side, 'Q'),
        (rights.black_king_side, 'k'),
        (rights.black_queen_side, 'q'),
    ]
    .into_iter()
    .filter_map(|(allowed, letter)| allowed.then_some(letter))
    .collect()
}

pub fn to_fen(board: &Board, state: &GameState) -> String {
    let en_passant = state
        .en_passant_target
        .map(|square| square.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{} {} {} {} 0 {}",
        placement(board),
        state.turn.fen_char(),
        castling_field(castling_rights(board)),
        en_passant,
        state.fullmove_number(),
    )
}

fn parse_placement(field: &str) -> Result<Board> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(Error::InvalidFen(format!("expected 8 ranks, got {}", ranks.len())));
    }

    let mut board = Board::empty();
    for (row, rank_text) in ranks.iter().enumerate() {
        let rank = 7 - row as u8;
        let mut file = 0u8;
        for ch in rank_text.chars() {
            if let Some(skip) = ch.to_digit(10) {
                if skip == 0 || u32::from(file) + skip > 8 {
                    return Err(Error::InvalidFen(format!("rank {} overflows", rank + 1)));
                }
                file += skip as u8;
                continue;
            }
            let kind = PieceKind::from_letter(ch)
                .ok_or_else(|| Error::InvalidFen(format!("unknown piece '{}'", ch)))?;
            let color = if ch.is_ascii_uppercase() {
                Color::White
            } else {
                Color::Black
            };
            let square = Square::new(file, rank)
                .ok_or_else(|| Error::InvalidFen(format!("rank {} overflows", rank + 1)))?;
            board.place(kind, color, square);
            file += 1;
        }
        if file != 8 {
            return Err(Error::InvalidFen(format!("rank {} has {} files", rank + 1, file)));
        }
    }

    for color in [Color::White, Color::Black] {
        let kings = board
            .pieces_of(color)
            .filter(|piece| piece.kind == PieceKind::King)
            .count();
        if kings != 1 {
            return Err(Error::InvalidFen(format!("{} has {} kings", color, kings)));
        }
    }
    Ok(board)
}

fn parse_castling(field: &str) -> Result<CastlingRights> {
    let mut rights = CastlingRights::default();
    if field == "-" {
        return Ok(rights);
    }
    for ch in field.chars() {
        match ch {
            'K' => rights.white_king_side = true,
            'Q' => rights.white_queen_side = true,
            'k' => rights.black_king_side = true,
            'q' => rights.black_queen_side = true,
            _ => return Err(Error::InvalidFen(format!("bad castling field '{}'", field))),
        }
    }
    Ok(rights)
}

/// Maps castling rights back onto `has_moved` flags.
///
/// A king keeps its "unmoved" flag only if its color keeps a right; a
/// corner rook only if its side's right is present. Pawns off their home
/// rank count as moved.
fn apply_move_history(board: &mut Board, rights: CastlingRights) {
    let mut updates = Vec::new();
    for piece in board.pieces() {
        let moved = match piece.kind {
            PieceKind::King => {
                !(rights.get(piece.color, CastleSide::KingSide)
                    || rights.get(piece.color, CastleSide::QueenSide))
            }
            PieceKind::Rook => {
                let keeps_right = [CastleSide::KingSide, CastleSide::QueenSide]
                    .into_iter()
                    .any(|side| {
                        rights.get(piece.color, side)
                            && side.rook_squares(piece.color).map(|(home, _)| home)
                                == Some(piece.square)
                    });
                !keeps_right
            }
            PieceKind::Pawn => piece.square.rank() != piece.color.pawn_rank(),
            _ => false,
        };
        updates.push((piece.square, moved));
    }
    for (square, moved) in updates {
        board.set_has_moved(square, moved);
    }
}

/// Parses a FEN string into a board and a fresh game state.
///
/// The status field of the returned state is left as `InProgress`;
/// callers recompute it against the board.
pub fn parse_fen(text: &str) -> Result<(Board, GameState)> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(Error::InvalidFen(format!("expected at least 4 fields: '{}'", text)));
    }

    let mut board = parse_placement(fields[0])?;

    let turn = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(Error::InvalidFen(format!("bad side to move '{}'", other))),
    };

    let rights = parse_castling(fields[2])?;
    apply_move_history(&mut board, rights);

    let en_passant_target = match fields[3] {
        "-" => None,
        name => Some(
            name.parse::<Square>()
                .map_err(|_| Error::InvalidFen(format!("bad en passant square '{}'", name)))?,
        ),
    };

    let fullmove: u32 = match fields.get(5) {
        Some(value) => value
            .parse()
            .map_err(|_| Error::InvalidFen(format!("bad fullmove number '{}'", value)))?,
        None => 1,
    };

    let mut state = GameState::new();
    state.turn = turn;
    state.en_passant_target = en_passant_target;
    state.move_number = fullmove
        .max(1)
        .checked_mul(2)
        .and_then(|plies| plies.checked_add(u32::from(turn == Color::Black)))
        .map(|plies| plies - 1)
        .ok_or_else(|| Error::InvalidFen(format!("fullmove number {} is out of range", fullmove)))?;
    Ok((board, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;

    #[test]
    fn test_starting_position() {
        let game = Game::new();
        assert_eq!(game.fen(), STARTING_FEN);
        assert_eq!(
            placement(game.board()),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"
        );
    }

    #[test]
    fn test_fields_after_double_push() {
        let mut game = Game::new();
        game.play("e2".parse().unwrap(), "e4".parse().unwrap()).unwrap();
        assert_eq!(
            game.fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
        game.play("c7".parse().unwrap(), "c5".parse().unwrap()).unwrap();
        assert!(game.fen().ends_with(" w KQkq c6 0 2"));
    }

    #[test]
    fn test_parse_round_trip() {
        let text = "r3k2r/pp3ppp/2n5/3pP3/8/8/PPP2PPP/R3K2R w Kq d6 0 12";
        let game = Game::from_fen(text).unwrap();
        assert_eq!(game.fen(), text);
        assert_eq!(game.state().move_number, 23);
    }

    #[test]
    fn test_black_to_move_numbering() {
        let text = "4k3/8/8/8/8/8/8/4K3 b - - 0 7";
        let game = Game::from_fen(text).unwrap();
        assert_eq!(game.state().move_number, 14);
        assert_eq!(game.fen(), text);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1").is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1").is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq").is_err());
    }

    #[test]
    fn test_oversized_fields_are_errors() {
        let long_rank = Game::from_fen("k7/8/8/8/8/8/8/K99999999999999999999999999999 w - - 0 1");
        assert!(matches!(long_rank, Err(Error::InvalidFen(_))));
        assert!(matches!(parse_fen("k7/8/8/8/8/8/8/K07 w - - 0 1"), Err(Error::InvalidFen(_))));

        let huge_fullmove = Game::from_fen("k7/8/8/8/8/8/8/K7 w - - 0 4000000000");
        assert!(matches!(huge_fullmove, Err(Error::InvalidFen(_))));
        assert!(Game::from_fen("k7/8/8/8/8/8/8/K7 b - - 0 2000000000").is_ok());
    }
}
