//! Chess rules adapter for the evolutionary trainer.
//!
//! Move generation, attack tables and FEN parsing come from the [`chess`] crate. This crate
//! wraps them into the small query surface the evaluator needs ([`Position`]) and adds the
//! game-level bookkeeping the crate lacks ([`GameRecord`]): halfmove clock, repetition
//! history, and classification of finished games including the draw rules.

pub use chess::{BitBoard, ChessMove, Color, Piece, Square};

pub use self::{
    game_record::{GameRecord, GameResult, Termination},
    position::{Position, square_distance},
};

pub mod game_record;
pub mod position;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PositionError {
    #[display("malformed FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },
    #[display("illegal move {chess_move} in position '{fen}'")]
    IllegalMove { chess_move: String, fen: String },
}
