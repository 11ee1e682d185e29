//! Game-level state on top of [`Position`].
//!
//! A [`Position`] alone cannot tell whether a game is over: the draw rules depend on the
//! halfmove clock and on how often a position has occurred. [`GameRecord`] keeps that
//! history while the game is played.

use std::collections::HashMap;

use chess::{ChessMove, Color};
use serde::{Deserialize, Serialize};

use crate::{Position, PositionError};

/// Halfmoves without a capture or pawn move after which the game is drawn.
pub const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// Occurrences of the same position after which the game is drawn.
pub const FIVEFOLD_REPETITION: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    WhiteWin,
    BlackWin,
    Draw,
}

impl GameResult {
    /// PGN-style result string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::WhiteWin => "1-0",
            GameResult::BlackWin => "0-1",
            GameResult::Draw => "1/2-1/2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    #[display("checkmate")]
    Checkmate,
    #[display("stalemate")]
    Stalemate,
    #[display("insufficient material")]
    InsufficientMaterial,
    #[display("seventy-five-move rule")]
    SeventyFiveMoves,
    #[display("fivefold repetition")]
    FivefoldRepetition,
}

impl Termination {
    /// Result of a game that ended this way with `side_to_move` to play.
    #[must_use]
    pub fn result(self, side_to_move: Color) -> GameResult {
        match (self, side_to_move) {
            (Termination::Checkmate, Color::White) => GameResult::BlackWin,
            (Termination::Checkmate, Color::Black) => GameResult::WhiteWin,
            _ => GameResult::Draw,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameRecord {
    initial: Position,
    position: Position,
    moves: Vec<ChessMove>,
    halfmove_clock: u32,
    occurrences: HashMap<u64, u32>,
}

impl Default for GameRecord {
    fn default() -> Self {
        Self::new(Position::new())
    }
}

impl GameRecord {
    #[must_use]
    pub fn new(initial: Position) -> Self {
        Self {
            initial,
            position: initial,
            moves: vec![],
            halfmove_clock: 0,
            occurrences: HashMap::from([(initial.hash(), 1)]),
        }
    }

    #[must_use]
    pub fn initial(&self) -> &Position {
        &self.initial
    }

    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Moves played so far, in order.
    #[must_use]
    pub fn moves(&self) -> &[ChessMove] {
        &self.moves
    }

    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// Plays a move, updating the clock and repetition history.
    pub fn push(&mut self, chess_move: ChessMove) -> Result<(), PositionError> {
        let next = self.position.apply(chess_move)?;
        if self.position.is_zeroing(chess_move) {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        *self.occurrences.entry(next.hash()).or_default() += 1;
        self.position = next;
        self.moves.push(chess_move);
        Ok(())
    }

    /// Returns how the game ended, or `None` while it is still in progress.
    ///
    /// Checkmate takes precedence over every draw rule.
    #[must_use]
    pub fn termination(&self) -> Option<Termination> {
        let position = &self.position;
        if position.is_checkmate() {
            return Some(Termination::Checkmate);
        }
        if position.is_stalemate() {
            return Some(Termination::Stalemate);
        }
        if position.is_insufficient_material() {
            return Some(Termination::InsufficientMaterial);
        }
        if self.halfmove_clock >= SEVENTY_FIVE_MOVE_PLIES {
            return Some(Termination::SeventyFiveMoves);
        }
        let seen = self
            .occurrences
            .get(&position.hash())
            .copied()
            .unwrap_or_default();
        if seen >= FIVEFOLD_REPETITION {
            return Some(Termination::FivefoldRepetition);
        }
        None
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.termination().is_some()
    }

    /// Classifies a finished game.
    #[must_use]
    pub fn result(&self) -> Option<(GameResult, Termination)> {
        self.termination()
            .map(|t| (t.result(self.position.side_to_move()), t))
    }
}
