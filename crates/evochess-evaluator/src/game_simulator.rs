//! Full-game simulation between two weight vectors.
//!
//! Each ply, the side to move searches the current position with its own weights and plays
//! the best move (see [`move_selector`](crate::move_selector)). The game runs until
//! checkmate or one of the draw rules ends it.
//!
//! ```rust
//! use evochess_evaluator::{
//!     game_simulator::GameSimulator, game_tree::SearchOptions, weights::FeatureWeights,
//! };
//! use rand::SeedableRng;
//! # use rand_pcg::Pcg32;
//!
//! let simulator = GameSimulator::new(SearchOptions::default())?.with_replay(true);
//! let weights = FeatureWeights::uniform(1.0);
//! let mut rng = Pcg32::seed_from_u64(7);
//! let outcome = simulator.play(&weights, &weights, &mut rng)?;
//! assert_eq!(outcome.moves.map(|m| m.len()), Some(outcome.plies));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use evochess_engine::{
    ChessMove, Color, GameRecord, GameResult, Position, PositionError, Termination,
};
use rand::Rng;

use crate::{
    game_tree::{self, SearchOptions},
    move_selector,
    weights::FeatureWeights,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SimulationError {
    #[display("search depth must be at least 1 to choose a move")]
    ZeroDepth,
    #[display("rules engine failure: {_0}")]
    Position(PositionError),
    #[display("no move could be selected in non-terminal position {fen}")]
    NoMove { fen: String },
}

impl From<PositionError> for SimulationError {
    fn from(e: PositionError) -> Self {
        SimulationError::Position(e)
    }
}

/// Result of one simulated game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOutcome {
    pub result: GameResult,
    pub termination: Termination,
    /// Moves in play order, present when replay recording is enabled.
    pub moves: Option<Vec<ChessMove>>,
    pub plies: usize,
}

#[derive(Debug, Clone)]
pub struct GameSimulator {
    options: SearchOptions,
    record_moves: bool,
}

impl GameSimulator {
    /// Creates a simulator searching with `options`.
    ///
    /// Fails with [`SimulationError::ZeroDepth`] since a depth-0 tree has no moves to pick.
    pub fn new(options: SearchOptions) -> Result<Self, SimulationError> {
        if options.depth == 0 {
            return Err(SimulationError::ZeroDepth);
        }
        Ok(Self {
            options,
            record_moves: false,
        })
    }

    /// Enables or disables recording the move list in [`GameOutcome::moves`].
    #[must_use]
    pub fn with_replay(mut self, record_moves: bool) -> Self {
        self.record_moves = record_moves;
        self
    }

    #[must_use]
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Plays a game from the standard starting position.
    pub fn play<R>(
        &self,
        white: &FeatureWeights,
        black: &FeatureWeights,
        rng: &mut R,
    ) -> Result<GameOutcome, SimulationError>
    where
        R: Rng + ?Sized,
    {
        self.play_from(Position::new(), white, black, rng)
    }

    /// Plays a game from `initial` until it is over.
    pub fn play_from<R>(
        &self,
        initial: Position,
        white: &FeatureWeights,
        black: &FeatureWeights,
        rng: &mut R,
    ) -> Result<GameOutcome, SimulationError>
    where
        R: Rng + ?Sized,
    {
        let mut game = GameRecord::new(initial);
        let (result, termination) = loop {
            if let Some(finished) = game.result() {
                break finished;
            }
            let position = *game.position();
            let mover = position.side_to_move();
            let weights = match mover {
                Color::White => white,
                Color::Black => black,
            };
            let tree = game_tree::search(&position, mover, weights, &self.options)?;
            let chosen = move_selector::select_move(&tree, rng).ok_or_else(|| {
                SimulationError::NoMove {
                    fen: position.to_fen(),
                }
            })?;
            game.push(chosen)?;
        };

        let plies = game.moves().len();
        log::debug!(
            "game over after {plies} plies: {} ({termination})",
            result.as_str()
        );
        Ok(GameOutcome {
            result,
            termination,
            moves: self.record_moves.then(|| game.moves().to_vec()),
            plies,
        })
    }
}
