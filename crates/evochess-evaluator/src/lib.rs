//! Evaluation and move selection for evolved chess players.
//!
//! This crate implements a three-level architecture:
//!
//! 1. **Position Evaluation** ([`position_evaluator`]) - Scores a single position for one side
//!    as a weighted sum of [`feature`] values.
//!
//! 2. **Tree Search** ([`game_tree`]) - Builds the full tree of legal continuations to a fixed
//!    depth and propagates leaf scores to the root.
//!
//! 3. **Game Simulation** ([`game_simulator`]) - Plays a complete game between two weight
//!    vectors, picking each move from the scored tree ([`move_selector`]).
//!
//! # Architecture
//!
//! ```text
//! Game Simulation (one full game per pairing)
//!     ↓ uses
//! Tree Search + Move Selection (one decision per ply)
//!     ↓ uses
//! Position Evaluation (score one leaf)
//! ```
//!
//! # Linear Evaluation Model
//!
//! Every feature yields an integer raw value. Its contribution is `sign × raw × weight`, where
//! the sign is fixed per feature and the weight is what training evolves ([`weights`]). Boolean
//! features are encoded as `±1` so they always contribute their full weight.
//!
//! # Current Limitations
//!
//! - **No pruning**: the tree is materialized completely, so depth beyond 2-3 plies gets
//!   expensive quickly.
//! - **No memoization**: positions reached by transposition are evaluated once per path.
//! - **Greedy root choice**: with the default [`game_tree::Aggregation::AlwaysMax`] policy,
//!   opponent replies are assumed to be as good for us as our own moves.

pub mod feature;
pub mod game_simulator;
pub mod game_tree;
pub mod move_selector;
pub mod position_evaluator;
pub mod weights;
