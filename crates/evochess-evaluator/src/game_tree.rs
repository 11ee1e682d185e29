//! Fixed-depth game trees and score propagation.
//!
//! Move selection looks ahead by materializing the complete game tree to a fixed number of
//! plies and then scoring it bottom-up.
//!
//! # Building
//!
//! [`GameTree::build`] enumerates every legal move at every node down to `depth` plies. Leaves
//! keep the FEN of their position; internal nodes keep one child per legal move. There is no
//! pruning and no move ordering, so the tree holds `O(b^depth)` nodes where `b` is the
//! branching factor (about 20-40 in typical middlegame positions).
//!
//! A node whose position has no legal moves (mate or stalemate) before the depth is reached
//! becomes an internal node without children.
//!
//! # Scoring
//!
//! [`GameTree::score`] evaluates every leaf from one side's perspective and combines child
//! scores at internal nodes using an [`Aggregation`] policy:
//!
//! - [`Aggregation::AlwaysMax`] takes the maximum at every ply, whichever side is to move
//! - [`Aggregation::Minimax`] maximizes at the perspective side's plies and minimizes at the
//!   opponent's plies
//!
//! An internal node without children always scores `0.0`.
//!
//! [`GameTree::build_parallel`] and [`GameTree::score_parallel`] split the work by root
//! move across threads and produce the same trees as their sequential counterparts.
//!
//! Trees are built for one move decision and dropped afterwards. Nothing is cached between
//! decisions.
//!
//! # Usage
//!
//! ```rust
//! use evochess_engine::{Color, Position};
//! use evochess_evaluator::{
//!     game_tree::{Aggregation, GameTree},
//!     weights::FeatureWeights,
//! };
//!
//! let tree = GameTree::build(&Position::new(), 1);
//! assert_eq!(tree.children().len(), 20);
//!
//! let scored = tree
//!     .score(Color::White, &FeatureWeights::uniform(1.0), Aggregation::AlwaysMax)
//!     .unwrap();
//! assert!(scored.children().iter().all(|(_, child)| child.score() <= scored.score()));
//! ```

use std::{panic, thread};

use evochess_engine::{ChessMove, Color, Position, PositionError};
use serde::{Deserialize, Serialize};

use crate::{position_evaluator, weights::FeatureWeights};

/// How child scores are combined at an internal node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Maximum of the children at every ply.
    #[default]
    AlwaysMax,
    /// Maximum at even plies (the perspective side to move), minimum at odd plies.
    Minimax,
}

impl Aggregation {
    /// Combines the scores of the children of a node `ply` plies below the root.
    ///
    /// Returns `0.0` when there are no children.
    pub fn aggregate<I>(self, ply: usize, scores: I) -> f32
    where
        I: IntoIterator<Item = f32>,
    {
        let minimize = match self {
            Aggregation::AlwaysMax => false,
            Aggregation::Minimax => ply % 2 == 1,
        };
        let mut scores = scores.into_iter();
        let Some(first) = scores.next() else {
            return 0.0;
        };
        if minimize {
            scores.fold(first, f32::min)
        } else {
            scores.fold(first, f32::max)
        }
    }
}

/// Unscored game tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameTree {
    Leaf { fen: String },
    Internal { children: Vec<(ChessMove, GameTree)> },
}

impl GameTree {
    /// Builds the full tree of legal move sequences `depth` plies deep.
    #[must_use]
    pub fn build(position: &Position, depth: usize) -> Self {
        if depth == 0 {
            return GameTree::Leaf {
                fen: position.to_fen(),
            };
        }
        let children = position
            .legal_moves()
            .map(|mv| (mv, Self::build(&position.apply_unchecked(mv), depth - 1)))
            .collect();
        GameTree::Internal { children }
    }

    /// Same as [`Self::build`], with each root move's subtree built on its own thread.
    ///
    /// The children keep legal move generation order, so the result equals the sequential
    /// build.
    #[must_use]
    pub fn build_parallel(position: &Position, depth: usize) -> Self {
        if depth <= 1 {
            return Self::build(position, depth);
        }
        let moves = position.legal_moves().collect::<Vec<_>>();
        let children = thread::scope(|s| {
            let handles = moves
                .iter()
                .map(|mv| {
                    let child = position.apply_unchecked(*mv);
                    s.spawn(move || Self::build(&child, depth - 1))
                })
                .collect::<Vec<_>>();
            moves
                .iter()
                .copied()
                .zip(handles)
                .map(|(mv, handle)| {
                    let subtree = handle.join().unwrap_or_else(|e| panic::resume_unwind(e));
                    (mv, subtree)
                })
                .collect()
        });
        GameTree::Internal { children }
    }

    /// First-ply children, empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[(ChessMove, GameTree)] {
        match self {
            GameTree::Leaf { .. } => &[],
            GameTree::Internal { children } => children,
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, GameTree::Leaf { .. })
    }

    /// Total number of leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            GameTree::Leaf { .. } => 1,
            GameTree::Internal { children } => children.iter().map(|(_, c)| c.leaf_count()).sum(),
        }
    }

    /// Scores every node bottom-up.
    ///
    /// Leaves are evaluated for `perspective`; internal nodes combine their children with
    /// `aggregation`. Fails only if a leaf holds an unparsable FEN.
    pub fn score(
        &self,
        perspective: Color,
        weights: &FeatureWeights,
        aggregation: Aggregation,
    ) -> Result<ScoredTree, PositionError> {
        self.score_at(0, perspective, weights, aggregation)
    }

    /// Same as [`Self::score`], with each root child scored on its own thread.
    ///
    /// Children keep their order and each subtree is scored exactly as in the sequential
    /// walk, so the result equals [`Self::score`].
    pub fn score_parallel(
        &self,
        perspective: Color,
        weights: &FeatureWeights,
        aggregation: Aggregation,
    ) -> Result<ScoredTree, PositionError> {
        let GameTree::Internal { children } = self else {
            return self.score(perspective, weights, aggregation);
        };
        let children = thread::scope(|s| {
            let handles = children
                .iter()
                .map(|(mv, child)| {
                    let handle =
                        s.spawn(move || child.score_at(1, perspective, weights, aggregation));
                    (*mv, handle)
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|(mv, handle)| {
                    let scored = handle.join().unwrap_or_else(|e| panic::resume_unwind(e));
                    scored.map(|scored| (mv, scored))
                })
                .collect::<Result<Vec<_>, _>>()
        })?;
        let score = aggregation.aggregate(0, children.iter().map(|(_, c)| c.score()));
        Ok(ScoredTree::Internal { children, score })
    }

    fn score_at(
        &self,
        ply: usize,
        perspective: Color,
        weights: &FeatureWeights,
        aggregation: Aggregation,
    ) -> Result<ScoredTree, PositionError> {
        match self {
            GameTree::Leaf { fen } => {
                let position = Position::from_fen(fen)?;
                let score = position_evaluator::evaluate(&position, perspective, weights);
                Ok(ScoredTree::Leaf {
                    fen: fen.clone(),
                    score,
                })
            }
            GameTree::Internal { children } => {
                let children = children
                    .iter()
                    .map(|(mv, child)| {
                        child
                            .score_at(ply + 1, perspective, weights, aggregation)
                            .map(|scored| (*mv, scored))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let score = aggregation.aggregate(ply, children.iter().map(|(_, c)| c.score()));
                Ok(ScoredTree::Internal { children, score })
            }
        }
    }
}

/// Game tree with a score on every node.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoredTree {
    Leaf {
        fen: String,
        score: f32,
    },
    Internal {
        children: Vec<(ChessMove, ScoredTree)>,
        score: f32,
    },
}

impl ScoredTree {
    #[must_use]
    pub fn score(&self) -> f32 {
        match self {
            ScoredTree::Leaf { score, .. } | ScoredTree::Internal { score, .. } => *score,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[(ChessMove, ScoredTree)] {
        match self {
            ScoredTree::Leaf { .. } => &[],
            ScoredTree::Internal { children, .. } => children,
        }
    }
}

/// Search parameters for one move decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub depth: usize,
    pub aggregation: Aggregation,
    /// Build and score root subtrees on separate threads.
    pub parallel: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            depth: 1,
            aggregation: Aggregation::AlwaysMax,
            parallel: false,
        }
    }
}

/// Builds and scores the tree for `position` in one step.
pub fn search(
    position: &Position,
    perspective: Color,
    weights: &FeatureWeights,
    options: &SearchOptions,
) -> Result<ScoredTree, PositionError> {
    if options.parallel {
        GameTree::build_parallel(position, options.depth).score_parallel(
            perspective,
            weights,
            options.aggregation,
        )
    } else {
        GameTree::build(position, options.depth).score(perspective, weights, options.aggregation)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn move_set(position: &Position) -> HashSet<ChessMove> {
        position.legal_moves().collect()
    }

    #[test]
    fn test_depth_zero_is_single_leaf() {
        let pos = Position::new();
        let tree = GameTree::build(&pos, 0);
        let GameTree::Leaf { fen } = &tree else {
            panic!("expected a leaf, got {tree:?}");
        };
        assert!(tree.children().is_empty());
        let restored = Position::from_fen(fen).unwrap();
        assert_eq!(move_set(&restored), move_set(&pos));
    }

    #[test]
    fn test_depth_one_fan_out() {
        let tree = GameTree::build(&Position::new(), 1);
        assert!(!tree.is_leaf());
        assert_eq!(tree.children().len(), 20);
        assert!(tree.children().iter().all(|(_, c)| c.is_leaf()));
        let moves = tree.children().iter().map(|(mv, _)| *mv).collect::<HashSet<_>>();
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn test_child_count_matches_legal_moves() {
        let pos =
            Position::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3")
                .unwrap();
        let tree = GameTree::build(&pos, 2);
        assert_eq!(tree.children().len(), pos.legal_move_count());
        for (mv, child) in tree.children() {
            assert_eq!(
                child.children().len(),
                pos.apply(*mv).unwrap().legal_move_count()
            );
        }
    }

    #[test]
    fn test_depth_two_leaf_count() {
        assert_eq!(GameTree::build(&Position::new(), 2).leaf_count(), 400);
    }

    #[test]
    fn test_parallel_build_matches_sequential() {
        let pos = Position::new();
        assert_eq!(GameTree::build_parallel(&pos, 2), GameTree::build(&pos, 2));
        assert_eq!(GameTree::build_parallel(&pos, 1), GameTree::build(&pos, 1));
    }

    #[test]
    fn test_terminal_node_scores_zero() {
        let mate =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        let tree = GameTree::build(&mate, 3);
        assert!(tree.children().is_empty());
        let scored = tree
            .score(Color::White, &FeatureWeights::uniform(1.0), Aggregation::AlwaysMax)
            .unwrap();
        assert_eq!(scored.score(), 0.0);
    }

    #[test]
    fn test_internal_score_is_max_of_children() {
        let tree = GameTree::build(&Position::new(), 2);
        let weights = FeatureWeights::from_fn(|f| f.index() as f32 - 14.0);
        let scored = tree
            .score(Color::White, &weights, Aggregation::AlwaysMax)
            .unwrap();
        for (_, child) in scored.children() {
            let max = child
                .children()
                .iter()
                .map(|(_, c)| c.score())
                .fold(f32::NEG_INFINITY, f32::max);
            assert_eq!(child.score(), max);
        }
        let max = scored
            .children()
            .iter()
            .map(|(_, c)| c.score())
            .fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(scored.score(), max);
    }

    #[test]
    fn test_leaf_scores_use_evaluator() {
        let pos = Position::new();
        let weights = FeatureWeights::uniform(1.0);
        let scored = GameTree::build(&pos, 1)
            .score(Color::White, &weights, Aggregation::AlwaysMax)
            .unwrap();
        for (mv, child) in scored.children() {
            let expected = position_evaluator::evaluate(&pos.apply(*mv).unwrap(), Color::White, &weights);
            assert_eq!(child.score(), expected);
        }
    }

    #[test]
    fn test_aggregation_policies() {
        let scores = [3.0, -1.0, 7.5, 2.0];
        assert_eq!(Aggregation::AlwaysMax.aggregate(0, scores), 7.5);
        assert_eq!(Aggregation::AlwaysMax.aggregate(1, scores), 7.5);
        assert_eq!(Aggregation::Minimax.aggregate(0, scores), 7.5);
        assert_eq!(Aggregation::Minimax.aggregate(1, scores), -1.0);
        assert_eq!(Aggregation::Minimax.aggregate(2, scores), 7.5);
        assert_eq!(Aggregation::AlwaysMax.aggregate(0, []), 0.0);
        assert_eq!(Aggregation::Minimax.aggregate(1, []), 0.0);
    }

    #[test]
    fn test_minimax_differs_from_always_max() {
        let tree = GameTree::build(&Position::new(), 2);
        let weights = FeatureWeights::uniform(1.0);
        let max = tree
            .score(Color::White, &weights, Aggregation::AlwaysMax)
            .unwrap();
        let minimax = tree
            .score(Color::White, &weights, Aggregation::Minimax)
            .unwrap();
        for ((_, a), (_, b)) in max.children().iter().zip(minimax.children()) {
            assert!(b.score() <= a.score());
        }
    }

    #[test]
    fn test_parallel_scoring_matches_sequential() {
        let pos =
            Position::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3")
                .unwrap();
        let weights = FeatureWeights::from_fn(|f| f.index() as f32 * 3.0 - 40.0);
        for depth in [1, 2] {
            let tree = GameTree::build(&pos, depth);
            for aggregation in [Aggregation::AlwaysMax, Aggregation::Minimax] {
                assert_eq!(
                    tree.score_parallel(Color::Black, &weights, aggregation)
                        .unwrap(),
                    tree.score(Color::Black, &weights, aggregation).unwrap(),
                );
            }
        }
    }

    #[test]
    fn test_parallel_scoring_of_leaf() {
        let tree = GameTree::build(&Position::new(), 0);
        let weights = FeatureWeights::uniform(1.0);
        assert_eq!(
            tree.score_parallel(Color::White, &weights, Aggregation::AlwaysMax)
                .unwrap(),
            tree.score(Color::White, &weights, Aggregation::AlwaysMax)
                .unwrap(),
        );
    }

    #[test]
    fn test_search_options() {
        let pos = Position::new();
        let weights = FeatureWeights::uniform(1.0);
        for depth in [1, 2] {
            let options = SearchOptions {
                depth,
                aggregation: Aggregation::Minimax,
                parallel: true,
            };
            let parallel = search(&pos, Color::White, &weights, &options).unwrap();
            let sequential = search(
                &pos,
                Color::White,
                &weights,
                &SearchOptions {
                    parallel: false,
                    ..options
                },
            )
            .unwrap();
            assert_eq!(parallel, sequential);
        }
    }
}
