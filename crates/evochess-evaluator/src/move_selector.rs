//! Greedy move selection from a scored game tree.
//!
//! The selected move is one of the root children whose score equals the best child score
//! exactly. Ties are broken uniformly at random with the caller's generator, so a seeded
//! generator gives reproducible games.

use evochess_engine::ChessMove;
use rand::{Rng, seq::IndexedRandom};

use crate::game_tree::ScoredTree;

/// Root moves sharing the best child score, in tree order.
#[must_use]
pub fn best_moves(tree: &ScoredTree) -> Vec<ChessMove> {
    let children = tree.children();
    let best = children
        .iter()
        .map(|(_, child)| child.score())
        .fold(f32::NEG_INFINITY, f32::max);
    children
        .iter()
        .filter(|(_, child)| child.score() == best)
        .map(|(mv, _)| *mv)
        .collect()
}

/// Picks one of the [`best_moves`] uniformly at random.
///
/// Returns `None` if the root has no children.
pub fn select_move<R>(tree: &ScoredTree, rng: &mut R) -> Option<ChessMove>
where
    R: Rng + ?Sized,
{
    best_moves(tree).choose(rng).copied()
}
