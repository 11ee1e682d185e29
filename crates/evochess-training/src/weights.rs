//! Weight vector operators for the genetic algorithm.
//!
//! These are the stateless building blocks used by
//! [`genetic::Population`](crate::genetic::Population): random initialization, crossover and
//! mutation. Every operator takes the random generator explicitly, so a seeded generator makes
//! them reproducible.
//!
//! # Operations
//!
//! - **Initialization**: [`random`] draws every weight uniformly from `[-100, 100]`
//! - **Crossover**: [`crossover`] combines two parents with a [`CrossoverStrategy`]
//! - **Mutation**: [`mutate`] perturbs individual weights with a configured probability
//!
//! Every operator returns weights inside `[-100, 100]`; out-of-range intermediate values are
//! clamped.
//!
//! # Crossover Strategies
//!
//! ## Uniform Partition
//!
//! Half of the features (rounded down) are sampled without replacement and copied from the
//! first parent, the remaining ones from the second. Child values are bit-identical to one
//! of the parents, so the operator never invents new values on its own.
//!
//! ## Weighted Average
//!
//! Every child weight is `ratio · a + (1 - ratio) · b`.
//!
//! ## Single Point
//!
//! A cut index is drawn in `1..29`; features before the cut come from the first parent and
//! the rest from the second.
//!
//! ## BLX-α
//!
//! Every child weight is sampled uniformly from the parents' interval widened by `α` times its
//! length on both sides.

use evochess_evaluator::{
    feature::Feature,
    weights::{FeatureWeights, MAX_WEIGHT, MIN_WEIGHT},
};
use rand::{Rng, distr::Distribution, seq::index};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrossoverStrategy {
    #[default]
    UniformPartition,
    WeightedAverage {
        ratio: f32,
    },
    SinglePoint,
    BlendAlpha {
        alpha: f32,
    },
}

/// Generates weights drawn uniformly from `[MIN_WEIGHT, MAX_WEIGHT]`.
pub fn random<R>(rng: &mut R) -> FeatureWeights
where
    R: Rng + ?Sized,
{
    FeatureWeights::from_fn(|_| rng.random_range(MIN_WEIGHT..=MAX_WEIGHT))
}

/// Combines two parents into a child.
pub fn crossover<R>(
    p1: &FeatureWeights,
    p2: &FeatureWeights,
    strategy: CrossoverStrategy,
    rng: &mut R,
) -> FeatureWeights
where
    R: Rng + ?Sized,
{
    match strategy {
        CrossoverStrategy::UniformPartition => uniform_partition(p1, p2, rng),
        CrossoverStrategy::WeightedAverage { ratio } => {
            FeatureWeights::from_fn(|f| ratio * p1[f] + (1.0 - ratio) * p2[f])
        }
        CrossoverStrategy::SinglePoint => {
            let cut = rng.random_range(1..Feature::COUNT);
            FeatureWeights::from_fn(|f| if f.index() < cut { p1[f] } else { p2[f] })
        }
        CrossoverStrategy::BlendAlpha { alpha } => blx_alpha(p1, p2, alpha, rng),
    }
}

fn uniform_partition<R>(p1: &FeatureWeights, p2: &FeatureWeights, rng: &mut R) -> FeatureWeights
where
    R: Rng + ?Sized,
{
    let mut from_first = [false; Feature::COUNT];
    for i in index::sample(rng, Feature::COUNT, Feature::COUNT / 2) {
        from_first[i] = true;
    }
    FeatureWeights::from_fn(|f| {
        if from_first[f.index()] {
            p1[f]
        } else {
            p2[f]
        }
    })
}

/// BLX-α (blend crossover).
///
/// For parents `x1` and `x2`, with `d = |x2 - x1|`, the child is sampled from
/// `[min - α·d, max + α·d]` intersected with the weight bounds.
fn blx_alpha<R>(p1: &FeatureWeights, p2: &FeatureWeights, alpha: f32, rng: &mut R) -> FeatureWeights
where
    R: Rng + ?Sized,
{
    FeatureWeights::from_fn(|f| {
        let x1 = p1[f];
        let x2 = p2[f];
        let min = f32::min(x1, x2);
        let max = f32::max(x1, x2);
        let d = max - min;
        // Clamped before sampling: `alpha * d` may overflow to infinity.
        let lower = (min - alpha * d).clamp(MIN_WEIGHT, MAX_WEIGHT);
        let upper = (max + alpha * d).clamp(MIN_WEIGHT, MAX_WEIGHT);
        rng.random_range(lower..=upper)
    })
}

/// Mutates weights in place.
///
/// Each weight is independently selected with `probability`; a selected weight gets a delta
/// sampled from `delta` added and is clamped back into range.
///
/// # Panics
///
/// Panics if `probability` is outside `[0, 1]`.
pub fn mutate<R, D>(weights: &mut FeatureWeights, probability: f64, delta: &D, rng: &mut R)
where
    R: Rng + ?Sized,
    D: Distribution<f32> + ?Sized,
{
    for feature in Feature::ALL {
        if rng.random_bool(probability) {
            weights.set(feature, weights[feature] + delta.sample(rng));
        }
    }
}
