//! Position evaluation: scoring one board position for one side.
//!
//! This is the leaf-level evaluation used by the game tree. The score is a linear
//! combination of the raw feature values:
//!
//! ```text
//! score = Σ sign(fᵢ) · raw(fᵢ) · wᵢ
//! ```
//!
//! Where `sign(fᵢ)` is `+1` for [`FeatureSignal::Positive`] features and `-1` for
//! [`FeatureSignal::Negative`] ones, and `wᵢ` is the evolved weight in `[-100, 100]`.
//!
//! Features are summed in [`Feature::ALL`] order, so evaluating the same position with the
//! same weights always produces a bit-identical score.
//!
//! # Usage
//!
//! ```rust
//! use evochess_engine::{Color, Position};
//! use evochess_evaluator::{position_evaluator, weights::FeatureWeights};
//!
//! let weights = FeatureWeights::uniform(1.0);
//! let score = position_evaluator::evaluate(&Position::new(), Color::White, &weights);
//! assert_eq!(score, 33.0);
//! ```
//!
//! [`FeatureSignal::Positive`]: crate::feature::FeatureSignal::Positive
//! [`FeatureSignal::Negative`]: crate::feature::FeatureSignal::Negative

use evochess_engine::{Color, Position};

use crate::{
    feature::{Feature, PositionAnalysis},
    weights::FeatureWeights,
};

/// Scores `position` for `perspective` with the given weights.
#[must_use]
pub fn evaluate(position: &Position, perspective: Color, weights: &FeatureWeights) -> f32 {
    let analysis = PositionAnalysis::new(position, perspective);
    Feature::ALL
        .iter()
        .map(|f| contribution(*f, &analysis, weights))
        .sum()
}

#[expect(clippy::cast_precision_loss)]
fn contribution(feature: Feature, analysis: &PositionAnalysis<'_>, weights: &FeatureWeights) -> f32 {
    feature.signal().sign() * feature.extract_raw(analysis) as f32 * weights[feature]
}
