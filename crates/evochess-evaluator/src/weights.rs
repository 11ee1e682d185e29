//! Weight vectors: one real-valued weight per [`Feature`].

use std::{collections::BTreeMap, ops::Index};

use serde::{Deserialize, Serialize};

use crate::feature::Feature;

/// Lower bound of every weight.
pub const MIN_WEIGHT: f32 = -100.0;
/// Upper bound of every weight.
pub const MAX_WEIGHT: f32 = 100.0;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum WeightsError {
    #[display("unknown feature id '{id}' in weight map")]
    UnknownFeature { id: String },
    #[display("missing weight for feature '{id}'")]
    MissingFeature { id: &'static str },
    #[display("weight {value} for feature '{id}' is outside [-100, 100]")]
    OutOfRange { id: String, value: f32 },
}

/// A complete mapping from every [`Feature`] to its weight in `[MIN_WEIGHT, MAX_WEIGHT]`.
///
/// Serialized as a map keyed by feature id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, f32>",
    into = "BTreeMap<String, f32>"
)]
pub struct FeatureWeights {
    values: [f32; Feature::COUNT],
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl FeatureWeights {
    /// Creates weights by evaluating `f` for every feature. Values are clamped into range.
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(Feature) -> f32,
    {
        Self {
            values: Feature::ALL.map(|feature| clamp(f(feature))),
        }
    }

    #[must_use]
    pub fn uniform(value: f32) -> Self {
        Self::from_fn(|_| value)
    }

    #[must_use]
    pub fn get(&self, feature: Feature) -> f32 {
        self.values[feature.index()]
    }

    /// Sets one weight, clamping it into range.
    pub fn set(&mut self, feature: Feature, value: f32) {
        self.values[feature.index()] = clamp(value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f32)> + '_ {
        Feature::ALL.into_iter().zip(self.values.iter().copied())
    }

    #[must_use]
    pub fn is_within_bounds(&self) -> bool {
        self.values
            .iter()
            .all(|w| (MIN_WEIGHT..=MAX_WEIGHT).contains(w))
    }
}

impl Index<Feature> for FeatureWeights {
    type Output = f32;

    fn index(&self, feature: Feature) -> &f32 {
        &self.values[feature.index()]
    }
}

impl From<FeatureWeights> for BTreeMap<String, f32> {
    fn from(weights: FeatureWeights) -> Self {
        weights
            .iter()
            .map(|(feature, w)| (feature.id().to_owned(), w))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, f32>> for FeatureWeights {
    type Error = WeightsError;

    fn try_from(map: BTreeMap<String, f32>) -> Result<Self, Self::Error> {
        if let Some(id) = map.keys().find(|id| id.parse::<Feature>().is_err()) {
            return Err(WeightsError::UnknownFeature { id: id.clone() });
        }
        let mut values = [0.0; Feature::COUNT];
        for feature in Feature::ALL {
            let value = *map
                .get(feature.id())
                .ok_or(WeightsError::MissingFeature { id: feature.id() })?;
            if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&value) {
                return Err(WeightsError::OutOfRange {
                    id: feature.id().to_owned(),
                    value,
                });
            }
            values[feature.index()] = value;
        }
        Ok(Self { values })
    }
}

fn clamp(value: f32) -> f32 {
    value.clamp(MIN_WEIGHT, MAX_WEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_clamps() {
        let weights = FeatureWeights::from_fn(|f| if f.index() % 2 == 0 { 500.0 } else { -500.0 });
        assert!(weights.is_within_bounds());
        assert_eq!(weights[Feature::FriendlyPawnCount], MAX_WEIGHT);
        assert_eq!(weights[Feature::FriendlyKnightCount], MIN_WEIGHT);
    }

    #[test]
    fn test_serde_map_round_trip() {
        let weights = FeatureWeights::from_fn(|f| f.index() as f32 - 10.0);
        let json = serde_json::to_string(&weights).unwrap();
        assert!(json.contains("\"num_legal_moves\":18.0"));
        let restored: FeatureWeights = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, weights);
    }

    #[test]
    fn test_deserialize_rejects_incomplete_maps() {
        let mut map: BTreeMap<String, f32> = FeatureWeights::uniform(1.0).into();
        map.remove("can_castle");
        let json = serde_json::to_string(&map).unwrap();
        assert!(serde_json::from_str::<FeatureWeights>(&json).is_err());

        let mut map: BTreeMap<String, f32> = FeatureWeights::uniform(1.0).into();
        map.insert("bogus".to_owned(), 1.0);
        let json = serde_json::to_string(&map).unwrap();
        assert!(serde_json::from_str::<FeatureWeights>(&json).is_err());

        let mut map: BTreeMap<String, f32> = FeatureWeights::uniform(1.0).into();
        map.insert("can_castle".to_owned(), 150.0);
        let json = serde_json::to_string(&map).unwrap();
        assert!(serde_json::from_str::<FeatureWeights>(&json).is_err());
    }
}
