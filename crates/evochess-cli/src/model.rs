use std::path::Path;

use chrono::{DateTime, Utc};
use evochess_evaluator::weights::FeatureWeights;
use evochess_training::config::TrainingConfig;
use serde::{Deserialize, Serialize};

use crate::util;

/// Trained weights saved at the end of a run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeightsModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    /// Generations completed when the model was saved.
    pub generation: usize,
    pub overall_ranking: i64,
    pub config: TrainingConfig,
    pub weights: FeatureWeights,
}

impl WeightsModel {
    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        util::read_json_file("weights model", path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use evochess_evaluator::feature::Feature;

    use super::*;

    #[test]
    fn test_model_json_shape() {
        let mut weights = FeatureWeights::uniform(0.0);
        weights.set(Feature::NumLegalMoves, 42.0);
        let model = WeightsModel {
            name: "bot-17".to_owned(),
            trained_at: Utc::now(),
            generation: 3,
            overall_ranking: 12,
            config: TrainingConfig::default(),
            weights,
        };
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["weights"]["num_legal_moves"], 42.0);
        assert_eq!(json["config"]["population_size"], 200);

        let back: WeightsModel = serde_json::from_value(json).unwrap();
        assert_eq!(back.weights, model.weights);
        assert_eq!(back.trained_at, model.trained_at);
    }
}
