//! Generation summaries for progress logging.

use std::fmt;

use crate::genetic::{BotId, Individual};

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSummary {
    /// One-based generation number.
    pub generation: usize,
    pub min_fitness: i64,
    pub mean_fitness: f64,
    pub max_fitness: i64,
    /// Totals over all individuals; every decisive game counts once as a win and once as a loss.
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub survivors: usize,
    pub best_id: Option<BotId>,
    pub best_overall_ranking: i64,
}

impl GenerationSummary {
    /// Summarizes individuals whose fitness has been computed but not yet culled.
    #[must_use]
    pub fn new(generation: usize, individuals: &[Individual]) -> Self {
        let fitness = individuals.iter().map(Individual::fitness);
        let min_fitness = fitness.clone().min().unwrap_or_default();
        let max_fitness = fitness.clone().max().unwrap_or_default();
        #[expect(clippy::cast_precision_loss)]
        let mean_fitness = if individuals.is_empty() {
            0.0
        } else {
            fitness.sum::<i64>() as f64 / individuals.len() as f64
        };
        let best = individuals.iter().max_by_key(|ind| ind.overall_ranking());
        Self {
            generation,
            min_fitness,
            mean_fitness,
            max_fitness,
            wins: individuals.iter().map(|ind| ind.tally().win).sum(),
            losses: individuals.iter().map(|ind| ind.tally().loss).sum(),
            draws: individuals.iter().map(|ind| ind.tally().draw).sum(),
            survivors: individuals.len(),
            best_id: best.map(Individual::id),
            best_overall_ranking: best.map(Individual::overall_ranking).unwrap_or_default(),
        }
    }
}

impl fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {}: fitness min/mean/max {}/{:.2}/{}, {}W/{}L/{}D, {} survivors",
            self.generation,
            self.min_fitness,
            self.mean_fitness,
            self.max_fitness,
            self.wins,
            self.losses,
            self.draws,
            self.survivors,
        )?;
        if let Some(id) = self.best_id {
            write!(f, ", best #{id} (overall {})", self.best_overall_ranking)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use evochess_engine::GameResult;
    use evochess_evaluator::{game_simulator::SimulationError, weights::FeatureWeights};
    use rand::{RngCore, SeedableRng};
    use rand_pcg::Pcg32;

    use super::*;
    use crate::genetic::{MatchRunner, Population};

    #[derive(Debug)]
    struct AlwaysDraw;

    impl MatchRunner for AlwaysDraw {
        fn play_match(
            &self,
            _white: &FeatureWeights,
            _black: &FeatureWeights,
            _rng: &mut dyn RngCore,
        ) -> Result<GameResult, SimulationError> {
            Ok(GameResult::Draw)
        }
    }

    #[test]
    fn test_summary_of_drawn_tournament() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut population = Population::random(6, &mut rng);
        population.play_tournament(&AlwaysDraw, 2, 1, &mut rng).unwrap();
        population.compute_fitness();

        let summary = GenerationSummary::new(1, population.individuals());
        assert_eq!(summary.min_fitness, 2);
        assert_eq!(summary.max_fitness, 2);
        assert!((summary.mean_fitness - 2.0).abs() < f64::EPSILON);
        assert_eq!((summary.wins, summary.losses, summary.draws), (0, 0, 12));
        assert_eq!(summary.survivors, 6);
        assert_eq!(summary.best_overall_ranking, 2);
        assert!(summary.to_string().starts_with("generation 1: fitness min/mean/max 2/2.00/2"));
    }

    #[test]
    fn test_empty_summary() {
        let summary = GenerationSummary::new(1, &[]);
        assert_eq!(summary.best_id, None);
        assert_eq!(summary.mean_fitness, 0.0);
    }
}
