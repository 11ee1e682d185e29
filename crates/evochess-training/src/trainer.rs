//! Generation loop driving a [`Population`].
//!
//! [`Trainer`] owns the run's single random generator. It is seeded from
//! [`TrainingConfig::seed`] when the trainer is created, draws the initial population from it,
//! and is then passed explicitly to every stochastic step, so a seed reproduces a whole run.

use std::io;

use evochess_evaluator::game_simulator::SimulationError;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::{
    config::{ConfigError, DeltaDistribution, TrainingConfig},
    genetic::{Individual, MatchRunner, Population},
    history::{HistoryRecord, HistorySink},
    summary::GenerationSummary,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum GenerationError {
    #[display("game simulation failed: {_0}")]
    Simulation(SimulationError),
    #[display(
        "population has {actual} individuals after generation {generation}, expected {expected}"
    )]
    PopulationSize {
        generation: usize,
        expected: usize,
        actual: usize,
    },
    #[display("failed to record history: {_0}")]
    History(io::Error),
}

#[derive(Debug)]
pub struct Trainer<M> {
    config: TrainingConfig,
    runner: M,
    delta: DeltaDistribution,
    population: Population,
    generation: usize,
    rng: Pcg64,
}

impl<M> Trainer<M>
where
    M: MatchRunner,
{
    /// Validates `config` and creates the initial random population.
    pub fn new(config: TrainingConfig, runner: M) -> Result<Self, ConfigError> {
        config.validate()?;
        let delta = config.mutation_delta.distribution()?;
        let mut rng = Pcg64::seed_from_u64(config.seed);
        let population = Population::random(config.population_size, &mut rng);
        Ok(Self {
            config,
            runner,
            delta,
            population,
            generation: 0,
            rng,
        })
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Number of completed generations.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Individual with the highest overall ranking.
    #[must_use]
    pub fn best(&self) -> Option<&Individual> {
        self.population.best()
    }

    /// Runs one full generation and reports every individual to `sink`.
    ///
    /// Records are emitted after reproduction and before the tallies are reset, so survivors
    /// report this generation's results and children report zeros.
    pub fn run_generation<S>(&mut self, sink: &mut S) -> Result<GenerationSummary, GenerationError>
    where
        S: HistorySink + ?Sized,
    {
        let generation = self.generation + 1;
        let config = &self.config;

        self.population
            .play_tournament(
                &self.runner,
                config.rounds_per_generation,
                config.parallelism,
                &mut self.rng,
            )
            .map_err(GenerationError::Simulation)?;
        self.population.compute_fitness();
        let mut summary = GenerationSummary::new(generation, self.population.individuals());

        self.population
            .cull(config.survivor_target(), config.culling, &mut self.rng);
        summary.survivors = self.population.len();

        self.population.reproduce(
            config.population_size,
            config.crossover,
            config.mutation_probability,
            &self.delta,
            &mut self.rng,
        );
        if self.population.len() != config.population_size {
            return Err(GenerationError::PopulationSize {
                generation,
                expected: config.population_size,
                actual: self.population.len(),
            });
        }

        for (index, individual) in self.population.individuals().iter().enumerate() {
            sink.record(&HistoryRecord::new(generation, index, individual))
                .map_err(GenerationError::History)?;
        }
        sink.flush().map_err(GenerationError::History)?;

        self.population.reset_tallies();
        self.generation = generation;
        log::info!("{summary}");
        Ok(summary)
    }

    /// Runs the configured number of generations.
    pub fn run<S>(&mut self, sink: &mut S) -> Result<Vec<GenerationSummary>, GenerationError>
    where
        S: HistorySink + ?Sized,
    {
        let total = self.config.generations;
        let mut summaries = Vec::with_capacity(total);
        for _ in 0..total {
            log::info!("generation {} / {total}", self.generation + 1);
            summaries.push(self.run_generation(sink)?);
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use evochess_engine::GameResult;
    use evochess_evaluator::weights::FeatureWeights;
    use rand::{Rng, RngCore};

    use super::*;
    use crate::genetic::Tally;

    #[derive(Debug)]
    struct WhiteWins;

    impl MatchRunner for WhiteWins {
        fn play_match(
            &self,
            _white: &FeatureWeights,
            _black: &FeatureWeights,
            _rng: &mut dyn RngCore,
        ) -> Result<GameResult, SimulationError> {
            Ok(GameResult::WhiteWin)
        }
    }

    #[derive(Debug)]
    struct CoinFlip;

    impl MatchRunner for CoinFlip {
        fn play_match(
            &self,
            _white: &FeatureWeights,
            _black: &FeatureWeights,
            rng: &mut dyn RngCore,
        ) -> Result<GameResult, SimulationError> {
            Ok(match rng.random_range(0..3) {
                0 => GameResult::WhiteWin,
                1 => GameResult::BlackWin,
                _ => GameResult::Draw,
            })
        }
    }

    fn small_config() -> TrainingConfig {
        TrainingConfig {
            population_size: 4,
            purge_count: 2,
            generations: 1,
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = TrainingConfig {
            population_size: 5,
            ..small_config()
        };
        assert!(Trainer::new(config, WhiteWins).is_err());
    }

    #[test]
    fn test_full_generation_cycle() {
        let mut trainer = Trainer::new(small_config(), WhiteWins).unwrap();
        let mut records: Vec<HistoryRecord> = Vec::new();
        let summary = trainer.run_generation(&mut records).unwrap();

        assert_eq!(trainer.generation(), 1);
        assert_eq!(trainer.population().len(), 4);
        assert_eq!(summary.survivors, 2);
        assert_eq!(summary.wins + summary.losses + summary.draws, 8);

        for ind in trainer.population().individuals() {
            assert_eq!(ind.tally(), Tally::default());
            assert_eq!(ind.fitness(), 0);
        }

        assert_eq!(records.len(), 4);
        for (index, record) in records.iter().enumerate() {
            assert_eq!(record.generation, 1);
            assert_eq!(record.index, index);
            assert_eq!(record.overall_ranking, record.fitness);
            let ind = &trainer.population().individuals()[index];
            assert_eq!(ind.id(), record.id);
            assert_eq!(ind.overall_ranking(), record.fitness);
        }
        for survivor in &records[..2] {
            assert_eq!(survivor.tally.games(), 2);
            assert_eq!(survivor.fitness, survivor.tally.fitness());
        }
        for child in &records[2..] {
            assert_eq!(child.tally, Tally::default());
            assert_eq!(child.overall_ranking, 0);
        }
    }

    #[test]
    fn test_run_all_generations() {
        let config = TrainingConfig {
            population_size: 8,
            purge_count: 4,
            generations: 3,
            ..TrainingConfig::default()
        };
        let mut trainer = Trainer::new(config, CoinFlip).unwrap();
        let mut records: Vec<HistoryRecord> = Vec::new();
        let summaries = trainer.run(&mut records).unwrap();
        assert_eq!(summaries.len(), 3);
        assert_eq!(records.len(), 24);
        assert_eq!(trainer.population().len(), 8);
        assert!(
            trainer
                .population()
                .individuals()
                .iter()
                .all(|ind| ind.weights().is_within_bounds())
        );
        let generations = records.iter().map(|r| r.generation).collect::<Vec<_>>();
        assert!(generations.is_sorted());
        assert_eq!(generations.last(), Some(&3));
    }

    #[test]
    fn test_same_seed_same_history() {
        let run = || {
            let config = TrainingConfig {
                population_size: 6,
                purge_count: 2,
                generations: 2,
                parallelism: 2,
                ..TrainingConfig::default()
            };
            let mut trainer = Trainer::new(config, CoinFlip).unwrap();
            let mut records: Vec<HistoryRecord> = Vec::new();
            trainer.run(&mut records).unwrap();
            records
        };
        assert_eq!(run(), run());
    }
}
