//! Training configuration.
//!
//! [`TrainingConfig`] holds every tunable of a training run. It deserializes from JSON with
//! missing fields taking their defaults, and [`TrainingConfig::validate`] rejects invalid
//! combinations before any game is played.

use evochess_evaluator::game_tree::{Aggregation, SearchOptions};
use rand::{
    Rng,
    distr::{Distribution, Uniform},
};
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::weights::CrossoverStrategy;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population size must be even and at least 2, got {size}")]
    InvalidPopulationSize { size: usize },
    #[display(
        "purge count {purge_count} leaves fewer than 2 survivors in a population of {population_size}"
    )]
    TooFewSurvivors {
        population_size: usize,
        purge_count: usize,
    },
    #[display("search depth must be at least 1")]
    ZeroDepth,
    #[display("number of generations must be at least 1")]
    ZeroGenerations,
    #[display("rounds per generation must be at least 1")]
    ZeroRounds,
    #[display("parallelism must be at least 1")]
    ZeroParallelism,
    #[display("mutation probability {probability} is outside [0, 1]")]
    InvalidMutationProbability { probability: f64 },
    #[display("invalid mutation delta: {reason}")]
    InvalidMutationDelta { reason: String },
    #[display("invalid crossover strategy: {reason}")]
    InvalidCrossover { reason: String },
}

/// How the population is reduced to the survivor target after a tournament.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CullingPolicy {
    /// Sample survivors uniformly among individuals with non-negative fitness; fall back to
    /// the best ones when there are not enough of those.
    #[default]
    SampleNonNegative,
    /// Keep the best individuals.
    Truncation,
}

/// Distribution of the additive mutation delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationDelta {
    Uniform { min: f32, max: f32 },
    Gaussian { sigma: f32 },
}

impl Default for MutationDelta {
    fn default() -> Self {
        MutationDelta::Uniform {
            min: -10.0,
            max: 10.0,
        }
    }
}

impl MutationDelta {
    pub fn distribution(&self) -> Result<DeltaDistribution, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidMutationDelta { reason };
        match *self {
            MutationDelta::Uniform { min, max } => Uniform::new_inclusive(min, max)
                .map(DeltaDistribution::Uniform)
                .map_err(|e| invalid(format!("range {min}..={max}: {e}"))),
            MutationDelta::Gaussian { sigma } => Normal::new(0.0, sigma)
                .map(DeltaDistribution::Gaussian)
                .map_err(|e| invalid(format!("sigma {sigma}: {e}"))),
        }
    }
}

/// Sampler built from a validated [`MutationDelta`].
#[derive(Debug, Clone)]
pub enum DeltaDistribution {
    Uniform(Uniform<f32>),
    Gaussian(Normal<f32>),
}

impl Distribution<f32> for DeltaDistribution {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match self {
            DeltaDistribution::Uniform(d) => d.sample(rng),
            DeltaDistribution::Gaussian(d) => d.sample(rng),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of individuals, must be even.
    pub population_size: usize,
    /// Individuals removed every generation; the rest survive.
    pub purge_count: usize,
    /// Per-feature mutation probability.
    pub mutation_probability: f64,
    pub mutation_delta: MutationDelta,
    /// Plies searched per move decision.
    pub search_depth: usize,
    pub generations: usize,
    /// Tournament rounds per generation; every individual plays once per round.
    pub rounds_per_generation: usize,
    pub seed: u64,
    pub crossover: CrossoverStrategy,
    pub aggregation: Aggregation,
    pub culling: CullingPolicy,
    /// Worker threads for tournament games (1 plays them sequentially).
    pub parallelism: usize,
    /// Build and score the root ply of every search tree on separate threads.
    pub parallel_search: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            population_size: 200,
            purge_count: 100,
            mutation_probability: 0.01,
            mutation_delta: MutationDelta::default(),
            search_depth: 1,
            generations: 100,
            rounds_per_generation: 2,
            seed: 47,
            crossover: CrossoverStrategy::default(),
            aggregation: Aggregation::default(),
            culling: CullingPolicy::default(),
            parallelism: 1,
            parallel_search: false,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.population_size;
        if size < 2 || size % 2 != 0 {
            return Err(ConfigError::InvalidPopulationSize { size });
        }
        if self.purge_count > size - 2 {
            return Err(ConfigError::TooFewSurvivors {
                population_size: size,
                purge_count: self.purge_count,
            });
        }
        if self.search_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }
        if self.rounds_per_generation == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        if self.parallelism == 0 {
            return Err(ConfigError::ZeroParallelism);
        }
        if !(0.0..=1.0).contains(&self.mutation_probability) {
            return Err(ConfigError::InvalidMutationProbability {
                probability: self.mutation_probability,
            });
        }
        self.mutation_delta.distribution()?;
        match self.crossover {
            CrossoverStrategy::WeightedAverage { ratio } if !(0.0..=1.0).contains(&ratio) => {
                return Err(ConfigError::InvalidCrossover {
                    reason: format!("weighted average ratio {ratio} is outside [0, 1]"),
                });
            }
            CrossoverStrategy::BlendAlpha { alpha } if !(alpha >= 0.0 && alpha.is_finite()) => {
                return Err(ConfigError::InvalidCrossover {
                    reason: format!("blend alpha {alpha} must be a non-negative number"),
                });
            }
            _ => {}
        }
        Ok(())
    }

    /// Individuals kept by culling.
    #[must_use]
    pub fn survivor_target(&self) -> usize {
        self.population_size.saturating_sub(self.purge_count)
    }

    #[must_use]
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            depth: self.search_depth,
            aggregation: self.aggregation,
            parallel: self.parallel_search,
        }
    }
}
