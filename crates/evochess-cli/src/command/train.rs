use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use evochess_evaluator::{game_simulator::GameSimulator, game_tree::Aggregation};
use evochess_training::{
    config::{CullingPolicy, MutationDelta, TrainingConfig},
    history::HistoryFile,
    trainer::Trainer,
    weights::CrossoverStrategy,
};

use crate::{model::WeightsModel, util};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CrossoverArg {
    #[default]
    UniformPartition,
    WeightedAverage,
    SinglePoint,
    BlendAlpha,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum AggregationArg {
    #[default]
    AlwaysMax,
    Minimax,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CullingArg {
    #[default]
    SampleNonNegative,
    Truncation,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// JSON training configuration; when given, the tuning flags below are ignored
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of individuals (even)
    #[arg(long, default_value_t = TrainingConfig::default().population_size)]
    population_size: usize,
    /// Individuals removed each generation
    #[arg(long, default_value_t = TrainingConfig::default().purge_count)]
    purge_count: usize,
    /// Per-feature mutation probability
    #[arg(long, default_value_t = TrainingConfig::default().mutation_probability)]
    mutation_probability: f64,
    /// Lower bound of the uniform mutation delta
    #[arg(long, default_value_t = -10.0, allow_negative_numbers = true)]
    mutation_min: f32,
    /// Upper bound of the uniform mutation delta
    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    mutation_max: f32,
    /// Use a Gaussian mutation delta with this standard deviation instead of the uniform range
    #[arg(long)]
    mutation_sigma: Option<f32>,
    /// Plies searched per move
    #[arg(long, default_value_t = TrainingConfig::default().search_depth)]
    depth: usize,
    #[arg(long, default_value_t = TrainingConfig::default().generations)]
    generations: usize,
    /// Tournament rounds per generation
    #[arg(long, default_value_t = TrainingConfig::default().rounds_per_generation)]
    rounds: usize,
    #[arg(long, default_value_t = TrainingConfig::default().seed)]
    seed: u64,
    #[arg(long, value_enum, default_value_t)]
    crossover: CrossoverArg,
    /// Share of the first parent for weighted-average crossover
    #[arg(long, default_value_t = 0.5)]
    crossover_ratio: f32,
    /// Range extension for blend-alpha crossover
    #[arg(long, default_value_t = 0.5)]
    blend_alpha: f32,
    #[arg(long, value_enum, default_value_t)]
    aggregation: AggregationArg,
    #[arg(long, value_enum, default_value_t)]
    culling: CullingArg,
    /// Worker threads for tournament games
    #[arg(long, default_value_t = TrainingConfig::default().parallelism)]
    parallelism: usize,
    /// Build and score the first ply of every search tree on separate threads
    #[arg(long)]
    parallel_search: bool,
    /// Semicolon-separated history log
    #[arg(long, default_value = "history.csv")]
    history: PathBuf,
    /// Output file path for the best model (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

impl TrainArg {
    fn to_config(&self) -> TrainingConfig {
        let mutation_delta = match self.mutation_sigma {
            Some(sigma) => MutationDelta::Gaussian { sigma },
            None => MutationDelta::Uniform {
                min: self.mutation_min,
                max: self.mutation_max,
            },
        };
        let crossover = match self.crossover {
            CrossoverArg::UniformPartition => CrossoverStrategy::UniformPartition,
            CrossoverArg::WeightedAverage => CrossoverStrategy::WeightedAverage {
                ratio: self.crossover_ratio,
            },
            CrossoverArg::SinglePoint => CrossoverStrategy::SinglePoint,
            CrossoverArg::BlendAlpha => CrossoverStrategy::BlendAlpha {
                alpha: self.blend_alpha,
            },
        };
        let aggregation = match self.aggregation {
            AggregationArg::AlwaysMax => Aggregation::AlwaysMax,
            AggregationArg::Minimax => Aggregation::Minimax,
        };
        let culling = match self.culling {
            CullingArg::SampleNonNegative => CullingPolicy::SampleNonNegative,
            CullingArg::Truncation => CullingPolicy::Truncation,
        };
        TrainingConfig {
            population_size: self.population_size,
            purge_count: self.purge_count,
            mutation_probability: self.mutation_probability,
            mutation_delta,
            search_depth: self.depth,
            generations: self.generations,
            rounds_per_generation: self.rounds,
            seed: self.seed,
            crossover,
            aggregation,
            culling,
            parallelism: self.parallelism,
            parallel_search: self.parallel_search,
        }
    }

    fn load_config(&self) -> anyhow::Result<TrainingConfig> {
        match &self.config {
            Some(path) => util::read_json_file("training config", path),
            None => Ok(self.to_config()),
        }
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let config = arg.load_config()?;
    config
        .validate()
        .context("Invalid training configuration")?;

    let simulator = GameSimulator::new(config.search_options())?;
    let mut trainer = Trainer::new(config, simulator)?;

    let mut history = HistoryFile::new(util::create_file(&arg.history)?)
        .with_context(|| format!("Failed to write history file: {}", arg.history.display()))?;

    log::info!(
        "training {} individuals for {} generations (seed {})",
        trainer.config().population_size,
        trainer.config().generations,
        trainer.config().seed,
    );
    trainer.run(&mut history).context("Training failed")?;

    let best = trainer
        .best()
        .context("Population is empty after training")?;
    log::info!(
        "best individual #{} with overall ranking {}",
        best.id(),
        best.overall_ranking()
    );
    let model = WeightsModel {
        name: format!("bot-{}", best.id()),
        trained_at: Utc::now(),
        generation: trainer.generation(),
        overall_ranking: best.overall_ranking(),
        config: trainer.config().clone(),
        weights: *best.weights(),
    };
    util::write_json(arg.output.as_deref(), &model)?;
    Ok(())
}
