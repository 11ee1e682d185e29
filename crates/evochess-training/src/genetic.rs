//! Genetic algorithm over evaluation weight vectors.
//!
//! A [`Population`] holds a fixed number of [`Individual`]s, each a [`FeatureWeights`] vector
//! with its tournament statistics. One generation runs these phases in order:
//!
//! 1. **Tournament** ([`Population::play_tournament`]) - Every round the population is
//!    shuffled and split into pairs `(0, 1), (2, 3), ...`; the first of each pair plays white.
//!    Every individual plays exactly one game per round.
//! 2. **Fitness** ([`Population::compute_fitness`]) - `fitness = 2·wins - losses + draws`,
//!    accumulated into the individual's overall ranking.
//! 3. **Culling** ([`Population::cull`]) - The population shrinks to the survivor target
//!    according to a [`CullingPolicy`].
//! 4. **Reproduction** ([`Population::reproduce`]) - Pairs of distinct survivors produce
//!    children through crossover and mutation until the population is full again.
//! 5. **Reset** ([`Population::reset_tallies`]) - Tallies and fitness go back to zero. The
//!    overall ranking is kept.
//!
//! The whole cycle with reporting is driven by [`Trainer`](crate::trainer::Trainer).
//!
//! # Games
//!
//! Games are played through the [`MatchRunner`] trait. [`GameSimulator`] is the real
//! implementation; tests substitute stubs.
//!
//! # Parallelization
//!
//! Every game of a round gets its own [`Pcg32`] seeded from the caller's generator before any
//! game starts, and tallies are applied only after the whole round has finished. The outcome of
//! a tournament therefore depends on the seed but not on the number of worker threads.

use std::{cmp::Reverse, fmt, panic, thread};

use evochess_engine::GameResult;
use evochess_evaluator::{
    game_simulator::{GameSimulator, SimulationError},
    weights::FeatureWeights,
};
use rand::{
    Rng, RngCore, SeedableRng,
    distr::Distribution,
    seq::{SliceRandom, index},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{
    config::CullingPolicy,
    weights::{self, CrossoverStrategy},
};

/// Plays one game between two weight vectors.
pub trait MatchRunner: Sync {
    fn play_match(
        &self,
        white: &FeatureWeights,
        black: &FeatureWeights,
        rng: &mut dyn RngCore,
    ) -> Result<GameResult, SimulationError>;
}

impl MatchRunner for GameSimulator {
    fn play_match(
        &self,
        white: &FeatureWeights,
        black: &FeatureWeights,
        rng: &mut dyn RngCore,
    ) -> Result<GameResult, SimulationError> {
        self.play(white, black, rng).map(|outcome| outcome.result)
    }
}

/// Identifier of an individual, drawn at random from `0..=1_000_000`.
///
/// Not guaranteed to be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(transparent)]
pub struct BotId(u32);

impl BotId {
    pub const MAX: u32 = 1_000_000;

    pub fn random<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self(rng.random_range(0..=Self::MAX))
    }

    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }
}

/// Wins, losses and draws within one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub win: u32,
    pub loss: u32,
    pub draw: u32,
}

impl Tally {
    #[must_use]
    pub fn fitness(&self) -> i64 {
        2 * i64::from(self.win) - i64::from(self.loss) + i64::from(self.draw)
    }

    #[must_use]
    pub fn games(&self) -> u32 {
        self.win + self.loss + self.draw
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}W/{}L/{}D", self.win, self.loss, self.draw)
    }
}

#[derive(Debug, Clone)]
pub struct Individual {
    id: BotId,
    weights: FeatureWeights,
    tally: Tally,
    fitness: i64,
    overall_ranking: i64,
}

impl Individual {
    /// Creates an individual with zeroed statistics.
    #[must_use]
    pub fn new(id: BotId, weights: FeatureWeights) -> Self {
        Self {
            id,
            weights,
            tally: Tally::default(),
            fitness: 0,
            overall_ranking: 0,
        }
    }

    pub fn random<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let weights = weights::random(rng);
        Self::new(BotId::random(rng), weights)
    }

    #[must_use]
    pub fn id(&self) -> BotId {
        self.id
    }

    #[must_use]
    pub fn weights(&self) -> &FeatureWeights {
        &self.weights
    }

    #[must_use]
    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Fitness of the current generation; zero until [`Population::compute_fitness`] runs.
    #[must_use]
    pub fn fitness(&self) -> i64 {
        self.fitness
    }

    /// Sum of fitness over every generation this individual has lived through.
    #[must_use]
    pub fn overall_ranking(&self) -> i64 {
        self.overall_ranking
    }

    fn record(&mut self, result: GameResult, as_white: bool) {
        match (result, as_white) {
            (GameResult::WhiteWin, true) | (GameResult::BlackWin, false) => self.tally.win += 1,
            (GameResult::WhiteWin, false) | (GameResult::BlackWin, true) => self.tally.loss += 1,
            (GameResult::Draw, _) => self.tally.draw += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    /// Creates `size` individuals with uniformly random weights.
    pub fn random<R>(size: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            individuals: (0..size).map(|_| Individual::random(rng)).collect(),
        }
    }

    #[must_use]
    pub fn from_individuals(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Individual with the highest overall ranking.
    #[must_use]
    pub fn best(&self) -> Option<&Individual> {
        self.individuals.iter().max_by_key(|ind| ind.overall_ranking)
    }

    /// Plays `rounds` tournament rounds, updating tallies.
    ///
    /// Up to `parallelism` games run at the same time. With an odd population the last
    /// individual of each shuffled order sits the round out.
    pub fn play_tournament<M, R>(
        &mut self,
        runner: &M,
        rounds: usize,
        parallelism: usize,
        rng: &mut R,
    ) -> Result<(), SimulationError>
    where
        M: MatchRunner + ?Sized,
        R: Rng + ?Sized,
    {
        for round in 0..rounds {
            self.individuals.shuffle(rng);
            let games = (0..self.individuals.len() / 2)
                .map(|pair| (2 * pair, 2 * pair + 1, rng.next_u64()))
                .collect::<Vec<_>>();
            let results = play_games(&self.individuals, &games, runner, parallelism);
            for ((white, black, _), result) in games.iter().zip(results) {
                let result = result?;
                self.individuals[*white].record(result, true);
                self.individuals[*black].record(result, false);
            }
            log::debug!("round {}/{rounds}: {} games played", round + 1, games.len());
        }
        Ok(())
    }

    /// Computes fitness from the tallies and adds it to the overall ranking.
    pub fn compute_fitness(&mut self) {
        for ind in &mut self.individuals {
            ind.fitness = ind.tally.fitness();
            ind.overall_ranking += ind.fitness;
        }
    }

    /// Shrinks the population to `target` survivors.
    ///
    /// Individuals are ordered by fitness descending, ties broken at random. The
    /// [`CullingPolicy::SampleNonNegative`] policy samples `target` survivors uniformly from
    /// the individuals with non-negative fitness when there are more of them than `target`,
    /// and otherwise keeps the top `target` regardless of sign.
    pub fn cull<R>(&mut self, target: usize, policy: CullingPolicy, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.individuals.shuffle(rng);
        self.individuals.sort_by_key(|ind| Reverse(ind.fitness));

        let non_negative = self
            .individuals
            .iter()
            .take_while(|ind| ind.fitness >= 0)
            .count();
        match policy {
            CullingPolicy::SampleNonNegative if non_negative > target => {
                let mut keep = index::sample(rng, non_negative, target).into_vec();
                keep.sort_unstable();
                let mut candidates = self
                    .individuals
                    .drain(..non_negative)
                    .map(Some)
                    .collect::<Vec<_>>();
                self.individuals = keep
                    .into_iter()
                    .filter_map(|i| candidates[i].take())
                    .collect();
            }
            CullingPolicy::SampleNonNegative => {
                if non_negative < target {
                    log::debug!(
                        "only {non_negative} individuals with non-negative fitness, keeping the top {target}"
                    );
                }
                self.individuals.truncate(target);
            }
            CullingPolicy::Truncation => self.individuals.truncate(target),
        }
    }

    /// Refills the population to `size` with children of the current members.
    ///
    /// Both parents are distinct current members drawn uniformly; children are appended with
    /// fresh identifiers and zeroed statistics.
    ///
    /// # Panics
    ///
    /// Panics if fewer than two individuals are left to act as parents.
    pub fn reproduce<R, D>(
        &mut self,
        size: usize,
        crossover: CrossoverStrategy,
        mutation_probability: f64,
        mutation_delta: &D,
        rng: &mut R,
    ) where
        R: Rng + ?Sized,
        D: Distribution<f32> + ?Sized,
    {
        let parents = self.individuals.len();
        assert!(parents >= 2, "reproduction needs at least two parents");
        while self.individuals.len() < size {
            let pair = index::sample(rng, parents, 2);
            let (p1, p2) = (&self.individuals[pair.index(0)], &self.individuals[pair.index(1)]);
            let mut child = weights::crossover(&p1.weights, &p2.weights, crossover, rng);
            weights::mutate(&mut child, mutation_probability, mutation_delta, rng);
            let id = BotId::random(rng);
            self.individuals.push(Individual::new(id, child));
        }
    }

    /// Zeroes tallies and fitness, keeping overall rankings.
    pub fn reset_tallies(&mut self) {
        for ind in &mut self.individuals {
            ind.tally = Tally::default();
            ind.fitness = 0;
        }
    }
}

fn play_games<M>(
    individuals: &[Individual],
    games: &[(usize, usize, u64)],
    runner: &M,
    parallelism: usize,
) -> Vec<Result<GameResult, SimulationError>>
where
    M: MatchRunner + ?Sized,
{
    let play = |&(white, black, seed): &(usize, usize, u64)| {
        let mut rng = Pcg32::seed_from_u64(seed);
        runner.play_match(
            &individuals[white].weights,
            &individuals[black].weights,
            &mut rng,
        )
    };

    if parallelism <= 1 || games.len() <= 1 {
        return games.iter().map(play).collect();
    }

    let chunk_size = games.len().div_ceil(parallelism);
    thread::scope(|s| {
        let handles = games
            .chunks(chunk_size)
            .map(|chunk| s.spawn(move || chunk.iter().map(play).collect::<Vec<_>>()))
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use evochess_evaluator::{feature::Feature, game_tree::SearchOptions};
    use rand::distr::Uniform;

    use super::*;

    /// White always wins.
    #[derive(Debug, Default)]
    struct WhiteWins {
        games: AtomicUsize,
    }

    impl MatchRunner for WhiteWins {
        fn play_match(
            &self,
            _white: &FeatureWeights,
            _black: &FeatureWeights,
            _rng: &mut dyn RngCore,
        ) -> Result<GameResult, SimulationError> {
            self.games.fetch_add(1, Ordering::Relaxed);
            Ok(GameResult::WhiteWin)
        }
    }

    /// The side with the larger `num_legal_moves` weight wins, equal weights draw.
    #[derive(Debug)]
    struct Stronger;

    impl MatchRunner for Stronger {
        fn play_match(
            &self,
            white: &FeatureWeights,
            black: &FeatureWeights,
            _rng: &mut dyn RngCore,
        ) -> Result<GameResult, SimulationError> {
            let (w, b) = (white[Feature::NumLegalMoves], black[Feature::NumLegalMoves]);
            Ok(if w > b {
                GameResult::WhiteWin
            } else if b > w {
                GameResult::BlackWin
            } else {
                GameResult::Draw
            })
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl MatchRunner for Failing {
        fn play_match(
            &self,
            _white: &FeatureWeights,
            _black: &FeatureWeights,
            _rng: &mut dyn RngCore,
        ) -> Result<GameResult, SimulationError> {
            Err(SimulationError::ZeroDepth)
        }
    }

    fn with_fitness(values: &[i64]) -> Population {
        let individuals = values
            .iter()
            .enumerate()
            .map(|(i, fitness)| {
                let mut ind = Individual::new(
                    BotId(u32::try_from(i).unwrap()),
                    FeatureWeights::uniform(0.0),
                );
                ind.fitness = *fitness;
                ind
            })
            .collect();
        Population::from_individuals(individuals)
    }

    #[test]
    fn test_tally_fitness() {
        let tally = Tally {
            win: 3,
            loss: 5,
            draw: 1,
        };
        assert_eq!(tally.fitness(), 2);
        assert_eq!(tally.games(), 9);
        assert_eq!(Tally::default().fitness(), 0);
    }

    #[test]
    fn test_every_individual_plays_once_per_round() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut population = Population::random(10, &mut rng);
        let runner = WhiteWins::default();
        population.play_tournament(&runner, 3, 1, &mut rng).unwrap();
        assert_eq!(runner.games.load(Ordering::Relaxed), 15);
        for ind in population.individuals() {
            assert_eq!(ind.tally().games(), 3);
            assert_eq!(ind.tally().draw, 0);
        }
        let wins: u32 = population.individuals().iter().map(|i| i.tally().win).sum();
        assert_eq!(wins, 15);
    }

    #[test]
    fn test_parallel_tournament_matches_sequential() {
        let mut rng = Pcg32::seed_from_u64(2);
        let initial = Population::random(8, &mut rng);
        let simulator = GameSimulator::new(SearchOptions::default()).unwrap();

        let mut sequential = initial.clone();
        sequential
            .play_tournament(&simulator, 1, 1, &mut Pcg32::seed_from_u64(9))
            .unwrap();
        let mut parallel = initial;
        parallel
            .play_tournament(&simulator, 1, 3, &mut Pcg32::seed_from_u64(9))
            .unwrap();

        let summary = |p: &Population| {
            p.individuals()
                .iter()
                .map(|i| (i.id(), i.tally()))
                .collect::<Vec<_>>()
        };
        assert_eq!(summary(&sequential), summary(&parallel));
    }

    #[test]
    fn test_tournament_propagates_failures() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut population = Population::random(4, &mut rng);
        assert!(population.play_tournament(&Failing, 1, 2, &mut rng).is_err());
    }

    #[test]
    fn test_compute_fitness_accumulates_ranking() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut population = Population::random(6, &mut rng);
        population.play_tournament(&Stronger, 2, 1, &mut rng).unwrap();
        population.compute_fitness();
        let first = population
            .individuals()
            .iter()
            .map(|i| (i.id(), i.fitness(), i.overall_ranking()))
            .collect::<Vec<_>>();
        for (_, fitness, ranking) in &first {
            assert_eq!(fitness, ranking);
        }

        population.reset_tallies();
        population.play_tournament(&Stronger, 2, 1, &mut rng).unwrap();
        population.compute_fitness();
        for ind in population.individuals() {
            let (_, previous, _) = first.iter().find(|(id, ..)| *id == ind.id()).unwrap();
            assert_eq!(ind.overall_ranking(), previous + ind.fitness());
        }
    }

    #[test]
    fn test_cull_samples_non_negative() {
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..20 {
            let mut population = with_fitness(&[4, -1, 0, 2, 1, -3, 5, 0]);
            population.cull(3, CullingPolicy::SampleNonNegative, &mut rng);
            assert_eq!(population.len(), 3);
            assert!(population.individuals().iter().all(|i| i.fitness() >= 0));
        }
    }

    #[test]
    fn test_cull_sampling_is_not_truncation() {
        let mut rng = Pcg32::seed_from_u64(6);
        let mut kept_low = false;
        for _ in 0..50 {
            let mut population = with_fitness(&[10, 9, 8, 0, 0, 0]);
            population.cull(3, CullingPolicy::SampleNonNegative, &mut rng);
            kept_low |= population.individuals().iter().any(|i| i.fitness() == 0);
        }
        assert!(kept_low);
    }

    #[test]
    fn test_cull_falls_back_to_top_k() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut population = with_fitness(&[-5, 3, -1, -2, 1, -4]);
        population.cull(3, CullingPolicy::SampleNonNegative, &mut rng);
        let kept = population
            .individuals()
            .iter()
            .map(Individual::fitness)
            .collect::<Vec<_>>();
        assert_eq!(kept, vec![3, 1, -1]);
    }

    #[test]
    fn test_cull_truncation() {
        let mut rng = Pcg32::seed_from_u64(8);
        let mut population = with_fitness(&[0, 7, 3, 5, 1, 2]);
        population.cull(2, CullingPolicy::Truncation, &mut rng);
        let kept = population
            .individuals()
            .iter()
            .map(Individual::fitness)
            .collect::<Vec<_>>();
        assert_eq!(kept, vec![7, 5]);
    }

    #[test]
    fn test_reproduce_refills_from_survivors() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut population = Population::from_individuals(vec![
            Individual::new(BotId(1), FeatureWeights::uniform(10.0)),
            Individual::new(BotId(2), FeatureWeights::uniform(-10.0)),
            Individual::new(BotId(3), FeatureWeights::uniform(30.0)),
        ]);
        let delta = Uniform::new_inclusive(-10.0_f32, 10.0).unwrap();
        population.reproduce(
            12,
            CrossoverStrategy::UniformPartition,
            0.0,
            &delta,
            &mut rng,
        );
        assert_eq!(population.len(), 12);
        for child in &population.individuals()[3..] {
            assert_eq!(child.tally(), Tally::default());
            assert_eq!(child.overall_ranking(), 0);
            for (_, w) in child.weights().iter() {
                assert!([10.0, -10.0, 30.0].contains(&w));
            }
            // two distinct parents
            let distinct = child
                .weights()
                .iter()
                .map(|(_, w)| w.to_bits())
                .collect::<std::collections::HashSet<_>>();
            assert_eq!(distinct.len(), 2);
        }
    }

    #[test]
    fn test_reset_keeps_ranking() {
        let mut rng = Pcg32::seed_from_u64(10);
        let mut population = Population::random(4, &mut rng);
        population.play_tournament(&WhiteWins::default(), 1, 1, &mut rng).unwrap();
        population.compute_fitness();
        let rankings = population
            .individuals()
            .iter()
            .map(Individual::overall_ranking)
            .collect::<Vec<_>>();
        population.reset_tallies();
        for (ind, ranking) in population.individuals().iter().zip(rankings) {
            assert_eq!(ind.tally(), Tally::default());
            assert_eq!(ind.fitness(), 0);
            assert_eq!(ind.overall_ranking(), ranking);
        }
    }
}
