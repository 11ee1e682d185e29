//! Training system for evolving evaluation weights through self-play.
//!
//! This crate implements the genetic algorithm that tunes the weights used by
//! `evochess-evaluator`. Individuals play each other, earn fitness from their results, and
//! the weaker part of the population is replaced by children of the survivors.
//!
//! # How Training Works
//!
//! 1. **Population** - Create individuals with uniformly random weights in `[-100, 100]`
//! 2. **Tournament** - Pair individuals up and play full games, several rounds per generation
//! 3. **Fitness** - `2·wins - losses + draws`, summed over generations as the overall ranking
//! 4. **Culling** - Reduce the population to the survivor target
//! 5. **Reproduction** - Refill with crossover and mutation of survivor pairs
//! 6. **Report** - Hand one record per individual to the history sink
//!
//! # Architecture
//!
//! ```text
//! Trainer (generation loop, seeded generator)
//!     ↓ drives
//! Population (tournament, fitness, culling, reproduction)
//!     ↓ plays through
//! MatchRunner (GameSimulator from evochess-evaluator)
//!     ↓ reports to
//! HistorySink (semicolon log file)
//! ```
//!
//! # Modules
//!
//! - [`config`] - Run parameters and their validation
//! - [`genetic`] - Individuals, population phases, the [`genetic::MatchRunner`] seam
//! - [`weights`] - Initialization, crossover strategies, mutation
//! - [`trainer`] - The generation loop
//! - [`history`] - Per-individual records and the semicolon file writer
//! - [`summary`] - Per-generation statistics for logging
//!
//! # Current Limitations
//!
//! - **Pairings are not a round robin**: each round pairs a reshuffled population, so two
//!   individuals may meet more than once while others never meet.
//! - **Coarse fitness**: three results per game cannot separate individuals that play
//!   similarly, which makes selection noisy at small round counts.
//! - **No checkpointing**: only the history log survives a run; the population cannot be
//!   resumed.

pub mod config;
pub mod genetic;
pub mod history;
pub mod summary;
pub mod trainer;
pub mod weights;
