//! Per-generation history records.
//!
//! After every generation one [`HistoryRecord`] per individual is handed to a
//! [`HistorySink`]. [`HistoryFile`] writes them as semicolon-separated rows:
//!
//! ```text
//! Generation;Bot Index;Bot Identifier;Score;Fitness;Overall Ranking;Weights
//! 1;0;482913;{"win":2,"loss":0,"draw":0};4;4;{"can_castle":-12.5,...}
//! ```
//!
//! `Score` and `Weights` are JSON objects.

use std::io::{self, Write};

use evochess_evaluator::weights::FeatureWeights;
use serde::{Deserialize, Serialize};

use crate::genetic::{BotId, Individual, Tally};

pub const HEADER: &str = "Generation;Bot Index;Bot Identifier;Score;Fitness;Overall Ranking;Weights";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// One-based generation number.
    pub generation: usize,
    /// Position of the individual in the population.
    pub index: usize,
    pub id: BotId,
    pub tally: Tally,
    pub fitness: i64,
    pub overall_ranking: i64,
    pub weights: FeatureWeights,
}

impl HistoryRecord {
    #[must_use]
    pub fn new(generation: usize, index: usize, individual: &Individual) -> Self {
        Self {
            generation,
            index,
            id: individual.id(),
            tally: individual.tally(),
            fitness: individual.fitness(),
            overall_ranking: individual.overall_ranking(),
            weights: *individual.weights(),
        }
    }

    /// Formats the record as one row below [`HEADER`], without a line terminator.
    pub fn to_row(&self) -> Result<String, serde_json::Error> {
        Ok(format!(
            "{};{};{};{};{};{};{}",
            self.generation,
            self.index,
            self.id,
            serde_json::to_string(&self.tally)?,
            self.fitness,
            self.overall_ranking,
            serde_json::to_string(&self.weights)?,
        ))
    }
}

/// Receives history records as generations finish.
pub trait HistorySink {
    fn record(&mut self, record: &HistoryRecord) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl HistorySink for Vec<HistoryRecord> {
    fn record(&mut self, record: &HistoryRecord) -> io::Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Writes history rows to any writer, starting with the [`HEADER`] line.
#[derive(Debug)]
pub struct HistoryFile<W> {
    writer: W,
}

impl<W> HistoryFile<W>
where
    W: Write,
{
    pub fn new(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "{HEADER}")?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W> HistorySink for HistoryFile<W>
where
    W: Write,
{
    fn record(&mut self, record: &HistoryRecord) -> io::Result<()> {
        let row = record.to_row().map_err(io::Error::other)?;
        writeln!(self.writer, "{row}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
