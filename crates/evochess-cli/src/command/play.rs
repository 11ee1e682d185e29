use std::{fmt::Write as _, path::PathBuf};

use anyhow::Context;
use evochess_engine::{ChessMove, Position};
use evochess_evaluator::{
    game_simulator::{GameOutcome, GameSimulator},
    game_tree::{Aggregation, SearchOptions},
    weights::FeatureWeights,
};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::{model::WeightsModel, util};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Weights model for white (uniform weight 1 when omitted)
    #[arg(long)]
    white: Option<PathBuf>,
    /// Weights model for black (uniform weight 1 when omitted)
    #[arg(long)]
    black: Option<PathBuf>,
    /// Starting position as FEN
    #[arg(long)]
    fen: Option<String>,
    /// Plies searched per move
    #[arg(long, default_value_t = 1)]
    depth: usize,
    /// Use minimax instead of always-max score propagation
    #[arg(long)]
    minimax: bool,
    #[arg(long, default_value_t = 47)]
    seed: u64,
    /// Also write the replay to this file
    #[arg(long)]
    replay: Option<PathBuf>,
}

fn load_weights(path: Option<&PathBuf>) -> anyhow::Result<FeatureWeights> {
    match path {
        Some(path) => {
            let model = WeightsModel::open(path)?;
            log::info!("loaded model {} from {}", model.name, path.display());
            Ok(model.weights)
        }
        None => Ok(FeatureWeights::uniform(1.0)),
    }
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let white = load_weights(arg.white.as_ref())?;
    let black = load_weights(arg.black.as_ref())?;
    let initial = match &arg.fen {
        Some(fen) => Position::from_fen(fen)?,
        None => Position::new(),
    };
    let options = SearchOptions {
        depth: arg.depth,
        aggregation: if arg.minimax {
            Aggregation::Minimax
        } else {
            Aggregation::AlwaysMax
        },
        parallel: false,
    };

    let simulator = GameSimulator::new(options)?.with_replay(true);
    let mut rng = Pcg32::seed_from_u64(arg.seed);
    let outcome = simulator.play_from(initial, &white, &black, &mut rng)?;
    let moves = outcome
        .moves
        .as_deref()
        .context("Simulator did not record the moves")?;
    let text = render_replay(initial, moves, &outcome)?;

    util::write_text(None, &text)?;
    if let Some(path) = &arg.replay {
        util::write_text(Some(path.as_path()), &text)?;
    }
    Ok(())
}

/// Renders the initial board and the board after every move, followed by the result.
fn render_replay(
    initial: Position,
    moves: &[ChessMove],
    outcome: &GameOutcome,
) -> anyhow::Result<String> {
    let mut text = String::new();
    writeln!(text, "Initial Board:")?;
    writeln!(text, "{}", initial.diagram())?;

    let mut position = initial;
    for (ply, &chess_move) in moves.iter().enumerate() {
        position = position.apply(chess_move)?;
        writeln!(text)?;
        writeln!(text, "Move {}: {chess_move}", ply + 1)?;
        writeln!(text, "{}", position.diagram())?;
    }

    writeln!(text)?;
    writeln!(
        text,
        "Result: {} ({}) after {} plies",
        outcome.result.as_str(),
        outcome.termination,
        outcome.plies
    )?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use evochess_engine::{GameResult, Termination};
    use evochess_evaluator::feature::Feature;

    use super::*;

    #[test]
    fn test_replay_of_mate_in_one() {
        let initial = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let simulator = GameSimulator::new(SearchOptions::default())
            .unwrap()
            .with_replay(true);
        let mut white = FeatureWeights::uniform(0.0);
        white.set(Feature::EnemyInCheckmate, 100.0);
        let black = FeatureWeights::uniform(0.0);
        let mut rng = Pcg32::seed_from_u64(0);
        let outcome = simulator
            .play_from(initial, &white, &black, &mut rng)
            .unwrap();
        assert_eq!(outcome.result, GameResult::WhiteWin);
        assert_eq!(outcome.termination, Termination::Checkmate);

        let moves = outcome.moves.as_deref().unwrap();
        let text = render_replay(initial, moves, &outcome).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Initial Board:");
        assert_eq!(lines[1..9].join("\n"), initial.diagram());
        assert_eq!(lines[10], "Move 1: a1a8");
        assert_eq!(lines[11], "R . . . . . k .");
        assert_eq!(
            lines.last().copied(),
            Some("Result: 1-0 (checkmate) after 1 plies")
        );
    }

    #[test]
    fn test_missing_model_defaults_to_uniform() {
        assert_eq!(load_weights(None).unwrap(), FeatureWeights::uniform(1.0));
    }
}
