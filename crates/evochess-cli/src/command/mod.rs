use clap::{Parser, Subcommand};

use self::{features::FeaturesArg, play::PlayArg, train::TrainArg};

mod features;
mod play;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve evaluation weights with the genetic algorithm
    Train(#[clap(flatten)] TrainArg),
    /// Play and print one game between two weight models
    Play(#[clap(flatten)] PlayArg),
    /// List the evaluation features
    Features(#[clap(flatten)] FeaturesArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Play(arg) => play::run(&arg)?,
        Mode::Features(arg) => features::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }
}
