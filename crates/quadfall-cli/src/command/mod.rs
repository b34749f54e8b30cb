use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use quadfall_engine::{GameMode, PieceSeed};

use crate::logging::{self, LogTarget};

use self::{best_scores::BestScoresArg, play::PlayArg, simulate::SimulateArg};

mod best_scores;
mod play;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[clap(flatten)]
    global: GlobalArgs,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, clap::Args)]
struct GlobalArgs {
    /// JSON file holding the best score of each game mode
    #[clap(long, global = true, default_value = "./data/best_scores.json")]
    scores: PathBuf,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Write logs to this file instead of stderr
    #[clap(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play in the terminal
    Play(#[clap(flatten)] PlayArg),
    /// Play games with random input and report the results
    Simulate(#[clap(flatten)] SimulateArg),
    /// Show the stored best score of each game mode
    BestScores(#[clap(flatten)] BestScoresArg),
}

/// Game mode as typed on the command line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    #[default]
    Classic,
    Zen,
    Blitz,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Classic => GameMode::Classic,
            ModeArg::Zen => GameMode::Zen,
            ModeArg::Blitz => GameMode::Blitz,
        }
    }
}

/// Parses a piece seed written as hexadecimal, with or without `0x`.
fn parse_seed(s: &str) -> Result<PieceSeed, std::num::ParseIntError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u128::from_str_radix(digits, 16).map(PieceSeed::from_u128)
}

pub fn run() -> anyhow::Result<()> {
    let CommandArgs { global, mode } = CommandArgs::parse();
    let mode = mode.unwrap_or(Mode::Play(PlayArg::default()));

    let log_target = match (&global.log_file, &mode) {
        (Some(path), _) => LogTarget::File(path),
        (None, Mode::Play(_)) => LogTarget::Off,
        (None, _) => LogTarget::Stderr,
    };
    logging::init(global.verbose, log_target)?;

    match mode {
        Mode::Play(arg) => play::run(&arg, &global.scores)?,
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::BestScores(arg) => best_scores::run(&arg, &global.scores)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_play() {
        let args = CommandArgs::try_parse_from(["quadfall"]).unwrap();
        assert!(args.mode.is_none());
        assert_eq!(args.global.scores, PathBuf::from("./data/best_scores.json"));
        assert_eq!(args.global.verbose, 0);
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let args = CommandArgs::try_parse_from([
            "quadfall",
            "simulate",
            "--mode",
            "blitz",
            "-vv",
            "--scores",
            "scores.json",
        ])
        .unwrap();
        assert_eq!(args.global.verbose, 2);
        assert_eq!(args.global.scores, PathBuf::from("scores.json"));
        let Some(Mode::Simulate(arg)) = args.mode else {
            panic!("expected simulate, got {:?}", args.mode);
        };
        assert_eq!(GameMode::from(arg.mode), GameMode::Blitz);
    }

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed("2a").unwrap(), PieceSeed::from_u128(42));
        assert_eq!(parse_seed("0x2A").unwrap(), PieceSeed::from_u128(42));
        assert!(parse_seed("xyz").is_err());
    }
}
