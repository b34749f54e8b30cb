use std::path::PathBuf;

use quadfall_engine::{
    GameMode, GameSession, MemoryScoreStore, PieceSeed, SessionConfig, SessionState,
};
use rand::{Rng, SeedableRng as _, rngs::StdRng};
use serde::Serialize;

use crate::{command::ModeArg, util::Output};

/// Frames that pass while the random player positions each piece.
const FRAMES_PER_PIECE: usize = 20;
const HOLD_PROBABILITY: f64 = 0.1;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Game mode
    #[clap(long, value_enum, default_value_t)]
    pub(super) mode: ModeArg,
    /// Number of games to play
    #[clap(long, default_value_t = 10)]
    games: usize,
    /// Stop a game after this many locked pieces
    #[clap(long, default_value_t = 1000)]
    max_pieces: usize,
    /// Hexadecimal seed of the first game; game `i` uses `seed + i`
    #[clap(long, value_parser = super::parse_seed)]
    seed: Option<PieceSeed>,
    /// Output file path (JSON); stdout when omitted
    #[clap(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum EndReason {
    GameOver,
    TimeUp,
    PieceLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct GameReport {
    game: usize,
    seed: PieceSeed,
    score: u32,
    lines: usize,
    pieces: usize,
    level: u32,
    frames: usize,
    end: EndReason,
}

#[derive(Debug, Clone, Serialize)]
struct SimulationReport {
    mode: GameMode,
    max_score: u32,
    mean_score: f64,
    games: Vec<GameReport>,
}

impl SimulationReport {
    #[expect(clippy::cast_precision_loss)]
    fn new(mode: GameMode, games: Vec<GameReport>) -> Self {
        let max_score = games.iter().map(|game| game.score).max().unwrap_or(0);
        let total: u64 = games.iter().map(|game| u64::from(game.score)).sum();
        let mean_score = if games.is_empty() {
            0.0
        } else {
            total as f64 / games.len() as f64
        };
        Self {
            mode,
            max_score,
            mean_score,
            games,
        }
    }
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        mode,
        games,
        max_pieces,
        seed,
        output,
    } = arg;
    let mode = GameMode::from(*mode);
    let base_seed = seed.unwrap_or_else(|| rand::rng().random());
    tracing::info!(%mode, games, seed = ?base_seed, "simulation started");

    let mut reports = Vec::with_capacity(*games);
    for game in 0..*games {
        let seed = PieceSeed::from_u128(base_seed.as_u128().wrapping_add(game as u128));
        let report = play_game(mode, game, seed, *max_pieces)?;
        tracing::info!(
            game,
            score = report.score,
            lines = report.lines,
            pieces = report.pieces,
            end = ?report.end,
            "game finished"
        );
        reports.push(report);
    }

    let report = SimulationReport::new(mode, reports);
    eprintln!(
        "{} games of {mode}: max score {}, mean score {:.1}",
        report.games.len(),
        report.max_score,
        report.mean_score
    );
    Output::save_json(&report, output.clone())
}

#[expect(clippy::cast_possible_truncation)]
fn policy_rng(seed: PieceSeed) -> StdRng {
    StdRng::seed_from_u64(seed.as_u128() as u64)
}

/// Plays one game with random moves until it ends or reaches `max_pieces`.
fn play_game(
    mode: GameMode,
    game: usize,
    seed: PieceSeed,
    max_pieces: usize,
) -> anyhow::Result<GameReport> {
    let config = SessionConfig {
        mode,
        seed: Some(seed),
        ..SessionConfig::default()
    };
    let mut session = GameSession::new(config, MemoryScoreStore::new())?;
    let mut rng = policy_rng(seed);
    let mut frames = 0;

    let end = loop {
        match session.state() {
            SessionState::GameOver => break EndReason::GameOver,
            SessionState::TimeUp => break EndReason::TimeUp,
            SessionState::Playing | SessionState::Paused => {}
        }
        if session.completed_pieces() >= max_pieces {
            break EndReason::PieceLimit;
        }
        frames += play_piece(&mut session, &mut rng);
    };

    Ok(GameReport {
        game,
        seed,
        score: session.score(),
        lines: session.total_cleared_lines(),
        pieces: session.completed_pieces(),
        level: session.level(),
        frames,
        end,
    })
}

/// Moves the current piece randomly, lets some frames pass, then hard drops
/// it unless gravity already locked it. Returns the number of frames played.
fn play_piece<R>(session: &mut GameSession, rng: &mut R) -> usize
where
    R: Rng + ?Sized,
{
    if rng.random_bool(HOLD_PROBABILITY) {
        session.hold();
    }
    for _ in 0..rng.random_range(0..4) {
        session.rotate();
    }
    let shift: i32 = rng.random_range(-5..=5);
    for _ in 0..shift.unsigned_abs() {
        if shift < 0 {
            session.move_left();
        } else {
            session.move_right();
        }
    }

    let pieces = session.completed_pieces();
    for frame in 1..=FRAMES_PER_PIECE {
        session.increment_frame();
        if session.state().is_finished() || session.completed_pieces() > pieces {
            return frame;
        }
    }
    session.hard_drop();
    FRAMES_PER_PIECE
}
