use std::path::Path;

use quadfall_engine::{BoardConfig, GameSession, PieceSeed, SessionConfig};

use crate::{command::ModeArg, score_file::ScoreFile};

use self::app::PlayApp;

mod app;
mod event_loop;

const FPS: u64 = 60;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Game mode
    #[clap(long, value_enum, default_value_t)]
    mode: ModeArg,
    /// Number of columns
    #[clap(long, default_value_t = BoardConfig::default().width)]
    width: usize,
    /// Number of rows, including the two hidden spawn rows
    #[clap(long, default_value_t = BoardConfig::default().height)]
    height: usize,
    /// Hexadecimal seed for a reproducible piece sequence
    #[clap(long, value_parser = super::parse_seed)]
    seed: Option<PieceSeed>,
}

impl Default for PlayArg {
    fn default() -> Self {
        let board = BoardConfig::default();
        Self {
            mode: ModeArg::default(),
            width: board.width,
            height: board.height,
            seed: None,
        }
    }
}

pub(crate) fn run(arg: &PlayArg, scores_path: &Path) -> anyhow::Result<()> {
    let PlayArg {
        mode,
        width,
        height,
        seed,
    } = arg;

    let board = BoardConfig {
        width: *width,
        height: *height,
        ..BoardConfig::default()
    };
    let config = SessionConfig {
        mode: (*mode).into(),
        board,
        fps: FPS,
        seed: *seed,
    };
    let store = ScoreFile::open(scores_path)?;
    let session = GameSession::new(config, store)?;
    tracing::info!(mode = %config.mode, width, height, "starting game");

    let mut app = PlayApp::new(session);
    let result = ratatui::run(|terminal| app.run(terminal));
    save_scores(result, app.into_score_store())
}

/// Saves the scores whether or not the game loop failed, then reports the
/// loop's error first.
fn save_scores(result: anyhow::Result<()>, mut store: ScoreFile) -> anyhow::Result<()> {
    let saved = store.save();
    if let Err(err) = &result
        && let Err(save_err) = &saved
    {
        tracing::error!(%err, %save_err, "failed to save best scores after game error");
    }
    result.and(saved)
}

#[cfg(test)]
mod tests {
    use std::{env, fs, process};

    use quadfall_engine::ScoreStore as _;

    use super::*;

    #[test]
    fn test_scores_saved_when_game_loop_fails() {
        let dir = env::temp_dir().join(format!("quadfall-play-{}", process::id()));
        let path = dir.join("best_scores.json");
        let mut store = ScoreFile::open(&path).unwrap();
        store.set("classic.best_score", 900);

        let err = save_scores(Err(anyhow::anyhow!("terminal gone")), store).unwrap_err();
        assert_eq!(err.to_string(), "terminal gone");
        assert_eq!(
            ScoreFile::open(&path).unwrap().get("classic.best_score"),
            Some(900)
        );

        let _ = fs::remove_dir_all(dir);
    }
}
