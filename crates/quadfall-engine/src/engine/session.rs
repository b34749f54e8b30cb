use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    ConfigError,
    core::{ClearRow, Grid},
};

use super::{
    board::{Board, BoardConfig, OverflowPolicy, ViewData},
    event::{EventKind, EventSource, MoveEvent},
    piece_supply::PieceSeed,
    progression::LevelProgression,
    score_store::{MemoryScoreStore, ScoreStore},
};

const FIXED_DROP_INTERVAL: Duration = Duration::from_millis(400);
const BLITZ_TIME_LIMIT: Duration = Duration::from_secs(120);

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Fixed fall speed; the game ends when a piece cannot spawn.
    #[default]
    #[display("classic")]
    Classic,
    /// Endless: the board is wiped instead of ending the game.
    #[display("zen")]
    Zen,
    /// Two minutes against the clock, falling faster every few lines.
    #[display("blitz")]
    Blitz,
}

impl GameMode {
    pub const ALL: [Self; 3] = [Self::Classic, Self::Zen, Self::Blitz];

    #[must_use]
    pub const fn overflow_policy(self) -> OverflowPolicy {
        match self {
            Self::Classic | Self::Blitz => OverflowPolicy::GameOver,
            Self::Zen => OverflowPolicy::WipeBoard,
        }
    }

    /// Key the mode's best score is stored under.
    #[must_use]
    pub const fn best_score_key(self) -> &'static str {
        match self {
            Self::Classic => "classic.best_score",
            Self::Zen => "zen.best_score",
            Self::Blitz => "blitz.best_score",
        }
    }

    #[must_use]
    pub const fn time_limit(self) -> Option<Duration> {
        match self {
            Self::Classic | Self::Zen => None,
            Self::Blitz => Some(BLITZ_TIME_LIMIT),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub mode: GameMode,
    pub board: BoardConfig,
    /// Rate at which the host calls [`GameSession::increment_frame`].
    pub fps: u64,
    /// Fixed piece sequence; random when absent.
    pub seed: Option<PieceSeed>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::default(),
            board: BoardConfig::default(),
            fps: 60,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
pub enum SessionState {
    Playing,
    Paused,
    GameOver,
    TimeUp,
}

impl SessionState {
    /// Returns `true` once the session has ended, by game over or by the clock.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::GameOver | Self::TimeUp)
    }
}

/// Everything a host needs to react to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// `false` when the command was rejected and nothing changed.
    pub accepted: bool,
    /// Present whenever the command locked a piece, even without cleared rows.
    pub clear: Option<ClearRow>,
    pub view: ViewData,
    /// The grid was wiped to make room for the next piece.
    pub board_cleared: bool,
    /// The session has ended, by game over or time up.
    pub game_over: bool,
    /// New level reached by this command.
    pub level_up: Option<u32>,
}

impl CommandOutcome {
    #[must_use]
    pub fn cleared_lines(&self) -> usize {
        self.clear.as_ref().map_or(0, ClearRow::lines_removed)
    }
}

#[derive(Debug, Clone)]
enum ModeRules {
    FixedSpeed,
    Progressive(LevelProgression),
}

impl ModeRules {
    fn for_mode(mode: GameMode) -> Self {
        match mode {
            GameMode::Classic | GameMode::Zen => Self::FixedSpeed,
            GameMode::Blitz => Self::Progressive(LevelProgression::new()),
        }
    }

    fn drop_interval(&self) -> Duration {
        match self {
            Self::FixedSpeed => FIXED_DROP_INTERVAL,
            Self::Progressive(progression) => progression.drop_speed(),
        }
    }
}

fn duration_to_frames(duration: Duration, fps: u64) -> u64 {
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    millis.saturating_mul(fps) / 1000
}

fn frames_to_duration(frames: u64, fps: u64) -> Duration {
    const NANOS_PER_SEC: u64 = 1_000_000_000;
    let secs = frames / fps;
    let nanos = (frames % fps) * NANOS_PER_SEC / fps;
    Duration::new(secs, u32::try_from(nanos).unwrap_or(0))
}

/// A game of one mode, driven by host commands and frame ticks.
///
/// The host calls [`increment_frame`](Self::increment_frame) `fps` times a
/// second for the automatic fall (and the Blitz clock) and forwards player
/// input through the command methods or [`handle`](Self::handle). Every
/// command returns a [`CommandOutcome`] with a fresh [`ViewData`].
///
/// # Example
///
/// ```
/// use quadfall_engine::{GameMode, GameSession, MemoryScoreStore, SessionConfig};
///
/// let config = SessionConfig {
///     mode: GameMode::Blitz,
///     ..SessionConfig::default()
/// };
/// let mut session = GameSession::new(config, MemoryScoreStore::new()).unwrap();
///
/// let outcome = session.hard_drop();
/// assert!(outcome.accepted);
/// assert!(outcome.clear.is_some());
/// assert!(session.score() > 0);
/// assert_eq!(session.best_score(), session.score());
/// ```
#[derive(Debug, Clone)]
pub struct GameSession<S = MemoryScoreStore> {
    config: SessionConfig,
    board: Board,
    rules: ModeRules,
    state: SessionState,
    store: S,
    best_score: u32,
    total_frames: u64,
    drop_frames: u64,
    remaining_frames: Option<u64>,
    total_cleared_lines: usize,
    completed_pieces: usize,
}

impl<S> GameSession<S>
where
    S: ScoreStore,
{
    pub fn new(config: SessionConfig, store: S) -> Result<Self, ConfigError> {
        if config.fps == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        let overflow = config.mode.overflow_policy();
        let board = match config.seed {
            Some(seed) => Board::with_seed(config.board, overflow, seed)?,
            None => Board::new(config.board, overflow)?,
        };
        let best_score = store.get(config.mode.best_score_key()).unwrap_or(0);
        let rules = ModeRules::for_mode(config.mode);
        debug!(mode = %config.mode, best_score, "session started");
        Ok(Self {
            drop_frames: duration_to_frames(rules.drop_interval(), config.fps).max(1),
            remaining_frames: config
                .mode
                .time_limit()
                .map(|limit| duration_to_frames(limit, config.fps)),
            config,
            board,
            rules,
            state: SessionState::Playing,
            store,
            best_score,
            total_frames: 0,
            total_cleared_lines: 0,
            completed_pieces: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.config.mode
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns a copy of the grid.
    #[must_use]
    pub fn board_matrix(&self) -> Grid {
        self.board.board_matrix()
    }

    #[must_use]
    pub fn view_data(&self) -> ViewData {
        self.board.view_data()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.board.score()
    }

    #[must_use]
    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    #[must_use]
    pub fn can_hold(&self) -> bool {
        self.state.is_playing() && self.board.can_hold()
    }

    /// Current level; always 1 outside Blitz.
    #[must_use]
    pub fn level(&self) -> u32 {
        match &self.rules {
            ModeRules::FixedSpeed => 1,
            ModeRules::Progressive(progression) => progression.level(),
        }
    }

    /// Time between two automatic drops at the current level.
    #[must_use]
    pub fn drop_interval(&self) -> Duration {
        self.rules.drop_interval()
    }

    /// Time left on the clock, for timed modes.
    #[must_use]
    pub fn remaining_time(&self) -> Option<Duration> {
        self.remaining_frames
            .map(|frames| frames_to_duration(frames, self.config.fps))
    }

    /// Time played, counted in frames and excluding pauses.
    #[must_use]
    pub fn duration(&self) -> Duration {
        frames_to_duration(self.total_frames, self.config.fps)
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    #[must_use]
    pub fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    #[must_use]
    pub fn score_store(&self) -> &S {
        &self.store
    }

    pub fn into_score_store(self) -> S {
        self.store
    }

    pub fn toggle_pause(&mut self) {
        self.state = match self.state {
            SessionState::Playing => SessionState::Paused,
            SessionState::Paused => SessionState::Playing,
            finished => finished,
        };
    }

    /// Advances the session by one frame.
    ///
    /// Returns the outcome of the automatic drop when the fall timer expires,
    /// or of the time-up when the clock runs out. Does nothing unless playing.
    pub fn increment_frame(&mut self) -> Option<CommandOutcome> {
        if !self.state.is_playing() {
            return None;
        }
        self.total_frames += 1;

        if let Some(remaining) = &mut self.remaining_frames {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                debug!(score = self.score(), "time up");
                self.state = SessionState::TimeUp;
                return Some(self.outcome(false, None, false, None));
            }
        }

        self.drop_frames = self.drop_frames.saturating_sub(1);
        if self.drop_frames > 0 {
            return None;
        }
        self.drop_frames = duration_to_frames(self.drop_interval(), self.config.fps).max(1);
        Some(self.move_down(EventSource::Automatic))
    }

    pub fn handle(&mut self, event: MoveEvent) -> CommandOutcome {
        match event.kind {
            EventKind::Down => self.move_down(event.source),
            EventKind::Left => self.move_left(),
            EventKind::Right => self.move_right(),
            EventKind::Rotate => self.rotate(),
            EventKind::HardDrop => self.hard_drop(),
            EventKind::Hold => self.hold(),
        }
    }

    /// Moves the piece one row down, or locks it when it cannot move.
    ///
    /// A successful drop from [`EventSource::User`] scores one point.
    pub fn move_down(&mut self, source: EventSource) -> CommandOutcome {
        if !self.state.is_playing() {
            return self.rejected("move down");
        }
        if self.board.move_down() {
            if source.is_user() {
                self.board.add_score(1);
            }
            return self.outcome(true, None, false, None);
        }
        self.lock()
    }

    pub fn move_left(&mut self) -> CommandOutcome {
        if !self.state.is_playing() {
            return self.rejected("move left");
        }
        let accepted = self.board.move_left();
        self.outcome(accepted, None, false, None)
    }

    pub fn move_right(&mut self) -> CommandOutcome {
        if !self.state.is_playing() {
            return self.rejected("move right");
        }
        let accepted = self.board.move_right();
        self.outcome(accepted, None, false, None)
    }

    pub fn rotate(&mut self) -> CommandOutcome {
        if !self.state.is_playing() {
            return self.rejected("rotate");
        }
        let accepted = self.board.rotate();
        self.outcome(accepted, None, false, None)
    }

    /// Drops the piece as far as it goes, one point per row, then locks it.
    pub fn hard_drop(&mut self) -> CommandOutcome {
        if !self.state.is_playing() {
            return self.rejected("hard drop");
        }
        while self.board.move_down() {
            self.board.add_score(1);
        }
        self.lock()
    }

    pub fn hold(&mut self) -> CommandOutcome {
        if !self.state.is_playing() {
            return self.rejected("hold");
        }
        let accepted = self.board.hold();
        self.outcome(accepted, None, false, None)
    }

    /// Starts a new game in the same mode, keeping the best score.
    pub fn new_game(&mut self) -> CommandOutcome {
        self.board.new_game();
        self.rules = ModeRules::for_mode(self.config.mode);
        self.state = SessionState::Playing;
        self.total_frames = 0;
        self.drop_frames = duration_to_frames(self.drop_interval(), self.config.fps).max(1);
        self.remaining_frames = self
            .config
            .mode
            .time_limit()
            .map(|limit| duration_to_frames(limit, self.config.fps));
        self.total_cleared_lines = 0;
        self.completed_pieces = 0;
        debug!(mode = %self.config.mode, "new game");
        self.outcome(true, None, false, None)
    }

    fn lock(&mut self) -> CommandOutcome {
        let Ok(spawn) = self.board.lock_and_spawn() else {
            return self.rejected("lock");
        };
        let lines = spawn.clear.lines_removed();
        self.total_cleared_lines += lines;
        self.completed_pieces += 1;

        let level_up = match &mut self.rules {
            ModeRules::FixedSpeed => None,
            ModeRules::Progressive(progression) => {
                let gained = progression.add_lines(i32::try_from(lines).unwrap_or(i32::MAX));
                (gained > 0).then(|| progression.level())
            }
        };
        if spawn.game_over {
            debug!(score = self.score(), lines = self.total_cleared_lines, "game over");
            self.state = SessionState::GameOver;
        }
        self.outcome(true, Some(spawn.clear), spawn.board_cleared, level_up)
    }

    fn rejected(&self, command: &str) -> CommandOutcome {
        trace!(command, state = ?self.state, "command rejected");
        CommandOutcome {
            accepted: false,
            clear: None,
            view: self.board.view_data(),
            board_cleared: false,
            game_over: self.state.is_finished(),
            level_up: None,
        }
    }

    fn outcome(
        &mut self,
        accepted: bool,
        clear: Option<ClearRow>,
        board_cleared: bool,
        level_up: Option<u32>,
    ) -> CommandOutcome {
        self.update_best_score();
        CommandOutcome {
            accepted,
            clear,
            view: self.board.view_data(),
            board_cleared,
            game_over: self.state.is_finished(),
            level_up,
        }
    }

    fn update_best_score(&mut self) {
        let score = self.board.score();
        if score <= self.best_score {
            return;
        }
        self.best_score = score;
        self.store.set(self.config.mode.best_score_key(), score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Offset, PieceKind};

    fn config(mode: GameMode) -> SessionConfig {
        SessionConfig {
            mode,
            seed: Some(PieceSeed::from_u128(7)),
            ..SessionConfig::default()
        }
    }

    fn session(mode: GameMode) -> GameSession {
        GameSession::new(config(mode), MemoryScoreStore::new()).unwrap()
    }

    /// Fills `rows` completely except columns 4 and 5.
    fn fill_rows_with_gap(session: &mut GameSession, rows: std::ops::Range<i32>) {
        let cell = [[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]];
        for y in rows {
            for x in (0..10).filter(|x| !(4..=5).contains(x)) {
                session
                    .board
                    .grid_mut()
                    .fill_shape(&cell, Offset::new(x, y));
            }
        }
    }

    #[test]
    fn test_zero_fps_is_rejected() {
        let config = SessionConfig {
            fps: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            GameSession::new(config, MemoryScoreStore::new()),
            Err(ConfigError::ZeroFrameRate)
        ));
    }

    #[test]
    fn test_mode_rules() {
        assert!(GameMode::Zen.overflow_policy().is_wipe_board());
        assert!(GameMode::Blitz.overflow_policy().is_game_over());
        assert_eq!(GameMode::Blitz.time_limit(), Some(Duration::from_secs(120)));
        assert_eq!(GameMode::Classic.time_limit(), None);
        assert_eq!(GameMode::Zen.best_score_key(), "zen.best_score");
        assert_eq!(GameMode::Blitz.to_string(), "blitz");
        assert_eq!(serde_json::to_string(&GameMode::Classic).unwrap(), "\"classic\"");
    }

    #[test]
    fn test_session_config_defaults_from_empty_json() {
        let config: SessionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());

        let config: SessionConfig = serde_json::from_str(
            r#"{"mode": "zen", "board": {"width": 12}, "seed": "0000000000000000000000000000002a"}"#,
        )
        .unwrap();
        assert_eq!(config.mode, GameMode::Zen);
        assert_eq!(config.board.width, 12);
        assert_eq!(config.board.height, 25);
        assert_eq!(config.seed, Some(PieceSeed::from_u128(42)));
    }

    #[test]
    fn test_only_user_soft_drop_scores() {
        let mut session = session(GameMode::Classic);
        let outcome = session.move_down(EventSource::User);
        assert!(outcome.accepted);
        assert_eq!(outcome.view.y(), 1);
        assert_eq!(session.score(), 1);

        let outcome = session.move_down(EventSource::Automatic);
        assert!(outcome.accepted);
        assert_eq!(outcome.view.y(), 2);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn test_hard_drop_scores_rows_and_locks() {
        let mut session = session(GameMode::Classic);
        session.board.set_active(PieceKind::O, Offset::new(3, 0));

        let outcome = session.hard_drop();
        assert!(outcome.accepted);
        assert_eq!(outcome.cleared_lines(), 0);
        assert!(outcome.clear.is_some());
        assert!(!outcome.game_over);
        assert_eq!(session.score(), 23);
        assert_eq!(session.completed_pieces(), 1);
        assert_eq!((outcome.view.x(), outcome.view.y()), (3, 0));
        assert_eq!(session.board_matrix().row(24)[4], PieceKind::O.id());
    }

    #[test]
    fn test_line_clear_adds_bonus() {
        let mut session = session(GameMode::Classic);
        fill_rows_with_gap(&mut session, 23..25);
        session.board.set_active(PieceKind::O, Offset::new(3, 0));

        let outcome = session.hard_drop();
        assert_eq!(outcome.cleared_lines(), 2);
        assert_eq!(session.score(), 23 + 200);
        assert_eq!(session.total_cleared_lines(), 2);
        assert_eq!(outcome.level_up, None);
        assert!(session.board_matrix().is_empty());
    }

    #[test]
    fn test_best_score_written_when_exceeded() {
        let mut store = MemoryScoreStore::new();
        store.set("classic.best_score", 10);
        let mut session = GameSession::new(config(GameMode::Classic), store).unwrap();
        assert_eq!(session.best_score(), 10);

        for _ in 0..5 {
            session.move_down(EventSource::User);
        }
        assert_eq!(session.best_score(), 10);
        assert_eq!(session.score_store().get("classic.best_score"), Some(10));

        session.hard_drop();
        assert!(session.score() > 10);
        assert_eq!(session.best_score(), session.score());
        let store = session.into_score_store();
        assert!(store.get("classic.best_score").is_some_and(|best| best > 10));
        assert_eq!(store.get("zen.best_score"), None);
    }

    #[test]
    fn test_best_score_kept_across_new_game() {
        let mut session = session(GameMode::Zen);
        session.hard_drop();
        let best = session.best_score();
        assert!(best > 0);

        let outcome = session.new_game();
        assert!(outcome.accepted);
        assert_eq!(session.score(), 0);
        assert_eq!(session.best_score(), best);
    }

    #[test]
    fn test_pause_blocks_commands_and_frames() {
        let mut session = session(GameMode::Classic);
        session.toggle_pause();
        assert!(session.state().is_paused());

        let before = session.view_data();
        assert!(!session.move_left().accepted);
        assert!(!session.hard_drop().accepted);
        assert!(!session.can_hold());
        for _ in 0..100 {
            assert_eq!(session.increment_frame(), None);
        }
        assert_eq!(session.view_data(), before);
        assert_eq!(session.duration(), Duration::ZERO);

        session.toggle_pause();
        assert!(session.state().is_playing());
        assert!(session.move_left().accepted);
    }

    #[test]
    fn test_automatic_drop_after_interval() {
        let config = SessionConfig {
            fps: 10,
            ..config(GameMode::Classic)
        };
        let mut session = GameSession::new(config, MemoryScoreStore::new()).unwrap();
        // 400 ms at 10 fps
        for _ in 0..3 {
            assert_eq!(session.increment_frame(), None);
        }
        let outcome = session.increment_frame().unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.view.y(), 1);
        assert_eq!(session.score(), 0);
        assert_eq!(session.duration(), Duration::from_millis(400));
    }

    #[test]
    fn test_classic_game_over_is_sticky() {
        let mut session = session(GameMode::Classic);
        let mut game_over = None;
        for _ in 0..100 {
            let outcome = session.hard_drop();
            if outcome.game_over {
                game_over = Some(outcome);
                break;
            }
        }
        let outcome = game_over.unwrap();
        assert!(outcome.accepted);
        assert!(outcome.clear.is_some());
        assert!(session.state().is_game_over());

        let grid = session.board_matrix();
        let rejected = session.hard_drop();
        assert!(!rejected.accepted);
        assert!(rejected.game_over);
        assert_eq!(session.increment_frame(), None);
        session.toggle_pause();
        assert!(session.state().is_game_over());
        assert_eq!(session.board_matrix(), grid);

        session.new_game();
        assert!(session.state().is_playing());
        assert!(session.board_matrix().is_empty());
    }

    #[test]
    fn test_zen_never_ends() {
        let mut session = session(GameMode::Zen);
        let mut wiped = false;
        for _ in 0..100 {
            let outcome = session.hard_drop();
            assert!(outcome.accepted);
            assert!(!outcome.game_over);
            wiped |= outcome.board_cleared;
        }
        assert!(wiped);
        assert!(session.state().is_playing());
    }

    #[test]
    fn test_blitz_level_up_speeds_up_fall() {
        let mut session = session(GameMode::Blitz);
        assert_eq!(session.level(), 1);
        assert_eq!(session.drop_interval(), Duration::from_millis(400));

        if let ModeRules::Progressive(progression) = &mut session.rules {
            progression.add_lines(4);
        }
        fill_rows_with_gap(&mut session, 23..25);
        session.board.set_active(PieceKind::O, Offset::new(3, 0));

        let outcome = session.hard_drop();
        assert_eq!(outcome.cleared_lines(), 2);
        assert_eq!(outcome.level_up, Some(2));
        assert_eq!(session.level(), 2);
        assert_eq!(session.drop_interval(), Duration::from_millis(350));

        session.new_game();
        assert_eq!(session.level(), 1);
    }

    #[test]
    fn test_blitz_time_up() {
        let mut session = session(GameMode::Blitz);
        assert_eq!(session.remaining_time(), Some(Duration::from_secs(120)));

        session.remaining_frames = Some(2);
        session.increment_frame();
        assert!(session.state().is_playing());
        let outcome = session.increment_frame().unwrap();
        assert!(outcome.game_over);
        assert!(!outcome.accepted);
        assert!(session.state().is_time_up());
        assert_eq!(session.remaining_time(), Some(Duration::ZERO));
        assert!(!session.move_left().accepted);

        session.new_game();
        assert_eq!(session.remaining_time(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_handle_dispatches_events() {
        let mut session = session(GameMode::Classic);
        let x = session.view_data().x();

        let outcome = session.handle(MoveEvent::user(EventKind::Left));
        assert_eq!(outcome.view.x(), x - 1);
        let outcome = session.handle(MoveEvent::user(EventKind::Right));
        assert_eq!(outcome.view.x(), x);

        session.handle(MoveEvent::automatic(EventKind::Down));
        assert_eq!(session.score(), 0);
        session.handle(MoveEvent::user(EventKind::Down));
        assert_eq!(session.score(), 1);

        assert!(session.handle(MoveEvent::user(EventKind::Hold)).accepted);
        assert!(!session.handle(MoveEvent::user(EventKind::Hold)).accepted);
        assert!(session.handle(MoveEvent::user(EventKind::HardDrop)).clear.is_some());
    }
}
