use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use quadfall_engine::{CommandOutcome, EventKind, GameSession, MoveEvent, ScoreStore, SessionState};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Flex, Layout},
    text::Line,
    widgets::Block as BlockWidget,
};

use crate::ui::widgets::{
    BoardDisplay, KeyBinding, KeyBindingDisplay, PieceDisplay, SessionStats, SessionStatsDisplay,
};

use super::event_loop::{EventLoop, LoopEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Move(EventKind),
    TogglePause,
    NewGame,
    Quit,
}

fn key_action(key: KeyEvent) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c' | 'C')).then_some(KeyAction::Quit);
    }
    let action = match key.code {
        KeyCode::Left => KeyAction::Move(EventKind::Left),
        KeyCode::Right => KeyAction::Move(EventKind::Right),
        KeyCode::Down => KeyAction::Move(EventKind::Down),
        KeyCode::Char(' ') => KeyAction::Move(EventKind::HardDrop),
        KeyCode::Up | KeyCode::Char('x' | 'X') => KeyAction::Move(EventKind::Rotate),
        KeyCode::Char('c' | 'C') => KeyAction::Move(EventKind::Hold),
        KeyCode::Char('p' | 'P') => KeyAction::TogglePause,
        KeyCode::Char('n' | 'N') => KeyAction::NewGame,
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => KeyAction::Quit,
        _ => return None,
    };
    Some(action)
}

const PLAYING_KEYS: &[KeyBinding] = &[
    (&["←", "→"], "Move"),
    (&["↓"], "Soft Drop"),
    (&["Space"], "Hard Drop"),
    (&["↑", "X"], "Rotate"),
    (&["C"], "Hold"),
    (&["P"], "Pause"),
    (&["N"], "New"),
    (&["Q"], "Quit"),
];
const PAUSED_KEYS: &[KeyBinding] = &[(&["P"], "Resume"), (&["N"], "New"), (&["Q"], "Quit")];
const FINISHED_KEYS: &[KeyBinding] = &[(&["N"], "New Game"), (&["Q"], "Quit")];

/// Short message shown above the board for a moment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Notice {
    text: String,
    frames_left: u64,
}

fn line_clear_name(lines: usize) -> &'static str {
    match lines {
        1 => "SINGLE",
        2 => "DOUBLE",
        3 => "TRIPLE",
        _ => "QUAD",
    }
}

#[derive(Debug)]
pub(super) struct PlayApp<S> {
    session: GameSession<S>,
    notice: Option<Notice>,
    is_exiting: bool,
}

impl<S> PlayApp<S>
where
    S: ScoreStore,
{
    pub(super) fn new(session: GameSession<S>) -> Self {
        Self {
            session,
            notice: None,
            is_exiting: false,
        }
    }

    pub(super) fn into_score_store(self) -> S {
        self.session.into_score_store()
    }

    pub(super) fn run(&mut self, terminal: &mut DefaultTerminal) -> anyhow::Result<()> {
        let mut events = EventLoop::new(self.session.config().fps);
        while !self.is_exiting {
            match events.next()? {
                LoopEvent::Tick => self.update(),
                LoopEvent::Render => {
                    terminal.draw(|frame| self.draw(frame))?;
                }
                LoopEvent::Input(event) => self.handle_event(&event),
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: &Event) {
        if let Some(key) = event.as_key_press_event() {
            self.handle_key(key);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key_action(key) {
            Some(KeyAction::Move(kind)) => {
                let outcome = self.session.handle(MoveEvent::user(kind));
                self.show_outcome(&outcome);
            }
            Some(KeyAction::TogglePause) => self.session.toggle_pause(),
            Some(KeyAction::NewGame) => {
                self.session.new_game();
                self.notice = None;
            }
            Some(KeyAction::Quit) => self.is_exiting = true,
            None => {}
        }
    }

    fn update(&mut self) {
        if let Some(outcome) = self.session.increment_frame() {
            self.show_outcome(&outcome);
        }
        if let Some(notice) = &mut self.notice {
            notice.frames_left = notice.frames_left.saturating_sub(1);
            if notice.frames_left == 0 {
                self.notice = None;
            }
        }
    }

    fn show_outcome(&mut self, outcome: &CommandOutcome) {
        let text = if outcome.board_cleared {
            Some("BOARD CLEARED".to_owned())
        } else if let Some(level) = outcome.level_up {
            Some(format!("LEVEL {level}"))
        } else if let Some(clear) = outcome.clear.as_ref().filter(|c| c.lines_removed() > 0) {
            Some(format!(
                "{} +{}",
                line_clear_name(clear.lines_removed()),
                clear.score_bonus()
            ))
        } else {
            None
        };
        if let Some(text) = text {
            tracing::debug!(%text, score = self.session.score(), "notice");
            self.notice = Some(Notice {
                text,
                frames_left: self.session.config().fps,
            });
        }
    }

    fn draw(&self, frame: &mut Frame<'_>) {
        let grid = self.session.board().grid();
        let title = match self.session.state() {
            SessionState::Playing => self
                .notice
                .as_ref()
                .map_or_else(String::new, |notice| format!(" {} ", notice.text)),
            SessionState::Paused => " PAUSED ".to_owned(),
            SessionState::GameOver => " GAME OVER ".to_owned(),
            SessionState::TimeUp => " TIME UP ".to_owned(),
        };
        let view = self.session.view_data();
        let board_display = BoardDisplay::new(grid)
            .view(view)
            .block(BlockWidget::bordered().title_top(Line::from(title).centered()));
        let hold_display = PieceDisplay::new()
            .shape(view.held_piece())
            .block(BlockWidget::bordered().title("HOLD"));
        let next_display = PieceDisplay::new()
            .shape(Some(view.next_piece()))
            .block(BlockWidget::bordered().title("NEXT"));
        let stats = SessionStats::from_session(&self.session);
        let stats_display = SessionStatsDisplay::new(&stats).block(BlockWidget::bordered());

        let bindings = match self.session.state() {
            SessionState::Playing => PLAYING_KEYS,
            SessionState::Paused => PAUSED_KEYS,
            SessionState::GameOver | SessionState::TimeUp => FINISHED_KEYS,
        };
        let help = KeyBindingDisplay::new(bindings);

        let side_width = stats_display.width().max(hold_display.width());
        let [main_area, help_area] = Layout::vertical([
            Constraint::Length(board_display.height()),
            Constraint::Length(1),
        ])
        .areas(frame.area());
        let [left_area, board_area, right_area] = Layout::horizontal([
            Constraint::Length(side_width),
            Constraint::Length(board_display.width()),
            Constraint::Length(next_display.width()),
        ])
        .flex(Flex::Center)
        .areas(main_area);
        let [hold_area, stats_area] = Layout::vertical([
            Constraint::Length(hold_display.height()),
            Constraint::Length(stats_display.height()),
        ])
        .areas(left_area);
        let [next_area] =
            Layout::vertical([Constraint::Length(next_display.height())]).areas(right_area);

        frame.render_widget(hold_display, hold_area);
        frame.render_widget(stats_display, stats_area);
        frame.render_widget(board_display, board_area);
        frame.render_widget(next_display, next_area);
        frame.render_widget(help, help_area);
    }
}
