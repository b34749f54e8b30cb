use std::{iter, time::Duration};

use quadfall_engine::{GameMode, GameSession, ScoreStore};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::ui::widgets::style;

/// Numbers shown next to the board, copied out of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub mode: GameMode,
    pub score: u32,
    pub best_score: u32,
    pub level: u32,
    pub lines: usize,
    pub pieces: usize,
    /// Time left in timed modes, time played otherwise.
    pub clock: Duration,
}

impl SessionStats {
    pub fn from_session<S>(session: &GameSession<S>) -> Self
    where
        S: ScoreStore,
    {
        Self {
            mode: session.mode(),
            score: session.score(),
            best_score: session.best_score(),
            level: session.level(),
            lines: session.total_cleared_lines(),
            pieces: session.completed_pieces(),
            clock: session
                .remaining_time()
                .unwrap_or_else(|| session.duration()),
        }
    }
}

pub fn format_clock(dur: Duration) -> String {
    format!(
        "{:0}:{:0>2}.{:0>2}",
        dur.as_secs() / 60,
        dur.as_secs() % 60,
        dur.subsec_millis() / 10
    )
}

pub struct SessionStatsDisplay<'a> {
    stats: &'a SessionStats,
    block: Option<BlockWidget<'a>>,
}

impl<'a> SessionStatsDisplay<'a> {
    pub fn new(stats: &'a SessionStats) -> Self {
        Self { stats, block: None }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        20 + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        u16::try_from(ROWS.len()).unwrap_or(u16::MAX)
            + super::block_vertical_margin(self.block.as_ref())
    }
}

#[derive(Clone, Copy)]
enum Row {
    Empty,
    FullLabel(&'static str),
    FullValue(&'static dyn Fn(&SessionStats) -> String),
    LabelValue(&'static str, &'static dyn Fn(&SessionStats) -> String),
}

const ROWS: &[Row] = &[
    Row::LabelValue("MODE:", &|stats| stats.mode.to_string().to_uppercase()),
    Row::Empty,
    Row::FullLabel("SCORE:"),
    Row::FullValue(&|stats| stats.score.to_string()),
    Row::FullLabel("BEST:"),
    Row::FullValue(&|stats| stats.best_score.to_string()),
    Row::FullLabel("TIME:"),
    Row::FullValue(&|stats| format_clock(stats.clock)),
    Row::Empty,
    Row::LabelValue("LEVEL:", &|stats| stats.level.to_string()),
    Row::LabelValue("LINES:", &|stats| stats.lines.to_string()),
    Row::LabelValue("PIECES:", &|stats| stats.pieces.to_string()),
];

impl Widget for SessionStatsDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let style = style::DEFAULT;
        let highlight = if self.stats.score > 0 && self.stats.score >= self.stats.best_score {
            style::HIGHLIGHT
        } else {
            style
        };

        let rows_areas =
            Layout::vertical((0..ROWS.len()).map(|_| Constraint::Length(1))).split(area);

        for (row, area) in iter::zip(ROWS.iter().copied(), rows_areas.iter().copied()) {
            match row {
                Row::Empty => {}
                Row::FullLabel(label) => {
                    Line::styled(label, style).left_aligned().render(area, buf);
                }
                Row::FullValue(value) => {
                    Line::styled(value(self.stats), highlight)
                        .right_aligned()
                        .render(area, buf);
                }
                Row::LabelValue(label, value) => {
                    let [label_area, value_area] = area.layout(&Layout::horizontal([
                        Constraint::Fill(1),
                        Constraint::Fill(1),
                    ]));
                    Line::styled(label, style)
                        .left_aligned()
                        .render(label_area, buf);
                    Line::styled(value(self.stats), style)
                        .right_aligned()
                        .render(value_area, buf);
                }
            }
        }
    }
}
