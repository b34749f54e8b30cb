use quadfall_engine::PieceKind;
use ratatui::{
    prelude::{Buffer, Rect},
    style::Style,
    widgets::{Paragraph, Widget},
};

use crate::ui::widgets::style;

/// What one board cell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    Empty,
    Ghost,
    Piece(PieceKind),
}

impl CellView {
    /// Maps a grid cell value (0 for empty, a piece id otherwise).
    pub fn from_cell(cell: u8) -> Self {
        PieceKind::from_id(cell).map_or(CellView::Empty, CellView::Piece)
    }
}

#[derive(Debug)]
pub struct BlockDisplay {
    style: Style,
    symbol: &'static str,
}

impl BlockDisplay {
    pub const fn new(style: Style, symbol: &'static str) -> Self {
        Self { style, symbol }
    }

    pub fn width() -> u16 {
        2
    }

    pub fn height() -> u16 {
        1
    }

    pub fn from_cell(cell: CellView, show_dots: bool) -> Self {
        match cell {
            CellView::Empty if show_dots => Self::new(style::EMPTY_DOT, "."),
            CellView::Empty => Self::new(style::EMPTY, ""),
            CellView::Ghost => Self::new(style::GHOST, "[]"),
            CellView::Piece(kind) => Self::new(style::piece(kind), ""),
        }
    }
}

impl Widget for BlockDisplay {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &BlockDisplay {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        // Fill the whole area, not just the cells covered by the symbol.
        Paragraph::new(self.symbol)
            .style(self.style)
            .centered()
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_values() {
        assert_eq!(CellView::from_cell(0), CellView::Empty);
        assert_eq!(CellView::from_cell(1), CellView::Piece(PieceKind::I));
        assert_eq!(CellView::from_cell(7), CellView::Piece(PieceKind::Z));
        assert_eq!(CellView::from_cell(42), CellView::Empty);
    }
}
