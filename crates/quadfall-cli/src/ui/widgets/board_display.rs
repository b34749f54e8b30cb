use std::iter;

use quadfall_engine::{BoardConfig, Grid, ViewData, occupied_cells};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::ui::widgets::{BlockDisplay, CellView};

/// The visible part of the grid with the falling piece and its ghost.
#[derive(Debug)]
pub struct BoardDisplay<'a> {
    grid: &'a Grid,
    view: Option<ViewData>,
    block: Option<BlockWidget<'a>>,
}

impl<'a> BoardDisplay<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        Self {
            grid,
            view: None,
            block: None,
        }
    }

    pub fn view(self, view: ViewData) -> Self {
        Self {
            view: Some(view),
            ..self
        }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    fn visible_rows(&self) -> usize {
        self.grid.height().saturating_sub(BoardConfig::HIDDEN_ROWS)
    }

    pub fn width(&self) -> u16 {
        let cols = u16::try_from(self.grid.width()).unwrap_or(u16::MAX);
        cols.saturating_mul(BlockDisplay::width())
            + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        let rows = u16::try_from(self.visible_rows()).unwrap_or(u16::MAX);
        rows.saturating_mul(BlockDisplay::height())
            + super::block_vertical_margin(self.block.as_ref())
    }

    /// Cells of the whole grid, hidden rows included, with the piece drawn in.
    pub fn cells(&self) -> Vec<Vec<CellView>> {
        let mut cells: Vec<Vec<CellView>> = self
            .grid
            .rows()
            .map(|row| row.iter().copied().map(CellView::from_cell).collect())
            .collect();

        let mut put = |x: i32, y: i32, cell: CellView, only_empty: bool| {
            let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
                return;
            };
            if let Some(target) = cells.get_mut(y).and_then(|row| row.get_mut(x))
                && (!only_empty || *target == CellView::Empty)
            {
                *target = cell;
            }
        };

        if let Some(view) = &self.view {
            for (dx, dy, _) in occupied_cells(view.piece()) {
                put(view.x() + dx, view.shadow_y() + dy, CellView::Ghost, true);
            }
            for (dx, dy, id) in occupied_cells(view.piece()) {
                put(view.x() + dx, view.y() + dy, CellView::from_cell(id), false);
            }
        }
        cells
    }
}

impl Widget for BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let col_constraints =
            (0..self.grid.width()).map(|_| Constraint::Length(BlockDisplay::width()));
        let row_constraints =
            (0..self.visible_rows()).map(|_| Constraint::Length(BlockDisplay::height()));
        let horizontal = Layout::horizontal(col_constraints).flex(Flex::Center);
        let vertical = Layout::vertical(row_constraints);

        let grid_cells = area
            .layout_vec(&vertical)
            .into_iter()
            .map(|row| row.layout_vec(&horizontal));
        let cells = self.cells();

        for (grid_row, row) in iter::zip(grid_cells, &cells[BoardConfig::HIDDEN_ROWS..]) {
            for (grid_cell, cell) in iter::zip(grid_row, row) {
                BlockDisplay::from_cell(*cell, true).render(grid_cell, buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use quadfall_engine::{Board, OverflowPolicy, PieceSeed};

    use super::*;

    #[test]
    fn test_cells_show_piece_and_ghost() {
        let board = Board::with_seed(
            BoardConfig::default(),
            OverflowPolicy::GameOver,
            PieceSeed::from_u128(3),
        )
        .unwrap();
        let view = board.view_data();
        let kind = board.active_piece().kind();
        let cells = BoardDisplay::new(board.grid()).view(view).cells();

        let count = |wanted: CellView| {
            cells
                .iter()
                .flatten()
                .filter(|cell| **cell == wanted)
                .count()
        };
        assert_eq!(count(CellView::Piece(kind)), 4);
        assert_eq!(count(CellView::Ghost), 4);
        assert_eq!(cells.len(), 25);
        assert!(
            cells[24..]
                .iter()
                .flatten()
                .any(|cell| *cell == CellView::Ghost)
        );
        assert!(!cells[..2].iter().flatten().any(|cell| *cell == CellView::Ghost));
    }

    #[test]
    fn test_size_excludes_hidden_rows() {
        let grid = Grid::new(10, 25);
        let display = BoardDisplay::new(&grid);
        assert_eq!(display.width(), 20);
        assert_eq!(display.height(), 23);
    }
}
