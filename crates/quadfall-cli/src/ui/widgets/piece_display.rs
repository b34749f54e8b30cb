use quadfall_engine::{ShapeMatrix, occupied_cells};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::ui::widgets::{BlockDisplay, CellView};

/// A single piece shape, cropped to its occupied cells and centered.
#[derive(Debug)]
pub struct PieceDisplay<'a> {
    shape: Option<ShapeMatrix>,
    block: Option<BlockWidget<'a>>,
}

/// Occupied cells of `shape`, cropped to their bounding box.
fn cropped(shape: &ShapeMatrix) -> Vec<Vec<CellView>> {
    let cells: Vec<_> = occupied_cells(shape).collect();
    let (Some(min_x), Some(max_x)) = (
        cells.iter().map(|&(x, _, _)| x).min(),
        cells.iter().map(|&(x, _, _)| x).max(),
    ) else {
        return vec![];
    };
    let min_y = cells.iter().map(|&(_, y, _)| y).min().unwrap_or(0);
    let max_y = cells.iter().map(|&(_, y, _)| y).max().unwrap_or(0);

    (min_y..=max_y)
        .map(|y| {
            (min_x..=max_x)
                .map(|x| {
                    cells
                        .iter()
                        .find(|&&(cx, cy, _)| (cx, cy) == (x, y))
                        .map_or(CellView::Empty, |&(_, _, id)| CellView::from_cell(id))
                })
                .collect()
        })
        .collect()
}

impl<'a> PieceDisplay<'a> {
    pub fn new() -> Self {
        Self {
            shape: None,
            block: None,
        }
    }

    pub fn shape(self, shape: Option<&ShapeMatrix>) -> Self {
        Self {
            shape: shape.copied(),
            ..self
        }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        4 * BlockDisplay::width() + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        2 * BlockDisplay::height() + super::block_vertical_margin(self.block.as_ref())
    }
}

impl Widget for PieceDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &PieceDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let Some(shape) = &self.shape else {
            return;
        };
        let rows = cropped(shape);
        let piece_height = u16::try_from(rows.len()).unwrap_or(0);
        let piece_width = u16::try_from(rows.first().map_or(0, Vec::len)).unwrap_or(0);
        let piece_area = area.centered(
            Constraint::Length(piece_width * BlockDisplay::width()),
            Constraint::Length(piece_height * BlockDisplay::height()),
        );

        let col_constraints = (0..piece_width).map(|_| Constraint::Length(BlockDisplay::width()));
        let row_constraints = (0..piece_height).map(|_| Constraint::Length(BlockDisplay::height()));
        let horizontal = Layout::horizontal(col_constraints).flex(Flex::Center);
        let vertical = Layout::vertical(row_constraints);
        let grid_rows = piece_area
            .layout_vec(&vertical)
            .into_iter()
            .map(|row| row.layout_vec(&horizontal));

        for (grid_row, row) in grid_rows.zip(&rows) {
            for (grid_cell, cell) in grid_row.into_iter().zip(row) {
                BlockDisplay::from_cell(*cell, false).render(grid_cell, buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use quadfall_engine::PieceKind;

    use super::*;

    #[test]
    fn test_crop_to_occupied_cells() {
        let i = CellView::Piece(PieceKind::I);
        assert_eq!(cropped(PieceKind::I.shape(0)), vec![vec![i; 4]]);

        let t = CellView::Piece(PieceKind::T);
        let e = CellView::Empty;
        assert_eq!(
            cropped(PieceKind::T.shape(0)),
            vec![vec![e, t, e], vec![t, t, t]]
        );

        let o = CellView::Piece(PieceKind::O);
        assert_eq!(cropped(PieceKind::O.shape(0)), vec![vec![o, o], vec![o, o]]);
        assert!(cropped(&[[0; 4]; 4]).is_empty());
    }
}
