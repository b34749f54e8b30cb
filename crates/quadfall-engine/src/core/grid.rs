use serde::{Deserialize, Serialize};

use super::shape::{PieceKind, ShapeMatrix, occupied_cells};

/// Top-left anchor of a piece's 4×4 bounding box in grid coordinates.
///
/// Coordinates are signed: a shape whose leftmost column is empty can sit at
/// `x = -1` without any of its cells leaving the grid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
}

impl Offset {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    #[must_use]
    pub const fn left(self) -> Self {
        self.translated(-1, 0)
    }

    #[must_use]
    pub const fn right(self) -> Self {
        self.translated(1, 0)
    }

    #[must_use]
    pub const fn down(self) -> Self {
        self.translated(0, 1)
    }

    #[must_use]
    pub const fn with_y(self, y: i32) -> Self {
        Self::new(self.x, y)
    }
}

/// Score awarded for clearing `rows` lines at once: `50 * rows²`.
///
/// # Examples
///
/// ```
/// use quadfall_engine::clear_bonus;
///
/// assert_eq!(clear_bonus(0), 0);
/// assert_eq!(clear_bonus(4), 800);
/// ```
#[must_use]
pub fn clear_bonus(rows: usize) -> u32 {
    let rows = u32::try_from(rows).unwrap_or(u32::MAX);
    rows.saturating_mul(rows).saturating_mul(50)
}

/// The playing field: a fixed `height × width` matrix of cell tags.
///
/// `0` is an empty cell, `1..=7` a locked block tagged with its
/// [`PieceKind::id`]. Rows are numbered from the top; the first rows act as a
/// hidden spawn buffer above the visible field.
///
/// The dimensions never change after construction, only cell contents do.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl Grid {
    /// Creates an empty grid.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the cell at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> Option<u8> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Returns one row of cells.
    ///
    /// # Panics
    ///
    /// Panics if `y` is outside the grid.
    #[must_use]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.cells[y * self.width..][..self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.cells.chunks_exact(self.width)
    }

    /// Copies the grid into a row-major nested vector.
    #[must_use]
    pub fn to_matrix(&self) -> Vec<Vec<u8>> {
        self.rows().map(<[u8]>::to_vec).collect()
    }

    /// Returns `true` if no cell is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&c| c == 0)
    }

    /// Empties every cell, keeping the dimensions.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }

    /// Checks whether `shape` placed at `offset` hits anything.
    ///
    /// A shape cell outside the grid always collides, whatever the grid
    /// holds; only in-bounds cells are checked for content.
    #[must_use]
    pub fn overlaps(&self, shape: &ShapeMatrix, offset: Offset) -> bool {
        occupied_cells(shape).any(|(dx, dy, _)| {
            self.index(offset.x + dx, offset.y + dy)
                .is_none_or(|i| self.cells[i] != 0)
        })
    }

    /// Writes the occupied cells of `shape` at `offset` into the grid.
    ///
    /// Cells falling outside the grid are ignored.
    pub fn fill_shape(&mut self, shape: &ShapeMatrix, offset: Offset) {
        for (dx, dy, tag) in occupied_cells(shape) {
            if let Some(i) = self.index(offset.x + dx, offset.y + dy) {
                self.cells[i] = tag;
            }
        }
    }

    /// Like [`Self::fill_shape`], but returns a new grid and leaves `self`
    /// untouched.
    #[must_use]
    pub fn stamped(&self, shape: &ShapeMatrix, offset: Offset) -> Self {
        let mut grid = self.clone();
        grid.fill_shape(shape, offset);
        grid
    }

    /// Returns `true` if every cell of row `y` is occupied.
    #[must_use]
    pub fn is_row_full(&self, y: usize) -> bool {
        self.row(y).iter().all(|&c| c != 0)
    }

    /// Removes all full rows at once and returns how many were removed.
    ///
    /// Remaining rows keep their relative order and slide down to close the
    /// gaps; the rows freed at the top are emptied.
    pub fn clear_lines(&mut self) -> usize {
        let width = self.width;
        let mut count = 0;

        for y in (0..self.height).rev() {
            if self.is_row_full(y) {
                count += 1;
                continue;
            }
            if count > 0 {
                let src = y * width;
                self.cells.copy_within(src..src + width, src + count * width);
            }
        }

        self.cells[..count * width].fill(0);
        count
    }

    /// Like [`Self::clear_lines`], but returns the result as a [`ClearRow`]
    /// and leaves `self` untouched.
    #[must_use]
    pub fn collapsed(&self) -> ClearRow {
        let mut grid = self.clone();
        let lines_removed = grid.clear_lines();
        ClearRow {
            lines_removed,
            score_bonus: clear_bonus(lines_removed),
            grid,
        }
    }

    /// Creates a grid from ASCII art, top row first.
    ///
    /// `.` is an empty cell, a piece letter (`IJLOSTZ`) is a block of that
    /// piece and `#` is a block tagged `1`. Blank lines are skipped and the
    /// height is taken from the number of rows given.
    ///
    /// # Panics
    ///
    /// Panics if the rows do not all have the same width.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let rows: Vec<Vec<u8>> = art
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.chars()
                    .map(|c| match c {
                        '.' => 0,
                        '#' => 1,
                        c => PieceKind::from_char(c)
                            .unwrap_or_else(|| panic!("invalid grid cell {c:?}"))
                            .id(),
                    })
                    .collect()
            })
            .collect();

        let width = rows.first().map_or(0, Vec::len);
        for (y, row) in rows.iter().enumerate() {
            assert_eq!(
                row.len(),
                width,
                "Each row must have exactly {width} cells, got {} at row {y}",
                row.len()
            );
        }

        Self {
            width,
            height: rows.len(),
            cells: rows.concat(),
        }
    }
}

/// Outcome of collapsing a grid after a piece locks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearRow {
    lines_removed: usize,
    score_bonus: u32,
    grid: Grid,
}

impl ClearRow {
    /// Number of full rows removed.
    #[must_use]
    pub fn lines_removed(&self) -> usize {
        self.lines_removed
    }

    /// Score earned by this clear (see [`clear_bonus`]).
    #[must_use]
    pub fn score_bonus(&self) -> u32 {
        self.score_bonus
    }

    /// The grid after the collapse.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn into_grid(self) -> Grid {
        self.grid
    }
}
