use super::{
    grid::{Grid, Offset},
    shape::ShapeMatrix,
};

/// Legality checks for a piece against one grid snapshot.
///
/// The detector only borrows the grid, so build a fresh one after every grid
/// mutation instead of keeping it around.
#[derive(Debug, Clone, Copy)]
pub struct CollisionDetector<'a> {
    grid: &'a Grid,
}

impl<'a> CollisionDetector<'a> {
    #[must_use]
    pub fn new(grid: &'a Grid) -> Self {
        Self { grid }
    }

    /// Returns `true` if `shape` at `offset` is inside the grid and touches
    /// no locked block.
    #[must_use]
    pub fn fits(&self, shape: &ShapeMatrix, offset: Offset) -> bool {
        !self.grid.overlaps(shape, offset)
    }

    #[must_use]
    pub fn can_move_down(&self, shape: &ShapeMatrix, offset: Offset) -> bool {
        self.fits(shape, offset.down())
    }

    #[must_use]
    pub fn can_move_left(&self, shape: &ShapeMatrix, offset: Offset) -> bool {
        self.fits(shape, offset.left())
    }

    #[must_use]
    pub fn can_move_right(&self, shape: &ShapeMatrix, offset: Offset) -> bool {
        self.fits(shape, offset.right())
    }

    /// Finds where a freshly rotated shape can go.
    ///
    /// This is a minimal wall kick, **not** a Super Rotation System. It tries
    /// three positions in order and returns the first one that fits:
    ///
    /// 1. the current offset
    /// 2. one cell to the left
    /// 3. one cell to the right
    ///
    /// There is no vertical kick and no per-piece kick table.
    #[must_use]
    pub fn find_valid_rotation_position(
        &self,
        rotated: &ShapeMatrix,
        offset: Offset,
    ) -> Option<Offset> {
        [offset, offset.left(), offset.right()]
            .into_iter()
            .find(|candidate| self.fits(rotated, *candidate))
    }

    /// Projects `shape` straight down from `offset` and returns the y of the
    /// last position that still fits.
    ///
    /// The result is never above `offset.y`. If the shape already rests on
    /// something, `offset.y` itself is returned.
    #[must_use]
    pub fn calculate_shadow_y(&self, shape: &ShapeMatrix, offset: Offset) -> i32 {
        let bottom = i32::try_from(self.grid.height()).unwrap_or(i32::MAX);
        let mut shadow = offset;
        while shadow.y < bottom && self.can_move_down(shape, shadow) {
            shadow = shadow.down();
        }
        shadow.y
    }
}
