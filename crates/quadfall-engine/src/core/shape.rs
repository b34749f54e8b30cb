use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

/// One rotation state of a piece inside its 4×4 bounding box.
///
/// Each cell is either `0` (empty) or the [`PieceKind::id`] of the piece.
/// Rows are indexed first (`shape[y][x]`).
pub type ShapeMatrix = [[u8; 4]; 4];

/// Enum representing the type of piece.
///
/// The discriminant doubles as the cell tag written into the grid when the
/// piece locks, so grid cells `1..=7` identify which piece put them there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 1,
    /// J-piece.
    J = 2,
    /// L-piece.
    L = 3,
    /// O-piece.
    O = 4,
    /// S-piece.
    S = 5,
    /// T-piece.
    T = 6,
    /// Z-piece.
    Z = 7,
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    /// All piece kinds in tag order.
    pub const ALL: [Self; Self::LEN] = [
        PieceKind::I,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    /// Returns the cell tag of this piece (`1..=7`).
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Looks up a piece kind by its cell tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use quadfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_id(6), Some(PieceKind::T));
    /// assert_eq!(PieceKind::from_id(0), None);
    /// ```
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(PieceKind::I),
            2 => Some(PieceKind::J),
            3 => Some(PieceKind::L),
            4 => Some(PieceKind::O),
            5 => Some(PieceKind::S),
            6 => Some(PieceKind::T),
            7 => Some(PieceKind::Z),
            _ => None,
        }
    }

    /// Number of distinct rotation states.
    ///
    /// The O-piece has a single state, I/S/Z alternate between two, and the
    /// remaining pieces cycle through four.
    #[must_use]
    pub const fn rotation_count(self) -> usize {
        match self {
            PieceKind::O => 1,
            PieceKind::I | PieceKind::S | PieceKind::Z => 2,
            PieceKind::J | PieceKind::L | PieceKind::T => 4,
        }
    }

    /// Returns the shape of the given rotation state.
    ///
    /// `rotation` wraps around [`Self::rotation_count`].
    #[must_use]
    pub fn shape(self, rotation: usize) -> &'static ShapeMatrix {
        &PIECE_SHAPES[self.index()][rotation % self.rotation_count()]
    }

    /// Returns copies of every rotation state, in rotation order.
    #[must_use]
    pub fn rotations(self) -> ArrayVec<ShapeMatrix, 4> {
        PIECE_SHAPES[self.index()][..self.rotation_count()]
            .iter()
            .copied()
            .collect()
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use quadfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::T => 'T',
            PieceKind::Z => 'Z',
        }
    }

    /// Parses a piece kind from a single character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'O' => Some(PieceKind::O),
            'S' => Some(PieceKind::S),
            'T' => Some(PieceKind::T),
            'Z' => Some(PieceKind::Z),
            _ => None,
        }
    }

    const fn index(self) -> usize {
        self as usize - 1
    }
}

/// Iterates the occupied cells of a shape as `(dx, dy, tag)`.
pub fn occupied_cells(shape: &ShapeMatrix) -> impl Iterator<Item = (i32, i32, u8)> + '_ {
    (0..).zip(shape).flat_map(|(dy, row)| {
        (0..)
            .zip(row)
            .filter(|(_, cell)| **cell != 0)
            .map(move |(dx, cell)| (dx, dy, *cell))
    })
}

/// Generates the rotation states of a shape by rotating 90° clockwise
/// inside its `size`×`size` box.
///
/// Only the first [`PieceKind::rotation_count`] entries are ever read.
const fn shape_rotations(size: usize, shape: &ShapeMatrix) -> [ShapeMatrix; 4] {
    let mut rotates = [*shape; 4];
    let mut i = 1;
    while i < 4 {
        let mut new_shape = [[0; 4]; 4];
        let mut y = 0;
        while y < size {
            let mut x = 0;
            while x < size {
                new_shape[y][x] = rotates[i - 1][size - 1 - x][y];
                x += 1;
            }
            y += 1;
        }
        rotates[i] = new_shape;
        i += 1;
    }
    rotates
}

static PIECE_SHAPES: [[ShapeMatrix; 4]; PieceKind::LEN] = {
    const E: u8 = 0;
    const I: u8 = PieceKind::I.id();
    const J: u8 = PieceKind::J.id();
    const L: u8 = PieceKind::L.id();
    const O: u8 = PieceKind::O.id();
    const S: u8 = PieceKind::S.id();
    const T: u8 = PieceKind::T.id();
    const Z: u8 = PieceKind::Z.id();
    const EEEE: [u8; 4] = [E; 4];
    [
        // I-piece
        shape_rotations(4, &[EEEE, [I, I, I, I], EEEE, EEEE]),
        // J-piece
        shape_rotations(3, &[[J, E, E, E], [J, J, J, E], EEEE, EEEE]),
        // L-piece
        shape_rotations(3, &[[E, E, L, E], [L, L, L, E], EEEE, EEEE]),
        // O-piece (never rotates)
        [[[E, O, O, E], [E, O, O, E], EEEE, EEEE]; 4],
        // S-piece
        shape_rotations(3, &[[E, S, S, E], [S, S, E, E], EEEE, EEEE]),
        // T-piece
        shape_rotations(3, &[[E, T, E, E], [T, T, T, E], EEEE, EEEE]),
        // Z-piece
        shape_rotations(3, &[[Z, Z, E, E], [E, Z, Z, E], EEEE, EEEE]),
    ]
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_counts() {
        assert_eq!(PieceKind::O.rotations().len(), 1);
        for kind in [PieceKind::I, PieceKind::S, PieceKind::Z] {
            assert_eq!(kind.rotations().len(), 2, "{kind:?}");
        }
        for kind in [PieceKind::J, PieceKind::L, PieceKind::T] {
            assert_eq!(kind.rotations().len(), 4, "{kind:?}");
        }
    }

    #[test]
    fn test_every_state_has_four_cells_tagged_with_its_id() {
        for kind in PieceKind::ALL {
            for shape in kind.rotations() {
                let cells: Vec<_> = occupied_cells(&shape).collect();
                assert_eq!(cells.len(), 4, "{kind:?}");
                assert!(cells.iter().all(|&(_, _, tag)| tag == kind.id()));
            }
        }
    }

    #[test]
    fn test_rotation_states_are_distinct() {
        for kind in PieceKind::ALL {
            let rotations = kind.rotations();
            for (i, a) in rotations.iter().enumerate() {
                for b in &rotations[i + 1..] {
                    assert_ne!(a, b, "{kind:?} has duplicate rotation states");
                }
            }
        }
    }

    #[test]
    fn test_shape_wraps_rotation_index() {
        assert_eq!(PieceKind::I.shape(2), PieceKind::I.shape(0));
        assert_eq!(PieceKind::T.shape(5), PieceKind::T.shape(1));
        assert_eq!(PieceKind::O.shape(3), PieceKind::O.shape(0));
    }

    #[test]
    fn test_rotations_are_copies() {
        let mut rotations = PieceKind::T.rotations();
        rotations[0][0][0] = 9;
        assert_eq!(PieceKind::T.shape(0)[0][0], 0);
    }

    #[test]
    fn test_t_piece_rotates_clockwise() {
        let t = PieceKind::T.id();
        assert_eq!(
            *PieceKind::T.shape(1),
            [[0, t, 0, 0], [0, t, t, 0], [0, t, 0, 0], [0, 0, 0, 0]]
        );
    }

    #[test]
    fn test_vertical_i_piece_uses_third_column() {
        let i = PieceKind::I.id();
        assert!(PieceKind::I.shape(1).iter().all(|row| row == &[0, 0, i, 0]));
    }

    #[test]
    fn test_piece_kind_id_conversion() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_id(kind.id()), Some(kind));
            assert_eq!(PieceKind::from_char(kind.as_char()), Some(kind));
        }
        assert_eq!(PieceKind::from_id(8), None);
        assert_eq!(PieceKind::from_char('x'), None);
    }
}
