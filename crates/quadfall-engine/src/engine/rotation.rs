use crate::core::{PieceKind, ShapeMatrix};

/// Rotation state of the active piece.
///
/// Pieces themselves are stateless; this tracks which of the piece's
/// rotation states is in use. Advancing wraps around the piece's own
/// [`rotation_count`](PieceKind::rotation_count), so an I-piece cycles
/// `0 → 1 → 0` while a T-piece cycles `0 → 1 → 2 → 3 → 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationCycle {
    kind: PieceKind,
    index: usize,
}

impl RotationCycle {
    /// Starts a cycle at the spawn orientation (state 0).
    #[must_use]
    pub const fn new(kind: PieceKind) -> Self {
        Self { kind, index: 0 }
    }

    #[must_use]
    pub const fn kind(self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    #[must_use]
    pub fn shape(self) -> &'static ShapeMatrix {
        self.kind.shape(self.index)
    }

    /// Returns the cycle advanced by one state, leaving `self` as is.
    ///
    /// Callers check the rotated shape first and only then commit it.
    #[must_use]
    pub const fn rotated(self) -> Self {
        Self {
            kind: self.kind,
            index: (self.index + 1) % self.kind.rotation_count(),
        }
    }

    /// Advances to the next rotation state.
    pub fn advance(&mut self) {
        *self = self.rotated();
    }
}
