use crate::core::PieceKind;

/// The hold slot: one stored piece plus the once-per-spawn rule.
///
/// - The first hold of a game stores the active piece; the caller then draws
///   a fresh one from the supply
/// - Later holds swap the active piece with the stored one
/// - After a successful hold, holding is disabled until the next spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldSlot {
    held: Option<PieceKind>,
    can_hold: bool,
}

impl Default for HoldSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl HoldSlot {
    /// Creates an empty slot with holding allowed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            held: None,
            can_hold: true,
        }
    }

    /// Returns the held piece, if any.
    #[must_use]
    pub const fn held(&self) -> Option<PieceKind> {
        self.held
    }

    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.held.is_some()
    }

    /// Returns `false` once a hold was used since the last spawn.
    #[must_use]
    pub const fn can_hold(&self) -> bool {
        self.can_hold
    }

    /// Stores `current` and returns the previously held piece.
    ///
    /// Disables holding until [`Self::on_spawn`] is called.
    pub fn swap(&mut self, current: PieceKind) -> Option<PieceKind> {
        self.can_hold = false;
        self.held.replace(current)
    }

    /// Re-enables holding; call exactly once per spawned piece.
    pub fn on_spawn(&mut self) {
        self.can_hold = true;
    }

    /// Empties the slot and re-enables holding.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_swap_returns_nothing() {
        let mut slot = HoldSlot::new();
        assert!(slot.can_hold());
        assert!(!slot.is_occupied());

        assert_eq!(slot.swap(PieceKind::T), None);
        assert_eq!(slot.held(), Some(PieceKind::T));
        assert!(!slot.can_hold());
    }

    #[test]
    fn test_swap_returns_previous_piece() {
        let mut slot = HoldSlot::new();
        slot.swap(PieceKind::T);
        slot.on_spawn();
        assert_eq!(slot.swap(PieceKind::I), Some(PieceKind::T));
        assert_eq!(slot.held(), Some(PieceKind::I));
    }

    #[test]
    fn test_reset_empties_slot() {
        let mut slot = HoldSlot::new();
        slot.swap(PieceKind::S);
        slot.reset();
        assert_eq!(slot, HoldSlot::new());
    }
}
