use serde::{Deserialize, Serialize};

/// What a move event asks the board to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Down,
    Left,
    Right,
    Rotate,
    HardDrop,
    Hold,
}

/// Who issued a move event.
///
/// Only a soft drop from the player scores points; the same drop issued by
/// the fall timer does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    User,
    Automatic,
}

/// A command for [`GameSession::handle`](super::GameSession::handle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct MoveEvent {
    pub kind: EventKind,
    pub source: EventSource,
}

impl MoveEvent {
    #[must_use]
    pub const fn new(kind: EventKind, source: EventSource) -> Self {
        Self { kind, source }
    }

    #[must_use]
    pub const fn user(kind: EventKind) -> Self {
        Self::new(kind, EventSource::User)
    }

    #[must_use]
    pub const fn automatic(kind: EventKind) -> Self {
        Self::new(kind, EventSource::Automatic)
    }
}
