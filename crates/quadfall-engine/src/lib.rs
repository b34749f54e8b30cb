pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("piece colliding with the grid or its walls")]
pub struct PieceCollisionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("game is over")]
pub struct GameOverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum MoveError {
    #[display("cannot move: {_0}")]
    GameOver(GameOverError),
    #[display("cannot move: {_0}")]
    PieceCollision(PieceCollisionError),
}

impl From<GameOverError> for MoveError {
    fn from(err: GameOverError) -> Self {
        MoveError::GameOver(err)
    }
}

impl From<PieceCollisionError> for MoveError {
    fn from(err: PieceCollisionError) -> Self {
        MoveError::PieceCollision(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum HoldError {
    #[display("cannot hold: {_0}")]
    GameOver(GameOverError),
    #[display("piece colliding when holding piece")]
    PieceCollision(PieceCollisionError),
    #[display("hold already used in this turn")]
    HoldAlreadyUsed,
}

impl From<GameOverError> for HoldError {
    fn from(err: GameOverError) -> Self {
        HoldError::GameOver(err)
    }
}

impl From<PieceCollisionError> for HoldError {
    fn from(err: PieceCollisionError) -> Self {
        HoldError::PieceCollision(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("grid must be at least 4x4 cells, got {width}x{height}")]
    GridTooSmall { width: usize, height: usize },
    #[display("grid of {width}x{height} cells is too large")]
    GridTooLarge { width: usize, height: usize },
    #[display("spawn offset ({x}, {y}) puts the 4x4 piece box outside the grid")]
    SpawnOutOfBounds { x: i32, y: i32 },
    #[display("frame rate must be positive")]
    ZeroFrameRate,
}
