use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    ConfigError, GameOverError, HoldError, MoveError, PieceCollisionError,
    core::{ClearRow, CollisionDetector, Grid, Offset, PieceKind, ShapeMatrix},
};

use super::{
    hold::HoldSlot,
    piece_supply::{PieceSeed, PieceSupply},
    rotation::RotationCycle,
};

/// Grid size and spawn point of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    /// Offset every new piece spawns at, in rotation state 0.
    pub spawn: Offset,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 25,
            spawn: Offset::new(3, 0),
        }
    }
}

impl BoardConfig {
    /// Number of rows above the visible field reserved for spawning.
    pub const HIDDEN_ROWS: usize = 2;

    /// Largest accepted `width * height`.
    pub const MAX_CELLS: usize = 1 << 20;

    /// Checks that the grid can hold a piece box at the spawn offset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        const BOX: i32 = 4;
        let Self {
            width,
            height,
            spawn,
        } = *self;
        if width < 4 || height < 4 {
            return Err(ConfigError::GridTooSmall { width, height });
        }
        if width
            .checked_mul(height)
            .is_none_or(|cells| cells > Self::MAX_CELLS)
        {
            return Err(ConfigError::GridTooLarge { width, height });
        }
        let inside = |start: i32, len: usize| {
            start >= 0
                && start
                    .checked_add(BOX)
                    .and_then(|end| usize::try_from(end).ok())
                    .is_some_and(|end| end <= len)
        };
        if !inside(spawn.x, width) || !inside(spawn.y, height) {
            return Err(ConfigError::SpawnOutOfBounds {
                x: spawn.x,
                y: spawn.y,
            });
        }
        Ok(())
    }
}

/// What happens when a new piece cannot spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, derive_more::IsVariant)]
pub enum OverflowPolicy {
    /// The game ends.
    GameOver,
    /// The whole grid is emptied and the piece spawns on the clean board.
    WipeBoard,
}

/// The falling piece: which piece, which rotation state, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePiece {
    rotation: RotationCycle,
    offset: Offset,
}

impl ActivePiece {
    #[must_use]
    pub const fn new(kind: PieceKind, offset: Offset) -> Self {
        Self {
            rotation: RotationCycle::new(kind),
            offset,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.rotation.kind()
    }

    #[must_use]
    pub const fn rotation_index(&self) -> usize {
        self.rotation.index()
    }

    #[must_use]
    pub fn shape(&self) -> &'static ShapeMatrix {
        self.rotation.shape()
    }

    #[must_use]
    pub const fn offset(&self) -> Offset {
        self.offset
    }
}

/// Result of locking the active piece and spawning the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnOutcome {
    /// Rows removed by the lock and the score they earned.
    pub clear: ClearRow,
    /// The new piece did not fit and the grid was wiped to make room.
    pub board_cleared: bool,
    /// The new piece did not fit and the game is over.
    pub game_over: bool,
}

/// Snapshot of everything a renderer needs after a command.
///
/// All matrices are copies; changing them never affects the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewData {
    piece: ShapeMatrix,
    x: i32,
    y: i32,
    next_piece: ShapeMatrix,
    shadow_y: i32,
    held_piece: Option<ShapeMatrix>,
}

impl ViewData {
    /// Shape of the active piece in its current rotation.
    #[must_use]
    pub fn piece(&self) -> &ShapeMatrix {
        &self.piece
    }

    #[must_use]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Spawn-orientation shape of the next piece.
    #[must_use]
    pub fn next_piece(&self) -> &ShapeMatrix {
        &self.next_piece
    }

    /// Row the active piece would land on if dropped now.
    #[must_use]
    pub fn shadow_y(&self) -> i32 {
        self.shadow_y
    }

    /// Spawn-orientation shape of the held piece, if any.
    #[must_use]
    pub fn held_piece(&self) -> Option<&ShapeMatrix> {
        self.held_piece.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpawnStatus {
    Spawned,
    BoardWiped,
    Blocked,
}

/// The rules orchestrator: grid, falling piece, hold slot and piece supply.
///
/// Every command either happens completely or not at all. Illegal moves are
/// reported through `Err`/`false` and leave the board exactly as it was.
///
/// # Example
///
/// ```
/// use quadfall_engine::{Board, BoardConfig, OverflowPolicy};
///
/// let mut board = Board::new(BoardConfig::default(), OverflowPolicy::GameOver).unwrap();
///
/// board.move_left();
/// board.rotate();
/// while board.move_down() {}
///
/// let outcome = board.lock_and_spawn().unwrap();
/// assert_eq!(outcome.clear.lines_removed(), 0);
/// assert!(!outcome.game_over);
/// ```
#[derive(Debug, Clone)]
pub struct Board {
    config: BoardConfig,
    overflow: OverflowPolicy,
    grid: Grid,
    active: ActivePiece,
    hold: HoldSlot,
    supply: PieceSupply,
    score: u32,
    game_over: bool,
}

impl Board {
    /// Creates a board with a random piece sequence and spawns the first piece.
    pub fn new(config: BoardConfig, overflow: OverflowPolicy) -> Result<Self, ConfigError> {
        Self::with_supply(config, overflow, PieceSupply::new())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic piece generation.
    pub fn with_seed(
        config: BoardConfig,
        overflow: OverflowPolicy,
        seed: PieceSeed,
    ) -> Result<Self, ConfigError> {
        Self::with_supply(config, overflow, PieceSupply::with_seed(seed))
    }

    fn with_supply(
        config: BoardConfig,
        overflow: OverflowPolicy,
        mut supply: PieceSupply,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let active = ActivePiece::new(supply.pop_next(), config.spawn);
        Ok(Self {
            config,
            overflow,
            grid: Grid::new(config.width, config.height),
            active,
            hold: HoldSlot::new(),
            supply,
            score: 0,
            game_over: false,
        })
    }

    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[must_use]
    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Returns a copy of the grid.
    #[must_use]
    pub fn board_matrix(&self) -> Grid {
        self.grid.clone()
    }

    #[must_use]
    pub fn active_piece(&self) -> ActivePiece {
        self.active
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<PieceKind> {
        self.hold.held()
    }

    #[must_use]
    pub fn next_piece(&self) -> PieceKind {
        self.supply.peek()
    }

    pub fn upcoming_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.supply.upcoming()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    #[must_use]
    pub fn can_hold(&self) -> bool {
        !self.game_over && self.hold.can_hold()
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    fn detector(&self) -> CollisionDetector<'_> {
        CollisionDetector::new(&self.grid)
    }

    fn ensure_playing(&self) -> Result<(), GameOverError> {
        if self.game_over {
            return Err(GameOverError);
        }
        Ok(())
    }

    /// Row the active piece would land on if dropped straight down.
    #[must_use]
    pub fn shadow_y(&self) -> i32 {
        self.detector()
            .calculate_shadow_y(self.active.shape(), self.active.offset)
    }

    #[must_use]
    pub fn view_data(&self) -> ViewData {
        ViewData {
            piece: *self.active.shape(),
            x: self.active.offset.x,
            y: self.active.offset.y,
            next_piece: *self.supply.peek().shape(0),
            shadow_y: self.shadow_y(),
            held_piece: self.hold.held().map(|kind| *kind.shape(0)),
        }
    }

    pub fn try_move_down(&mut self) -> Result<(), MoveError> {
        self.ensure_playing()?;
        let ActivePiece { rotation, offset } = self.active;
        if !self.detector().can_move_down(rotation.shape(), offset) {
            return Err(PieceCollisionError.into());
        }
        self.active.offset = offset.down();
        Ok(())
    }

    pub fn try_move_left(&mut self) -> Result<(), MoveError> {
        self.ensure_playing()?;
        let ActivePiece { rotation, offset } = self.active;
        if !self.detector().can_move_left(rotation.shape(), offset) {
            return Err(PieceCollisionError.into());
        }
        self.active.offset = offset.left();
        Ok(())
    }

    pub fn try_move_right(&mut self) -> Result<(), MoveError> {
        self.ensure_playing()?;
        let ActivePiece { rotation, offset } = self.active;
        if !self.detector().can_move_right(rotation.shape(), offset) {
            return Err(PieceCollisionError.into());
        }
        self.active.offset = offset.right();
        Ok(())
    }

    /// Rotates the active piece one state clockwise, kicking it one cell
    /// sideways if needed.
    pub fn try_rotate(&mut self) -> Result<(), MoveError> {
        self.ensure_playing()?;
        let rotated = self.active.rotation.rotated();
        let offset = self
            .detector()
            .find_valid_rotation_position(rotated.shape(), self.active.offset)
            .ok_or(PieceCollisionError)?;
        self.active = ActivePiece {
            rotation: rotated,
            offset,
        };
        Ok(())
    }

    pub fn move_down(&mut self) -> bool {
        self.try_move_down().is_ok()
    }

    pub fn move_left(&mut self) -> bool {
        self.try_move_left().is_ok()
    }

    pub fn move_right(&mut self) -> bool {
        self.try_move_right().is_ok()
    }

    pub fn rotate(&mut self) -> bool {
        self.try_rotate().is_ok()
    }

    /// Swaps the active piece with the hold slot.
    ///
    /// - Empty slot: the active piece is stored and the next piece of the
    ///   supply spawns at the spawn offset
    /// - Occupied slot: the held piece takes the active piece's place. If it
    ///   collides there, it is moved up one row at a time (never above row 0)
    ///   until it fits
    ///
    /// On failure nothing changes, the supply included.
    pub fn try_hold(&mut self) -> Result<(), HoldError> {
        self.ensure_playing()?;
        if !self.hold.can_hold() {
            return Err(HoldError::HoldAlreadyUsed);
        }

        let incoming = match self.hold.held() {
            None => {
                let piece = ActivePiece::new(self.supply.peek(), self.config.spawn);
                if !self.detector().fits(piece.shape(), piece.offset) {
                    return Err(PieceCollisionError.into());
                }
                self.supply.pop_next();
                piece
            }
            Some(held) => {
                let piece = ActivePiece::new(held, self.active.offset);
                let detector = self.detector();
                let y = (0..=piece.offset.y)
                    .rev()
                    .find(|&y| detector.fits(piece.shape(), piece.offset.with_y(y)))
                    .ok_or(PieceCollisionError)?;
                ActivePiece {
                    offset: piece.offset.with_y(y),
                    ..piece
                }
            }
        };

        debug!(
            stored = ?self.active.kind(),
            active = ?incoming.kind(),
            "piece held"
        );
        self.hold.swap(self.active.kind());
        self.active = incoming;
        Ok(())
    }

    pub fn hold(&mut self) -> bool {
        self.try_hold()
            .inspect_err(|err| trace!(%err, "hold rejected"))
            .is_ok()
    }

    /// Locks the active piece into the grid, clears full rows and spawns
    /// the next piece.
    ///
    /// If the new piece does not fit, the overflow policy decides: either the
    /// game ends (`game_over`) or the grid is wiped and the piece spawns on
    /// the empty board (`board_cleared`).
    pub fn lock_and_spawn(&mut self) -> Result<SpawnOutcome, GameOverError> {
        self.ensure_playing()?;

        let ActivePiece { rotation, offset } = self.active;
        let clear = self.grid.stamped(rotation.shape(), offset).collapsed();
        self.grid.clone_from(clear.grid());
        self.add_score(clear.score_bonus());
        debug!(
            piece = ?rotation.kind(),
            x = offset.x,
            y = offset.y,
            lines = clear.lines_removed(),
            "piece locked"
        );

        let next = self.supply.pop_next();
        let status = self.spawn(next);
        Ok(SpawnOutcome {
            clear,
            board_cleared: status == SpawnStatus::BoardWiped,
            game_over: status == SpawnStatus::Blocked,
        })
    }

    fn spawn(&mut self, kind: PieceKind) -> SpawnStatus {
        self.active = ActivePiece::new(kind, self.config.spawn);
        self.hold.on_spawn();

        let fits = |board: &Self| {
            board
                .detector()
                .fits(board.active.shape(), board.active.offset)
        };
        if fits(self) {
            return SpawnStatus::Spawned;
        }

        match self.overflow {
            OverflowPolicy::GameOver => {
                debug!(piece = ?kind, score = self.score, "spawn blocked, game over");
                self.game_over = true;
                SpawnStatus::Blocked
            }
            OverflowPolicy::WipeBoard => {
                debug!(piece = ?kind, "spawn blocked, wiping board");
                self.grid.clear();
                debug_assert!(fits(self));
                SpawnStatus::BoardWiped
            }
        }
    }

    /// Starts over: empty grid, zero score, empty hold slot, fresh bags.
    pub fn new_game(&mut self) {
        self.grid.clear();
        self.score = 0;
        self.hold.reset();
        self.supply.reset();
        self.game_over = false;
        let first = self.supply.pop_next();
        self.spawn(first);
    }
}

#[cfg(test)]
impl Board {
    pub(crate) fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub(crate) fn set_active(&mut self, kind: PieceKind, offset: Offset) {
        self.active = ActivePiece::new(kind, offset);
    }
}
