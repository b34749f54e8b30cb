//! Game rules built on top of the core data structures.
//!
//! - [`Board`] - The orchestrator: grid, falling piece, hold slot and piece supply
//! - [`GameSession`] - One game of a [`GameMode`], driven by commands and frame ticks
//! - [`LevelProgression`] - Level and fall speed from cleared lines (Blitz)
//! - [`PieceSupply`] - 7-bag piece generation system
//! - [`PieceSeed`] - Seed for deterministic piece generation
//! - [`ScoreStore`] - Host-supplied storage for best scores
//!
//! # Game Flow
//!
//! 1. Create a [`GameSession`] from a [`SessionConfig`]
//! 2. Forward player input as commands or [`MoveEvent`]s
//! 3. Call [`GameSession::increment_frame`] at the configured rate so pieces fall
//! 4. Pieces lock when they cannot fall any further, full rows are cleared and
//!    the next piece spawns
//! 5. Repeat until the session reports `game_over` (a blocked spawn, or the
//!    clock in Blitz); Zen wipes the board instead and never ends
//!
//! # Example
//!
//! ```
//! use quadfall_engine::{EventKind, GameSession, MemoryScoreStore, MoveEvent, SessionConfig};
//!
//! let mut session = GameSession::new(SessionConfig::default(), MemoryScoreStore::new()).unwrap();
//!
//! session.handle(MoveEvent::user(EventKind::Left));
//! session.handle(MoveEvent::user(EventKind::Rotate));
//! let outcome = session.handle(MoveEvent::user(EventKind::HardDrop));
//!
//! if outcome.game_over {
//!     println!("Game over!");
//! }
//! ```

pub use self::{
    board::*, event::*, hold::*, piece_supply::*, progression::*, rotation::*, score_store::*,
    session::*,
};

mod board;
mod event;
mod hold;
mod piece_supply;
mod progression;
mod rotation;
mod score_store;
mod session;
