//! PortDive Core - Puzzle Engine for the PortDive Hacking Minigame
//!
//! The player must identify a secret row (the key) in a matrix of port address
//! fragments before guessing wrong. Two instruments help:
//! 1. **The Pwner**: a mutating row of fragments, reshuffled on every tick.
//!    Columns that match the key can be locked in ("chosen").
//! 2. **Elimination**: every chosen column rules out matrix rows that disagree
//!    with it at that column.
//!
//! The engine is deterministic for a given seed. Time and input come from the
//! `portdive_env` abstraction, so the same [`GameSession`] runs against a real
//! terminal or a virtual clock.

pub mod config;
pub mod controls;
pub mod error;
pub mod game;
pub mod input;
pub mod key;
pub mod matrix;
pub mod pwner;
pub mod randomizer;
pub mod session;
pub mod snapshot;

#[cfg(feature = "dashboard")]
pub mod dashboard;

// Re-export key types for convenience
pub use config::{reference_rows, ConfigError, GameConfig, DEFAULT_TICK_INTERVAL};
pub use controls::Cursor;
pub use error::GameError;
pub use game::{ActionOutcome, Game, GameStatus, RejectReason, TickReport};
pub use input::{parse, ParseError, SelectionKind, SelectionStatement};
pub use key::Key;
pub use matrix::{Fragment, PortMatrix, PortRow, RowStatus};
pub use pwner::{ElementStatus, Pwner, PwnerChoice, PwnerElement};
pub use randomizer::Randomizer;
pub use session::{Frontend, GameSession, GAME_STREAM};
pub use snapshot::{ElementView, GameSnapshot, RowView};
