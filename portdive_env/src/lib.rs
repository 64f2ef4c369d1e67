//! PortDive Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the PortDive game
//! engine to run both in a **Terminal** (tokio, real stdin) and in a
//! **Simulation** (virtual clock, scripted input).
//!
//! # Core Concept: The Reactor Pattern
//!
//! The game core never touches the outside world directly. Everything that
//! would introduce non-determinism is routed through this crate:
//! - Time (`now()`, `sleep()`)
//! - Player input (`next_line()`, `finish()`)
//! - Randomness (`derive_seed()`)
//!
//! By deriving all entropy from a single 64-bit seed, any game can be
//! replayed from its seed number.
//!
//! # Example
//!
//! ```ignore
//! use portdive_env::{GameContext, CommandSource};
//!
//! async fn game_loop<Ctx: GameContext, Src: CommandSource>(ctx: &Ctx, src: &Src) {
//!     loop {
//!         tokio::select! {
//!             line = src.next_line() => handle_line(line),
//!             _ = ctx.sleep(Duration::from_millis(1500)) => tick(),
//!         }
//!     }
//! }
//! ```

mod context;
mod error;
mod source;
mod tokio_impl;
mod types;

pub use context::{GameContext, mix_seed};
pub use error::EnvError;
pub use source::CommandSource;
pub use tokio_impl::{StdinSource, TokioContext};
pub use types::SessionId;
