//! Game Session - drives a [`Game`] from the environment context.
//!
//! This module is the integration layer between the pure puzzle engine and the
//! environment abstraction (`GameContext`, `CommandSource`).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        GameSession                          │
//! │  ┌──────────────────────┐    ┌──────────────────────────┐   │
//! │  │ Context: GameContext │    │ Source: CommandSource    │   │
//! │  │  • now() / sleep()   │    │  • next_line()           │   │
//! │  │  • derive_seed()     │    │  • finish()              │   │
//! │  └──────────┬───────────┘    └────────────┬─────────────┘   │
//! │             │ tick deadline                │ line            │
//! │             ▼                              ▼                 │
//! │        ┌────────────────── select ──────────────────┐        │
//! │        │  exactly one transition per iteration      │        │
//! │        └─────────────────────┬──────────────────────┘        │
//! │                              ▼                               │
//! │                     Game ──▶ Frontend::render                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session is the only owner of the game, so ticks and player commands
//! can never interleave.

use crate::config::GameConfig;
use crate::error::GameError;
use crate::game::{Game, GameStatus};
use crate::input::parse;
use crate::snapshot::GameSnapshot;
use portdive_env::{CommandSource, GameContext, SessionId};

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Randomness stream used for the game itself.
pub const GAME_STREAM: u64 = 1;

/// Receives a fresh view of the game after every transition.
pub trait Frontend: Send {
    /// Draws the game. `messages` holds feedback for the last transition
    /// (parse errors, rejected actions, outcomes) and is often empty.
    fn render(&mut self, snapshot: &GameSnapshot, messages: &[String]);
}

/// A running game bound to its environment.
pub struct GameSession<Ctx, Src>
where
    Ctx: GameContext,
    Src: CommandSource,
{
    /// Session identifier (for logging)
    pub session_id: SessionId,

    /// Environment context
    context: Arc<Ctx>,

    /// Player input
    source: Arc<Src>,

    /// The game being played
    game: Game,

    /// Fixed tick cadence
    tick_interval: Duration,
}

impl<Ctx, Src> GameSession<Ctx, Src>
where
    Ctx: GameContext,
    Src: CommandSource,
{
    /// Builds the game from `config`, seeded from the context.
    pub fn new(
        context: Arc<Ctx>,
        source: Arc<Src>,
        config: &GameConfig,
    ) -> Result<Self, GameError> {
        let seed = context.derive_seed(GAME_STREAM);
        let game = Game::new(config.rows.clone(), seed)?;
        let session_id = SessionId::from_seed(context.seed());
        info!(%session_id, master_seed = context.seed(), "session created");

        Ok(Self {
            session_id,
            context,
            source,
            game,
            tick_interval: config.tick_interval,
        })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Runs the event loop until the game ends or input closes.
    ///
    /// Returns the final status; `InProgress` means the input closed first.
    /// The command source is finished on the way out in every case.
    pub async fn run<F: Frontend>(
        &mut self,
        frontend: &mut F,
    ) -> Result<GameStatus, GameError> {
        let result = self.event_loop(frontend).await;
        self.source.finish();
        info!(session_id = %self.session_id, status = ?self.game.status(), "session ended");
        result
    }

    async fn event_loop<F: Frontend>(
        &mut self,
        frontend: &mut F,
    ) -> Result<GameStatus, GameError> {
        let context = Arc::clone(&self.context);
        let source = Arc::clone(&self.source);

        frontend.render(&self.game.snapshot(), &[]);
        let mut next_tick = context.now() + self.tick_interval;

        while !self.game.status().is_over() {
            let wait = next_tick.saturating_sub(context.now());
            let mut messages = Vec::new();

            tokio::select! {
                biased;

                line = source.next_line() => match line {
                    Some(line) => self.handle_line(&line, &mut messages)?,
                    None => {
                        info!("input closed");
                        break;
                    }
                },
                _ = context.sleep(wait) => {
                    self.game.tick()?;
                    next_tick += self.tick_interval;
                }
            }

            frontend.render(&self.game.snapshot(), &messages);
        }

        Ok(self.game.status())
    }

    /// Parses and applies one line. Bad lines are reported, never fatal.
    fn handle_line(&mut self, line: &str, messages: &mut Vec<String>) -> Result<(), GameError> {
        let statement = match parse(line) {
            Ok(statement) => statement,
            Err(e) => {
                warn!(line, "parse error: {}", e);
                messages.push(e.to_string());
                return Ok(());
            }
        };

        match self.game.apply(statement) {
            Ok(outcome) => messages.push(outcome.message()),
            Err(e @ GameError::IndexOutOfRange { .. }) => {
                warn!(%statement, "rejected: {}", e);
                messages.push(e.to_string());
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}
