//! Errors that abort a scenario run.

use portdive_core::GameError;
use thiserror::Error;

/// Why a scenario could not complete.
///
/// Failed assertions are not errors: they end up in
/// [`ScenarioResult::failure_reason`](crate::ScenarioResult).
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl SimError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }
}
