//! Error types for the PortDive core.

use thiserror::Error;

/// Errors raised by the puzzle engine.
///
/// Rejected-but-legal player actions are never errors; they surface as
/// [`crate::ActionOutcome::Rejected`].
#[derive(Debug, Error)]
pub enum GameError {
    /// The initial row set is empty
    #[error("port matrix has no rows")]
    EmptyMatrix,

    /// The initial rows carry no fragments
    #[error("port matrix rows have no columns")]
    NoColumns,

    /// A row's fragment count differs from the first row's
    #[error("row {row} has {found} fragments, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// An index supplied by the player or the UI does not exist
    #[error("{target} index {index} out of range (len {len})")]
    IndexOutOfRange {
        target: &'static str,
        index: usize,
        len: usize,
    },

    /// `low > high` handed to the randomizer
    #[error("invalid sampling range [{low}, {high}]")]
    InvalidRange { low: usize, high: usize },

    /// More exclusions than the range can absorb
    #[error("cannot exclude {excluded} values from [{low}, {high}]")]
    ExclusionTooLarge {
        excluded: usize,
        low: usize,
        high: usize,
    },

    /// The key was read before it was randomized
    #[error("key has not been randomized")]
    KeyNotRandomized,
}

impl GameError {
    /// Creates an out-of-range error.
    pub fn out_of_range(target: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { target, index, len }
    }
}
