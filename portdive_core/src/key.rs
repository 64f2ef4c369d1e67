//! The key: the secret matrix row the player is hunting for.

use crate::error::GameError;
use crate::matrix::{Fragment, PortMatrix};
use crate::randomizer::Randomizer;

/// A copy of one matrix row, sampled once per session.
///
/// Starts empty; `randomize` fills it exactly once, and it stays fixed until
/// `reset`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Key {
    fragments: Vec<Fragment>,
    chosen_index: Option<usize>,
}

impl Key {
    /// Creates an empty key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chooses a random row of `matrix` and copies its fragments.
    ///
    /// Randomizing an already randomized key replaces it; callers should
    /// `reset` first when starting a new session.
    pub fn randomize(
        &mut self,
        matrix: &PortMatrix,
        rng: &mut Randomizer,
    ) -> Result<(), GameError> {
        let index = rng.sample(0, matrix.len() - 1)?;
        self.fragments = matrix.row(index)?.fragments().to_vec();
        self.chosen_index = Some(index);
        Ok(())
    }

    /// Clears the key.
    pub fn reset(&mut self) {
        self.fragments.clear();
        self.chosen_index = None;
    }

    /// Returns the fragment at column `i`.
    pub fn get(&self, i: usize) -> Result<Fragment, GameError> {
        if self.chosen_index.is_none() {
            return Err(GameError::KeyNotRandomized);
        }
        self.fragments
            .get(i)
            .copied()
            .ok_or_else(|| GameError::out_of_range("key column", i, self.fragments.len()))
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Index of the matrix row the key was sampled from.
    pub fn chosen_index(&self) -> Option<usize> {
        self.chosen_index
    }

    pub fn is_randomized(&self) -> bool {
        self.chosen_index.is_some()
    }
}
