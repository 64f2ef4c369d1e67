//! Cursor controls for keystroke front-ends.
//!
//! The cursor belongs to the UI, not to the game: moving it never fails and
//! never touches game state. Committing routes the selection under the cursor
//! to the game.

use crate::error::GameError;
use crate::game::{ActionOutcome, Game};

/// Current cursor positions: a matrix row and a pwner column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub column: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the matrix cursor up; stops at the topmost row.
    pub fn move_up(&mut self) {
        self.row = self.row.saturating_sub(1);
    }

    /// Moves the matrix cursor down; stops at the bottommost row.
    pub fn move_down(&mut self, game: &Game) {
        if self.row + 1 < game.matrix().len() {
            self.row += 1;
        }
    }

    /// Moves the pwner cursor left; stops at the leftmost column.
    pub fn move_left(&mut self) {
        self.column = self.column.saturating_sub(1);
    }

    /// Moves the pwner cursor right; stops at the rightmost column.
    pub fn move_right(&mut self, game: &Game) {
        if self.column + 1 < game.pwner().len() {
            self.column += 1;
        }
    }

    /// Commits the matrix row under the cursor.
    pub fn commit_row(&self, game: &mut Game) -> Result<ActionOutcome, GameError> {
        game.choose_row(self.row)
    }

    /// Commits the pwner column under the cursor.
    pub fn commit_column(&self, game: &mut Game) -> Result<ActionOutcome, GameError> {
        game.choose_element(self.column)
    }
}
