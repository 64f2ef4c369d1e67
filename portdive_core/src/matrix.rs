//! The port matrix: the grid of candidate rows, one of which is the key.

use crate::error::GameError;
use crate::pwner::{ElementStatus, Pwner};
use serde::{Deserialize, Serialize};

/// A single port address fragment.
pub type Fragment = i32;

/// Display state of a matrix row. Mirrors [`PortRow::selectable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowStatus {
    Active,
    Inactive,
}

/// A row within the port matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRow {
    fragments: Vec<Fragment>,
    selectable: bool,
}

impl PortRow {
    /// Creates a selectable row.
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self {
            fragments,
            selectable: true,
        }
    }

    /// Returns the fragment found at column `i`.
    pub fn get(&self, i: usize) -> Result<Fragment, GameError> {
        self.fragments
            .get(i)
            .copied()
            .ok_or_else(|| GameError::out_of_range("column", i, self.fragments.len()))
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn selectable(&self) -> bool {
        self.selectable
    }

    /// Active exactly when the row is selectable.
    pub fn status(&self) -> RowStatus {
        if self.selectable {
            RowStatus::Active
        } else {
            RowStatus::Inactive
        }
    }
}

/// The collection of port rows.
///
/// All rows share one column count, checked at construction. The matrix holds
/// no reference to the pwner; selectability is recomputed by passing the
/// pwner in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMatrix {
    rows: Vec<PortRow>,
}

impl PortMatrix {
    /// Builds a matrix from raw rows.
    ///
    /// Fails on an empty row set, zero-width rows, or rows whose fragment
    /// count differs from the first row.
    pub fn new(rows: Vec<Vec<Fragment>>) -> Result<Self, GameError> {
        let first = rows.first().ok_or(GameError::EmptyMatrix)?;
        let expected = first.len();
        if expected == 0 {
            return Err(GameError::NoColumns);
        }
        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != expected)
            .map(|(i, r)| (i, r.len()))
        {
            return Err(GameError::RaggedRow {
                row,
                expected,
                found,
            });
        }

        Ok(Self {
            rows: rows.into_iter().map(PortRow::new).collect(),
        })
    }

    /// Returns the row found at index `i`.
    pub fn row(&self, i: usize) -> Result<&PortRow, GameError> {
        self.rows
            .get(i)
            .ok_or_else(|| GameError::out_of_range("row", i, self.rows.len()))
    }

    pub fn rows(&self) -> &[PortRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns shared by every row.
    pub fn columns(&self) -> usize {
        self.rows[0].len()
    }

    /// Indices of the rows that are currently selectable.
    pub fn selectable_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.selectable)
            .map(|(i, _)| i)
            .collect()
    }

    /// Recomputes every row's selectability from the pwner's chosen elements.
    ///
    /// Idempotent: a second call without an intervening pwner change is a
    /// no-op. Returns the number of rows whose selectability changed.
    pub fn recompute_selectability(&mut self, pwner: &Pwner) -> usize {
        let mut changed = 0;
        for row in &mut self.rows {
            let selectable = Self::row_consistent(row, pwner);
            if row.selectable != selectable {
                row.selectable = selectable;
                changed += 1;
            }
        }
        changed
    }

    /// Makes every row selectable again (new session).
    pub(crate) fn reset(&mut self) {
        for row in &mut self.rows {
            row.selectable = true;
        }
    }

    fn row_consistent(row: &PortRow, pwner: &Pwner) -> bool {
        !pwner
            .elements()
            .iter()
            .zip(row.fragments.iter())
            .any(|(ele, &frag)| ele.status() == ElementStatus::Chosen && ele.fragment() != frag)
    }
}
