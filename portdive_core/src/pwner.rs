//! The pwner: the mutating fragment device matched to the key column by column.
//!
//! Column `j` of the pwner corresponds to column `j` of every matrix row and
//! of the key. Each tick reshuffles a random subset of the columns that have
//! not been chosen yet; a chosen column keeps its fragment for the rest of the
//! session.

use crate::error::GameError;
use crate::key::Key;
use crate::matrix::{Fragment, PortMatrix};
use crate::randomizer::Randomizer;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// State of one pwner element.
///
/// `Chosen` is terminal: no operation moves an element out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementStatus {
    Active,
    Inactive,
    Chosen,
}

/// One column of the pwner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwnerElement {
    fragment: Fragment,
    status: ElementStatus,
}

impl PwnerElement {
    pub fn fragment(&self) -> Fragment {
        self.fragment
    }

    pub fn status(&self) -> ElementStatus {
        self.status
    }

    /// Selectable exactly when Active; a chosen element is never selectable.
    pub fn selectable(&self) -> bool {
        self.status == ElementStatus::Active
    }
}

/// Result of a player's attempt to lock a pwner column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwnerChoice {
    /// The element moved to `Chosen`
    Locked,
    /// The element was not selectable; nothing changed
    NotSelectable,
}

/// The pwner device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pwner {
    elements: Vec<PwnerElement>,
}

impl Pwner {
    /// Builds a pwner with one element per matrix column.
    ///
    /// Each column's fragment is taken from an independently sampled row, so it
    /// is always a value that occurs in that column. Elements start Inactive.
    pub fn init(matrix: &PortMatrix, rng: &mut Randomizer) -> Result<Self, GameError> {
        let elements = (0..matrix.columns())
            .map(|j| {
                let row = rng.sample(0, matrix.len() - 1)?;
                Ok(PwnerElement {
                    fragment: matrix.row(row)?.get(j)?,
                    status: ElementStatus::Inactive,
                })
            })
            .collect::<Result<Vec<_>, GameError>>()?;
        Ok(Self { elements })
    }

    /// Returns the element at column `i`.
    pub fn get(&self, i: usize) -> Result<&PwnerElement, GameError> {
        self.elements
            .get(i)
            .ok_or_else(|| GameError::out_of_range("pwner column", i, self.elements.len()))
    }

    pub fn elements(&self) -> &[PwnerElement] {
        &self.elements
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Columns whose element is chosen, ascending.
    pub fn chosen_columns(&self) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.status == ElementStatus::Chosen)
            .map(|(i, _)| i)
            .collect()
    }

    /// True once every element is chosen.
    pub fn all_chosen(&self) -> bool {
        self.elements
            .iter()
            .all(|e| e.status == ElementStatus::Chosen)
    }

    /// Time-driven mutation.
    ///
    /// Reshuffles between zero and half of the unchosen columns, each at most
    /// once, drawing every new fragment from a freshly sampled matrix row at
    /// the same column, then re-derives every element's state against the key.
    /// Returns the reshuffled columns in the order they were drawn.
    pub fn tick(
        &mut self,
        matrix: &PortMatrix,
        key: &Key,
        rng: &mut Randomizer,
    ) -> Result<Vec<usize>, GameError> {
        let mut excluded = self.chosen_columns();
        let unchosen = self.len() - excluded.len();
        let count = rng.sample(0, unchosen / 2)?;

        let mut reshuffled = Vec::with_capacity(count);
        for _ in 0..count {
            let column = rng.sample_excluding(0, self.len() - 1, &excluded)?;
            let row = rng.sample(0, matrix.len() - 1)?;
            self.elements[column].fragment = matrix.row(row)?.get(column)?;

            let pos = excluded.binary_search(&column).unwrap_or_else(|pos| pos);
            excluded.insert(pos, column);
            reshuffled.push(column);
        }
        debug!(?reshuffled, "pwner reshuffled");

        self.refresh(key)?;
        Ok(reshuffled)
    }

    /// Re-derives selectability without touching any fragment.
    ///
    /// Unchosen elements become Active when they match the key at their column
    /// and Inactive otherwise. Chosen elements are left alone.
    pub fn refresh(&mut self, key: &Key) -> Result<(), GameError> {
        for (j, element) in self.elements.iter_mut().enumerate() {
            if element.status == ElementStatus::Chosen {
                continue;
            }
            element.status = if element.fragment == key.get(j)? {
                ElementStatus::Active
            } else {
                ElementStatus::Inactive
            };
        }
        Ok(())
    }

    /// Applies a player's choice of column `index`.
    ///
    /// A selectable element becomes Chosen; then all states are re-derived
    /// without resampling, so the visible state reflects the choice without
    /// advancing randomness.
    pub fn apply_player_choice(
        &mut self,
        index: usize,
        key: &Key,
    ) -> Result<PwnerChoice, GameError> {
        let choice = if self.get(index)?.selectable() {
            self.elements[index].status = ElementStatus::Chosen;
            PwnerChoice::Locked
        } else {
            PwnerChoice::NotSelectable
        };
        self.refresh(key)?;
        Ok(choice)
    }

    #[cfg(test)]
    pub(crate) fn force_fragment(&mut self, i: usize, fragment: Fragment) {
        self.elements[i].fragment = fragment;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn setup(seed: u64) -> (PortMatrix, Key, Pwner, Randomizer) {
        let matrix = PortMatrix::new(crate::config::reference_rows()).unwrap();
        let mut rng = Randomizer::new(seed);
        let mut key = Key::new();
        key.randomize(&matrix, &mut rng).unwrap();
        let pwner = Pwner::init(&matrix, &mut rng).unwrap();
        (matrix, key, pwner, rng)
    }

    #[test]
    fn test_init_draws_column_consistent_fragments() {
        let (matrix, _, pwner, _) = setup(42);
        assert_eq!(pwner.len(), matrix.columns());
        for (j, element) in pwner.elements().iter().enumerate() {
            assert!(matrix
                .rows()
                .iter()
                .any(|r| r.get(j).unwrap() == element.fragment()));
            assert_eq!(element.status(), ElementStatus::Inactive);
            assert!(!element.selectable());
        }
    }

    #[test]
    fn test_refresh_marks_key_matches_active() {
        let (_, key, mut pwner, _) = setup(5);
        pwner.refresh(&key).unwrap();
        for (j, element) in pwner.elements().iter().enumerate() {
            assert_eq!(element.selectable(), element.fragment() == key.get(j).unwrap());
        }
    }

    #[test]
    fn test_choice_locks_only_selectable_elements() {
        let (_, key, mut pwner, _) = setup(9);
        pwner.force_fragment(0, key.get(0).unwrap());
        pwner.force_fragment(1, key.get(1).unwrap() + 1);
        pwner.refresh(&key).unwrap();

        assert_eq!(pwner.apply_player_choice(1, &key).unwrap(), PwnerChoice::NotSelectable);
        assert_eq!(pwner.get(1).unwrap().status(), ElementStatus::Inactive);

        assert_eq!(pwner.apply_player_choice(0, &key).unwrap(), PwnerChoice::Locked);
        assert_eq!(pwner.get(0).unwrap().status(), ElementStatus::Chosen);
        assert!(!pwner.get(0).unwrap().selectable());

        // Choosing it again is a no-op
        assert_eq!(pwner.apply_player_choice(0, &key).unwrap(), PwnerChoice::NotSelectable);
        assert_eq!(pwner.chosen_columns(), vec![0]);
    }

    #[test]
    fn test_choice_out_of_range() {
        let (_, key, mut pwner, _) = setup(9);
        assert!(matches!(
            pwner.apply_player_choice(4, &key),
            Err(GameError::IndexOutOfRange { index: 4, len: 4, .. })
        ));
    }

    #[test]
    fn test_tick_reshuffles_at_most_half_of_unchosen() {
        let (matrix, key, mut pwner, mut rng) = setup(11);
        for _ in 0..200 {
            let reshuffled = pwner.tick(&matrix, &key, &mut rng).unwrap();
            assert!(reshuffled.len() <= pwner.len() / 2);
            let mut unique = reshuffled.clone();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), reshuffled.len());
        }
    }

    #[test]
    fn test_tick_never_touches_chosen_columns() {
        let (matrix, key, mut pwner, mut rng) = setup(13);
        pwner.force_fragment(2, key.get(2).unwrap());
        pwner.refresh(&key).unwrap();
        pwner.apply_player_choice(2, &key).unwrap();

        for _ in 0..500 {
            let reshuffled = pwner.tick(&matrix, &key, &mut rng).unwrap();
            assert!(!reshuffled.contains(&2));
            let element = pwner.get(2).unwrap();
            assert_eq!(element.status(), ElementStatus::Chosen);
            assert_eq!(element.fragment(), key.get(2).unwrap());
        }
    }

    #[test]
    fn test_tick_with_everything_chosen_is_stable() {
        let (matrix, key, mut pwner, mut rng) = setup(17);
        for j in 0..pwner.len() {
            pwner.force_fragment(j, key.get(j).unwrap());
        }
        pwner.refresh(&key).unwrap();
        for j in 0..pwner.len() {
            pwner.apply_player_choice(j, &key).unwrap();
        }
        assert!(pwner.all_chosen());

        let before = pwner.clone();
        assert!(pwner.tick(&matrix, &key, &mut rng).unwrap().is_empty());
        assert_eq!(before, pwner);
    }

    #[test]
    fn test_single_unchosen_column_is_never_reshuffled() {
        let (matrix, key, mut pwner, mut rng) = setup(19);
        for j in 0..3 {
            pwner.force_fragment(j, key.get(j).unwrap());
        }
        pwner.force_fragment(3, key.get(3).unwrap() + 1);
        pwner.refresh(&key).unwrap();
        for j in 0..3 {
            pwner.apply_player_choice(j, &key).unwrap();
        }

        for _ in 0..100 {
            assert!(pwner.tick(&matrix, &key, &mut rng).unwrap().is_empty());
        }
        assert_eq!(pwner.get(3).unwrap().status(), ElementStatus::Inactive);
        assert_eq!(pwner.get(3).unwrap().fragment(), key.get(3).unwrap() + 1);
    }

    proptest! {
        #[test]
        fn prop_chosen_is_monotonic(
            seed in any::<u64>(),
            actions in proptest::collection::vec(0usize..5, 1..60),
        ) {
            let (matrix, key, mut pwner, mut rng) = setup(seed);
            pwner.refresh(&key).unwrap();
            let mut locked: Vec<(usize, Fragment)> = Vec::new();

            for action in actions {
                if action == 4 {
                    pwner.tick(&matrix, &key, &mut rng).unwrap();
                } else if pwner.apply_player_choice(action, &key).unwrap() == PwnerChoice::Locked {
                    locked.push((action, pwner.get(action).unwrap().fragment()));
                }
                for &(j, fragment) in &locked {
                    let element = pwner.get(j).unwrap();
                    prop_assert_eq!(element.status(), ElementStatus::Chosen);
                    prop_assert_eq!(element.fragment(), fragment);
                    prop_assert_eq!(fragment, key.get(j).unwrap());
                }
            }
        }
    }
}
