//! The game controller: owns key, matrix and pwner, and the win/loss state machine.
//!
//! ```text
//!                 choose key row / all pwner columns chosen
//!   InProgress ─────────────────────────────────────────────▶ Won
//!        │
//!        └──── choose a selectable row that is not the key ──▶ Lost
//! ```
//!
//! Both terminal states are final for the session; only [`Game::restart`]
//! begins a new one.

use crate::error::GameError;
use crate::input::{SelectionKind, SelectionStatement};
use crate::key::Key;
use crate::matrix::{Fragment, PortMatrix};
use crate::pwner::{Pwner, PwnerChoice};
use crate::randomizer::Randomizer;
use crate::snapshot::GameSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Overall state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Won,
    Lost,
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

/// Why a legal action had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The row was already eliminated, or the pwner element does not match the key
    NotSelectable,
    /// The session already ended
    GameOver,
}

/// Result of applying a player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Won,
    Lost,
    /// A pwner column moved to Chosen and the game goes on
    Locked { column: usize },
    /// Nothing changed
    Rejected(RejectReason),
}

impl ActionOutcome {
    /// Short text for the front-end.
    pub fn message(&self) -> String {
        match self {
            ActionOutcome::Won => "Access granted. You have won.".to_string(),
            ActionOutcome::Lost => "Wrong port. You have lost.".to_string(),
            ActionOutcome::Locked { column } => format!("Fragment {column} locked in."),
            ActionOutcome::Rejected(RejectReason::NotSelectable) => "Not selectable.".to_string(),
            ActionOutcome::Rejected(RejectReason::GameOver) => "The game is over.".to_string(),
        }
    }
}

/// What one tick changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: u64,
    /// Pwner columns that received a new fragment
    pub reshuffled: Vec<usize>,
    /// Matrix rows whose selectability flipped
    pub rows_changed: usize,
}

/// One game session.
#[derive(Debug, Clone)]
pub struct Game {
    matrix: PortMatrix,
    pwner: Pwner,
    key: Key,
    rng: Randomizer,
    status: GameStatus,
    tick_count: u64,
}

impl Game {
    /// Builds the matrix, randomizes the key and initializes the pwner.
    ///
    /// Fails if the row set is empty or ragged.
    pub fn new(rows: Vec<Vec<Fragment>>, seed: u64) -> Result<Self, GameError> {
        let matrix = PortMatrix::new(rows)?;
        let mut rng = Randomizer::new(seed);

        let mut key = Key::new();
        key.randomize(&matrix, &mut rng)?;
        let pwner = Pwner::init(&matrix, &mut rng)?;

        let mut game = Self {
            matrix,
            pwner,
            key,
            rng,
            status: GameStatus::InProgress,
            tick_count: 0,
        };
        game.settle()?;

        info!(
            seed,
            rows = game.matrix.len(),
            columns = game.matrix.columns(),
            "game started"
        );
        debug!(key_row = ?game.key.chosen_index(), "key randomized");
        Ok(game)
    }

    /// Starts a new session on the same matrix, continuing the random stream.
    pub fn restart(&mut self) -> Result<(), GameError> {
        self.key.reset();
        self.matrix.reset();
        self.key.randomize(&self.matrix, &mut self.rng)?;
        self.pwner = Pwner::init(&self.matrix, &mut self.rng)?;
        self.status = GameStatus::InProgress;
        self.tick_count = 0;
        self.settle()?;

        info!("game restarted");
        debug!(key_row = ?self.key.chosen_index(), "key randomized");
        Ok(())
    }

    /// Periodic update: mutates the pwner, then recomputes the matrix.
    ///
    /// Returns `None` once the game is over.
    pub fn tick(&mut self) -> Result<Option<TickReport>, GameError> {
        if self.status.is_over() {
            return Ok(None);
        }
        let reshuffled = self.pwner.tick(&self.matrix, &self.key, &mut self.rng)?;
        let rows_changed = self.matrix.recompute_selectability(&self.pwner);
        self.tick_count += 1;

        debug!(tick = self.tick_count, ?reshuffled, rows_changed, "tick");
        Ok(Some(TickReport {
            tick: self.tick_count,
            reshuffled,
            rows_changed,
        }))
    }

    /// Commits matrix row `index` as the player's guess for the key.
    pub fn choose_row(&mut self, index: usize) -> Result<ActionOutcome, GameError> {
        let selectable = self.matrix.row(index)?.selectable();
        if self.status.is_over() {
            return Ok(ActionOutcome::Rejected(RejectReason::GameOver));
        }

        let outcome = if Some(index) == self.key.chosen_index() {
            self.status = GameStatus::Won;
            ActionOutcome::Won
        } else if !selectable {
            ActionOutcome::Rejected(RejectReason::NotSelectable)
        } else {
            self.status = GameStatus::Lost;
            ActionOutcome::Lost
        };
        self.log_outcome(outcome);
        Ok(outcome)
    }

    /// Locks pwner column `index` if its fragment currently matches the key.
    pub fn choose_element(&mut self, index: usize) -> Result<ActionOutcome, GameError> {
        self.pwner.get(index)?;
        if self.status.is_over() {
            return Ok(ActionOutcome::Rejected(RejectReason::GameOver));
        }

        let outcome = match self.pwner.apply_player_choice(index, &self.key)? {
            PwnerChoice::NotSelectable => ActionOutcome::Rejected(RejectReason::NotSelectable),
            PwnerChoice::Locked => {
                self.matrix.recompute_selectability(&self.pwner);
                if self.pwner.all_chosen() {
                    self.status = GameStatus::Won;
                    ActionOutcome::Won
                } else {
                    ActionOutcome::Locked { column: index }
                }
            }
        };
        self.log_outcome(outcome);
        Ok(outcome)
    }

    /// Routes a parsed command to the matching choice.
    pub fn apply(&mut self, statement: SelectionStatement) -> Result<ActionOutcome, GameError> {
        match statement.kind {
            SelectionKind::Matrix => self.choose_row(statement.index),
            SelectionKind::Pwner => self.choose_element(statement.index),
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn matrix(&self) -> &PortMatrix {
        &self.matrix
    }

    pub fn pwner(&self) -> &Pwner {
        &self.pwner
    }

    /// The secret row. Front-ends must not reveal it while the game runs.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Number of ticks since the session started.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Read-only view for rendering. Never includes the key.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::capture(self)
    }

    /// Brings pwner and matrix in line with the key without resampling.
    fn settle(&mut self) -> Result<(), GameError> {
        self.pwner.refresh(&self.key)?;
        self.matrix.recompute_selectability(&self.pwner);
        Ok(())
    }

    fn log_outcome(&self, outcome: ActionOutcome) {
        match outcome {
            ActionOutcome::Won => info!(ticks = self.tick_count, "game won"),
            ActionOutcome::Lost => info!(ticks = self.tick_count, "game lost"),
            ActionOutcome::Locked { column } => info!(column, "pwner column locked"),
            ActionOutcome::Rejected(reason) => debug!(?reason, "action rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::reference_rows;
    use crate::pwner::ElementStatus;
    use proptest::prelude::*;

    fn new_game(seed: u64) -> Game {
        Game::new(reference_rows(), seed).unwrap()
    }

    /// Ticks until at least one pwner column is selectable.
    fn tick_until_selectable(game: &mut Game) -> usize {
        loop {
            if let Some(j) = game.pwner().elements().iter().position(|e| e.selectable()) {
                return j;
            }
            game.tick().unwrap();
        }
    }

    #[test]
    fn test_new_game_state() {
        let game = new_game(42);
        assert_eq!(game.status(), GameStatus::InProgress);
        assert_eq!(game.tick_count(), 0);
        assert_eq!(game.pwner().len(), 4);
        assert!(game.matrix().rows().iter().all(|r| r.selectable()));
        for (j, e) in game.pwner().elements().iter().enumerate() {
            assert_eq!(e.selectable(), e.fragment() == game.key().get(j).unwrap());
        }
    }

    #[test]
    fn test_configuration_errors_are_fatal() {
        assert!(matches!(Game::new(vec![], 1), Err(GameError::EmptyMatrix)));
        assert!(matches!(
            Game::new(vec![vec![1, 2], vec![3]], 1),
            Err(GameError::RaggedRow { .. })
        ));
    }

    #[test]
    fn test_choosing_key_row_wins() {
        let mut game = new_game(7);
        let k = game.key().chosen_index().unwrap();
        assert_eq!(game.choose_row(k).unwrap(), ActionOutcome::Won);
        assert_eq!(game.status(), GameStatus::Won);
    }

    #[test]
    fn test_choosing_wrong_selectable_row_loses() {
        let mut game = new_game(7);
        let k = game.key().chosen_index().unwrap();
        let wrong = (k + 1) % game.matrix().len();
        assert_eq!(game.choose_row(wrong).unwrap(), ActionOutcome::Lost);
        assert_eq!(game.status(), GameStatus::Lost);
    }

    #[test]
    fn test_choosing_inactive_row_is_a_noop() {
        let mut game = new_game(21);
        let column = tick_until_selectable(&mut game);
        game.choose_element(column).unwrap();

        let key_fragment = game.key().get(column).unwrap();
        let inactive = game
            .matrix()
            .rows()
            .iter()
            .position(|r| r.get(column).unwrap() != key_fragment)
            .expect("reference matrix has rows differing in every column");
        assert!(!game.matrix().row(inactive).unwrap().selectable());

        assert_eq!(
            game.choose_row(inactive).unwrap(),
            ActionOutcome::Rejected(RejectReason::NotSelectable)
        );
        assert_eq!(game.status(), GameStatus::InProgress);
    }

    #[test]
    fn test_terminal_status_is_final() {
        let mut game = new_game(3);
        let k = game.key().chosen_index().unwrap();
        game.choose_row(k).unwrap();

        let before = game.snapshot();
        assert_eq!(
            game.choose_row((k + 1) % game.matrix().len()).unwrap(),
            ActionOutcome::Rejected(RejectReason::GameOver)
        );
        assert_eq!(
            game.choose_element(0).unwrap(),
            ActionOutcome::Rejected(RejectReason::GameOver)
        );
        assert_eq!(game.tick().unwrap(), None);
        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(before, game.snapshot());
    }

    #[test]
    fn test_out_of_range_choices_are_typed_errors() {
        let mut game = new_game(3);
        assert!(matches!(
            game.choose_row(8),
            Err(GameError::IndexOutOfRange { target: "row", .. })
        ));
        assert!(matches!(
            game.choose_element(4),
            Err(GameError::IndexOutOfRange { target: "pwner column", .. })
        ));
        assert_eq!(game.status(), GameStatus::InProgress);
    }

    #[test]
    fn test_non_selectable_element_is_rejected() {
        let mut game = new_game(5);
        // Find or wait for an inactive column
        let column = loop {
            if let Some(j) = game.pwner().elements().iter().position(|e| !e.selectable()) {
                break j;
            }
            game.tick().unwrap();
        };
        let before = game.snapshot();
        assert_eq!(
            game.choose_element(column).unwrap(),
            ActionOutcome::Rejected(RejectReason::NotSelectable)
        );
        assert_eq!(before, game.snapshot());
    }

    #[test]
    fn test_locking_columns_wins_or_stalls_on_last_column() {
        for seed in [99, 100, 101, 102] {
            let mut game = new_game(seed);
            let mut guard = 0;
            loop {
                let selectable = game.pwner().elements().iter().position(|e| e.selectable());
                if let Some(j) = selectable {
                    let outcome = game.choose_element(j).unwrap();
                    assert!(matches!(outcome, ActionOutcome::Locked { .. } | ActionOutcome::Won));
                }
                if game.status() != GameStatus::InProgress {
                    break;
                }
                // A single unchosen column is never reshuffled again
                let unchosen = game.pwner().len() - game.pwner().chosen_columns().len();
                if unchosen == 1 && selectable.is_none() {
                    break;
                }
                game.tick().unwrap();
                guard += 1;
                assert!(guard < 10_000, "pwner sweep did not converge");
            }

            let k = game.key().chosen_index().unwrap();
            assert!(game.matrix().row(k).unwrap().selectable());
            match game.status() {
                GameStatus::Won => {
                    assert!(game.pwner().all_chosen());
                    for (j, e) in game.pwner().elements().iter().enumerate() {
                        assert_eq!(e.fragment(), game.key().get(j).unwrap());
                    }
                }
                GameStatus::InProgress => {
                    let before = game.pwner().clone();
                    for _ in 0..100 {
                        assert!(game.tick().unwrap().unwrap().reshuffled.is_empty());
                    }
                    assert_eq!(&before, game.pwner());
                }
                GameStatus::Lost => panic!("locking columns can never lose"),
            }
        }
    }

    #[test]
    fn test_apply_routes_statements() {
        let mut game = new_game(8);
        let k = game.key().chosen_index().unwrap();
        assert_eq!(
            game.apply(SelectionStatement::matrix(k)).unwrap(),
            ActionOutcome::Won
        );
    }

    #[test]
    fn test_restart_begins_new_session() {
        let mut game = new_game(12);
        let k = game.key().chosen_index().unwrap();
        game.choose_row((k + 1) % game.matrix().len()).unwrap();
        assert_eq!(game.status(), GameStatus::Lost);

        game.restart().unwrap();
        assert_eq!(game.status(), GameStatus::InProgress);
        assert_eq!(game.tick_count(), 0);
        assert!(game.key().is_randomized());
        assert!(game.pwner().chosen_columns().is_empty());
        assert!(game.matrix().rows().iter().all(|r| r.selectable()));
    }

    #[test]
    fn test_same_seed_same_game() {
        let mut a = new_game(1234);
        let mut b = new_game(1234);
        for _ in 0..50 {
            assert_eq!(a.tick().unwrap(), b.tick().unwrap());
        }
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(a.key(), b.key());
    }

    proptest! {
        #[test]
        fn prop_matrix_selectability_matches_chosen_elements(
            seed in any::<u64>(),
            actions in proptest::collection::vec(0usize..5, 1..80),
        ) {
            let mut game = new_game(seed);
            for action in actions {
                if action == 4 {
                    game.tick().unwrap();
                } else {
                    game.choose_element(action).unwrap();
                }
                for row in game.matrix().rows() {
                    let contradicted = game
                        .pwner()
                        .elements()
                        .iter()
                        .zip(row.fragments())
                        .any(|(e, &f)| e.status() == ElementStatus::Chosen && e.fragment() != f);
                    prop_assert_eq!(row.selectable(), !contradicted);
                }
            }
        }
    }
}
