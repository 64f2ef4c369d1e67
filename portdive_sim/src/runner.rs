//! Scenario runner - executes simulation scenarios against the engine.

use crate::context::SimContext;
use crate::error::SimError;
use crate::exporter::{SimEvent, SimExport, SimFrame};
use crate::oracle::{Oracle, Strategy};
use crate::scenarios::ScenarioId;
use crate::source::ScriptedSource;

use portdive_core::{
    parse, reference_rows, ActionOutcome, Fragment, Frontend, Game, GameConfig, GameError,
    GameSession, GameSnapshot, GameStatus, SelectionKind, DEFAULT_TICK_INTERVAL, GAME_STREAM,
};
use portdive_env::GameContext;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Randomness stream for oracle strategy choices.
pub const ORACLE_STREAM: u64 = 2;

/// Randomness stream for generated input.
pub const INPUT_STREAM: u64 = 3;

/// Characters garbage lines are built from.
const GARBAGE_ALPHABET: &[u8] = b"pdPD0123456789 \t-+x!.";

/// Lines fed by the garbage_input scenario.
const GARBAGE_LINES: usize = 200;

/// Tick at which the session_loop script commits the key row.
const SESSION_WIN_TICK: u32 = 5;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub ticks: u64,

    /// Game status when the run stopped
    pub final_status: GameStatus,

    /// Failure message if any
    pub failure_reason: Option<String>,
}

/// What a scenario reports back before it is turned into a result.
struct Verdict {
    ticks: u64,
    status: GameStatus,
    failure: Option<String>,
}

impl Verdict {
    fn of(game: &Game, failure: Option<String>) -> Self {
        Self {
            ticks: game.tick_count(),
            status: game.status(),
            failure,
        }
    }
}

/// How an oracle-driven run stopped.
#[derive(Debug, Default)]
struct Drive {
    /// The oracle can no longer make progress
    stalled: bool,
    /// Last matrix row committed, if any
    committed_row: Option<usize>,
}

/// Collects frames when exporting; a no-op otherwise.
struct Recorder {
    export: Option<SimExport>,
}

impl Recorder {
    fn disabled() -> Self {
        Self { export: None }
    }

    fn enabled(scenario: ScenarioId, seed: u64) -> Self {
        Self {
            export: Some(SimExport::new(scenario.name(), seed)),
        }
    }

    fn set_key_row(&mut self, key_row: usize) {
        if let Some(export) = &mut self.export {
            export.key_row = Some(key_row);
        }
    }

    fn frame(&mut self, ctx: &SimContext, game: &Game, events: Vec<SimEvent>) {
        if self.export.is_some() {
            self.snapshot(ctx, game.snapshot(), events);
        }
    }

    fn snapshot(&mut self, ctx: &SimContext, snapshot: GameSnapshot, events: Vec<SimEvent>) {
        if let Some(export) = &mut self.export {
            export.add_frame(SimFrame {
                time_ms: ctx.now().as_millis() as u64,
                snapshot,
                events,
            });
        }
    }
}

/// Frontend that feeds session frames into the recorder.
struct SimFrontend<'a> {
    ctx: SimContext,
    recorder: &'a mut Recorder,
    messages: Vec<String>,
}

impl Frontend for SimFrontend<'_> {
    fn render(&mut self, snapshot: &GameSnapshot, messages: &[String]) {
        self.messages.extend(messages.iter().cloned());
        let events = messages.iter().map(SimEvent::info).collect();
        self.recorder.snapshot(&self.ctx, snapshot.clone(), events);
    }
}

/// Runs simulation scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Tick budget per run
    max_ticks: u64,

    /// Matrix every game is built from
    rows: Vec<Vec<Fragment>>,

    /// Virtual time between ticks
    tick_interval: Duration,
}

impl ScenarioRunner {
    /// Creates a new scenario runner on the reference matrix.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            max_ticks: 1000,
            rows: reference_rows(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Sets the tick budget.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Uses a different matrix.
    pub fn with_rows(mut self, rows: Vec<Vec<Fragment>>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, &mut Recorder::disabled())
    }

    /// Runs a scenario and records every frame.
    pub fn run_with_export(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        let mut recorder = Recorder::enabled(scenario, self.seed);
        let result = self.execute(scenario, &mut recorder);

        let mut export = recorder
            .export
            .unwrap_or_else(|| SimExport::new(scenario.name(), self.seed));
        export.finalize(result.passed, result.final_status, result.failure_reason.clone());
        (result, export)
    }

    fn execute(&self, scenario: ScenarioId, recorder: &mut Recorder) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let verdict = match scenario {
            ScenarioId::PwnerSweep => self.run_pwner_sweep(recorder),
            ScenarioId::Deduction => self.run_deduction(recorder),
            ScenarioId::BlindGuess => self.run_blind_guess(recorder),
            ScenarioId::GarbageInput => self.run_garbage_input(recorder),
            ScenarioId::ChosenDrift => self.run_chosen_drift(recorder),
            ScenarioId::SessionLoop => self.run_session_loop(recorder),
        };

        let (ticks, final_status, failure_reason) = match verdict {
            Ok(v) => (v.ticks, v.status, v.failure),
            Err(e) => (0, GameStatus::InProgress, Some(e.to_string())),
        };
        if let Some(reason) = &failure_reason {
            warn!("{} (seed={}) failed: {}", scenario.name(), self.seed, reason);
        }

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: failure_reason.is_none(),
            ticks,
            final_status,
            failure_reason,
        }
    }

    /// Builds the game and the oracle for one run.
    fn setup(
        &self,
        strategy: Strategy,
        recorder: &mut Recorder,
    ) -> Result<(SimContext, Game, Oracle), SimError> {
        let ctx = SimContext::new(self.seed);
        let game = Game::new(self.rows.clone(), ctx.derive_seed(GAME_STREAM))?;
        let oracle = Oracle::new(&game, strategy, ctx.derive_seed(ORACLE_STREAM))
            .map_err(SimError::Invariant)?;
        recorder.set_key_row(oracle.key_row());
        debug!(key_row = oracle.key_row(), ?strategy, "oracle ready");
        Ok((ctx, game, oracle))
    }

    /// Lets the oracle act until it waits, then ticks, until the game ends,
    /// the tick budget runs out, or (with `stop_on_stall`) the oracle stalls.
    fn drive(
        &self,
        ctx: &SimContext,
        game: &mut Game,
        oracle: &mut Oracle,
        recorder: &mut Recorder,
        stop_on_stall: bool,
    ) -> Result<Drive, SimError> {
        let mut drive = Drive::default();
        oracle.verify(game).map_err(SimError::Invariant)?;
        recorder.frame(ctx, game, vec![SimEvent::info("start")]);

        loop {
            while let Some(statement) = oracle.decide(game) {
                let outcome = game.apply(statement)?;
                match outcome {
                    ActionOutcome::Rejected(reason) => {
                        return Err(SimError::invariant(format!(
                            "oracle action '{statement}' rejected: {reason:?}"
                        )));
                    }
                    ActionOutcome::Locked { column } => oracle.observe_lock(game, column),
                    ActionOutcome::Won if statement.kind == SelectionKind::Pwner => {
                        oracle.observe_lock(game, statement.index)
                    }
                    ActionOutcome::Won | ActionOutcome::Lost => {}
                }
                if statement.kind == SelectionKind::Matrix {
                    drive.committed_row = Some(statement.index);
                }

                debug!(%statement, ?outcome, "oracle acted");
                let event = SimEvent::info(format!("{statement}: {}", outcome.message()));
                recorder.frame(ctx, game, vec![event]);
                oracle.verify(game).map_err(SimError::Invariant)?;
            }

            if game.status().is_over() || game.tick_count() >= self.max_ticks {
                break;
            }
            if stop_on_stall && oracle.stalled(game) {
                debug!(tick = game.tick_count(), "oracle stalled on the last column");
                drive.stalled = true;
                break;
            }

            let chosen_before = game.pwner().chosen_columns();
            ctx.advance_time(self.tick_interval);
            if let Some(report) = game.tick()? {
                oracle
                    .verify_tick(&chosen_before, &report, game.pwner().len())
                    .map_err(SimError::Invariant)?;
                let event = SimEvent::info(format!(
                    "tick {}: reshuffled {:?}",
                    report.tick, report.reshuffled
                ));
                recorder.frame(ctx, game, vec![event]);
            }
            oracle.verify(game).map_err(SimError::Invariant)?;
        }

        Ok(drive)
    }

    /// SIM-001: PwnerSweep - lock every matching column.
    fn run_pwner_sweep(&self, recorder: &mut Recorder) -> Result<Verdict, SimError> {
        let (ctx, mut game, mut oracle) = self.setup(Strategy::LockStep, recorder)?;
        let drive = self.drive(&ctx, &mut game, &mut oracle, recorder, true)?;

        let failure = match game.status() {
            GameStatus::Won if game.pwner().all_chosen() => None,
            GameStatus::Won => Some("won without every column chosen".to_string()),
            GameStatus::Lost => Some("locking columns lost the game".to_string()),
            GameStatus::InProgress if drive.stalled => None,
            GameStatus::InProgress => {
                Some(format!("no full lock-in within {} ticks", self.max_ticks))
            }
        };
        info!(ticks = game.tick_count(), stalled = drive.stalled, "pwner sweep finished");
        Ok(Verdict::of(&game, failure))
    }

    /// SIM-002: Deduction - narrow down, then commit the last row.
    fn run_deduction(&self, recorder: &mut Recorder) -> Result<Verdict, SimError> {
        let (ctx, mut game, mut oracle) = self.setup(Strategy::Deduce, recorder)?;
        let drive = self.drive(&ctx, &mut game, &mut oracle, recorder, true)?;

        let failure = match game.status() {
            GameStatus::Won => match drive.committed_row {
                Some(row) if row != oracle.key_row() => {
                    Some(format!("won by committing row {row}, which is not the key"))
                }
                _ => None,
            },
            GameStatus::Lost => Some(format!(
                "deduction committed row {:?} and lost",
                drive.committed_row
            )),
            GameStatus::InProgress if drive.stalled => None,
            GameStatus::InProgress => Some(format!("no deduction within {} ticks", self.max_ticks)),
        };
        Ok(Verdict::of(&game, failure))
    }

    /// SIM-003: BlindGuess - the outcome must follow the key.
    fn run_blind_guess(&self, recorder: &mut Recorder) -> Result<Verdict, SimError> {
        let (ctx, mut game, mut oracle) = self.setup(Strategy::BlindGuess, recorder)?;
        let drive = self.drive(&ctx, &mut game, &mut oracle, recorder, false)?;

        let failure = match (drive.committed_row, game.status()) {
            (None, _) => Some("no row was committed".to_string()),
            (Some(row), GameStatus::Won) if row == oracle.key_row() => None,
            (Some(row), GameStatus::Lost) if row != oracle.key_row() => None,
            (Some(row), status) => Some(format!(
                "committing row {row} (key {}) ended {:?}",
                oracle.key_row(),
                status
            )),
        };
        Ok(Verdict::of(&game, failure))
    }

    /// SIM-004: GarbageInput - bad commands never change state.
    fn run_garbage_input(&self, recorder: &mut Recorder) -> Result<Verdict, SimError> {
        let ctx = SimContext::new(self.seed);
        let mut game = Game::new(self.rows.clone(), ctx.derive_seed(GAME_STREAM))?;
        let mut rng = ChaCha8Rng::seed_from_u64(ctx.derive_seed(INPUT_STREAM));
        if let Some(key_row) = game.key().chosen_index() {
            recorder.set_key_row(key_row);
        }

        let rows = game.matrix().len();
        let columns = game.pwner().len();
        let mut rejected = 0usize;

        for n in 0..GARBAGE_LINES {
            if n % 10 == 9 && game.tick_count() < self.max_ticks {
                ctx.advance_time(self.tick_interval);
                game.tick()?;
            }

            let line = garbage_line(&mut rng, rows, columns);
            let before = game.snapshot();
            let event = match parse(&line) {
                Err(e) => SimEvent::warn(format!("{line:?}: {e}")),
                Ok(statement) => {
                    let len = match statement.kind {
                        SelectionKind::Matrix => rows,
                        SelectionKind::Pwner => columns,
                    };
                    if statement.index < len {
                        // A legal command slipped through; not garbage
                        continue;
                    }
                    match game.apply(statement) {
                        Err(e @ GameError::IndexOutOfRange { .. }) => {
                            SimEvent::warn(format!("{line:?}: {e}"))
                        }
                        Err(e) => return Err(e.into()),
                        Ok(outcome) => {
                            return Ok(Verdict::of(
                                &game,
                                Some(format!("{line:?} was accepted: {outcome:?}")),
                            ));
                        }
                    }
                }
            };
            rejected += 1;

            if game.snapshot() != before {
                return Ok(Verdict::of(&game, Some(format!("{line:?} changed the game"))));
            }
            recorder.frame(&ctx, &game, vec![event]);
        }

        debug!(rejected, "garbage rejected");
        let failure = if rejected == 0 {
            Some("no garbage line was generated".to_string())
        } else if game.status() != GameStatus::InProgress {
            Some(format!("garbage ended the game: {:?}", game.status()))
        } else {
            None
        };
        Ok(Verdict::of(&game, failure))
    }

    /// SIM-005: ChosenDrift - locked columns survive every tick.
    fn run_chosen_drift(&self, recorder: &mut Recorder) -> Result<Verdict, SimError> {
        let (ctx, mut game, oracle) = self.setup(Strategy::LockStep, recorder)?;
        let limit = game.pwner().len().saturating_sub(1).max(1);
        let mut oracle = oracle.with_lock_limit(limit);

        self.drive(&ctx, &mut game, &mut oracle, recorder, false)?;

        let failure = if oracle.locked().is_empty() {
            Some(format!("no column became lockable within {} ticks", self.max_ticks))
        } else if game.status() == GameStatus::Lost {
            Some("locking columns lost the game".to_string())
        } else {
            None
        };
        info!(locked = oracle.locked().len(), ticks = game.tick_count(), "chosen columns held");
        Ok(Verdict::of(&game, failure))
    }

    /// SIM-006: SessionLoop - the event loop over a virtual clock.
    fn run_session_loop(&self, recorder: &mut Recorder) -> Result<Verdict, SimError> {
        let runtime = tokio::runtime::Builder::new_current_thread().build()?;
        runtime.block_on(self.session_loop(recorder))
    }

    async fn session_loop(&self, recorder: &mut Recorder) -> Result<Verdict, SimError> {
        let ctx = SimContext::shared(self.seed);
        let source = Arc::new(ScriptedSource::timed((*ctx).clone()));
        let config = GameConfig {
            rows: self.rows.clone(),
            ..GameConfig::default()
        }
        .with_tick_interval(self.tick_interval);

        let mut session = GameSession::new(Arc::clone(&ctx), Arc::clone(&source), &config)?;
        let key_row = session
            .game()
            .key()
            .chosen_index()
            .ok_or(GameError::KeyNotRandomized)?;
        recorder.set_key_row(key_row);

        let interval = self.tick_interval;
        source.push_at(Duration::ZERO, "hack the planet");
        source.push_at(interval * 3, format!("d {}", self.rows.len() + 7));
        source.push_at(interval * SESSION_WIN_TICK, format!("d {key_row}"));

        let mut frontend = SimFrontend {
            ctx: (*ctx).clone(),
            recorder,
            messages: Vec::new(),
        };
        let status = session.run(&mut frontend).await?;
        let game = session.game();

        let failure = if status != GameStatus::Won {
            Some(format!("session ended {status:?}"))
        } else if game.tick_count() != u64::from(SESSION_WIN_TICK) {
            Some(format!(
                "expected {} ticks before the win, saw {}",
                SESSION_WIN_TICK,
                game.tick_count()
            ))
        } else if frontend.messages.len() != 3 {
            Some(format!("expected 3 messages, saw {:?}", frontend.messages))
        } else if source.remaining() != 0 {
            Some("script was not fully consumed".to_string())
        } else {
            None
        };
        Ok(Verdict::of(game, failure))
    }
}

/// A line that is never a legal, in-range command.
fn garbage_line(rng: &mut ChaCha8Rng, rows: usize, columns: usize) -> String {
    match rng.gen_range(0..4) {
        0 => {
            let len = rng.gen_range(0..8);
            (0..len)
                .map(|_| GARBAGE_ALPHABET[rng.gen_range(0..GARBAGE_ALPHABET.len())] as char)
                .collect()
        }
        1 => {
            let (selector, bound) = if rng.gen_bool(0.5) { ('p', columns) } else { ('d', rows) };
            format!("{selector} {}", bound + rng.gen_range(0..1000))
        }
        2 => format!("p {} {}", rng.gen_range(0..columns), rng.gen_range(0..10)),
        _ => format!("d {}", "9".repeat(rng.gen_range(20..30))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_all_scenarios_pass_on_several_seeds() {
        for seed in [1, 42, 1234, 987_654_321] {
            let runner = ScenarioRunner::new(seed);
            for scenario in ScenarioId::all() {
                let result = runner.run(scenario);
                assert!(
                    result.passed,
                    "{} seed={} failed: {:?}",
                    scenario,
                    seed,
                    result.failure_reason
                );
            }
        }
    }

    #[test]
    fn test_runs_are_deterministic() {
        for scenario in ScenarioId::all() {
            let a = ScenarioRunner::new(7).run(scenario);
            let b = ScenarioRunner::new(7).run(scenario);
            assert_eq!(a.ticks, b.ticks, "{scenario}");
            assert_eq!(a.final_status, b.final_status, "{scenario}");
        }
    }

    #[test]
    fn test_session_loop_wins_on_schedule() {
        let result = ScenarioRunner::new(3).run(ScenarioId::SessionLoop);
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.final_status, GameStatus::Won);
        assert_eq!(result.ticks, u64::from(SESSION_WIN_TICK));
    }

    #[test]
    fn test_export_records_frames_and_key() {
        let (result, export) = ScenarioRunner::new(5).run_with_export(ScenarioId::PwnerSweep);
        assert_eq!(export.passed, result.passed);
        assert!(export.key_row.is_some());
        assert!(!export.frames.is_empty());
        assert_eq!(export.frames[0].events[0].message, "start");
        assert_eq!(export.final_status, Some(result.final_status));
    }

    #[test]
    fn test_invalid_matrix_fails_cleanly() {
        let result = ScenarioRunner::new(1)
            .with_rows(vec![vec![1, 2], vec![3]])
            .run(ScenarioId::PwnerSweep);
        assert!(!result.passed);
        assert!(result.failure_reason.unwrap().contains("row 1"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_oracle_scenarios_hold_for_any_seed(seed in any::<u64>()) {
            let runner = ScenarioRunner::new(seed);
            let scenarios = [ScenarioId::Deduction, ScenarioId::BlindGuess, ScenarioId::ChosenDrift];
            for scenario in scenarios {
                let result = runner.run(scenario);
                prop_assert!(
                    result.passed,
                    "{} seed={} failed: {:?}",
                    scenario,
                    seed,
                    result.failure_reason
                );
            }
        }
    }
}
