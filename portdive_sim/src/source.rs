//! Scripted command source for driving sessions without a terminal.

use crate::context::SimContext;
use async_trait::async_trait;
use portdive_env::{CommandSource, GameContext};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A line released once the virtual clock reaches `at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedLine {
    pub at: Duration,
    pub line: String,
}

/// Command source backed by a queue of pre-written lines.
///
/// Without a clock every line is available immediately. With a clock a line
/// stays pending until virtual time reaches its release time, which lets the
/// session's tick deadline win the race in the meantime.
pub struct ScriptedSource {
    /// Pending lines, in release order
    lines: Mutex<VecDeque<ScriptedLine>>,

    /// Virtual clock gating release times
    clock: Option<SimContext>,

    finished: AtomicBool,
}

impl ScriptedSource {
    /// Creates a source whose lines are all available at once.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Mutex::new(
                lines
                    .into_iter()
                    .map(|line| ScriptedLine {
                        at: Duration::ZERO,
                        line: line.into(),
                    })
                    .collect(),
            ),
            clock: None,
            finished: AtomicBool::new(false),
        }
    }

    /// Creates an empty source gated by the given clock.
    pub fn timed(clock: SimContext) -> Self {
        Self {
            lines: Mutex::new(VecDeque::new()),
            clock: Some(clock),
            finished: AtomicBool::new(false),
        }
    }

    /// Queues `line` for release at virtual time `at`.
    ///
    /// Release times must not decrease; a line queued earlier than its
    /// predecessor is held back until the predecessor is released.
    pub fn push_at(&self, at: Duration, line: impl Into<String>) {
        self.queue().push_back(ScriptedLine {
            at,
            line: line.into(),
        });
    }

    /// Number of lines not yet delivered.
    pub fn remaining(&self) -> usize {
        self.queue().len()
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, VecDeque<ScriptedLine>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pop_due(&self) -> Head {
        let now = self.clock.as_ref().map(|c| c.now());
        let mut queue = self.queue();
        match queue.front() {
            None => Head::Exhausted,
            Some(head) if now.map_or(true, |now| head.at <= now) => queue
                .pop_front()
                .map_or(Head::Exhausted, |l| Head::Due(l.line)),
            Some(_) => Head::Waiting,
        }
    }
}

enum Head {
    Due(String),
    Waiting,
    Exhausted,
}

#[async_trait]
impl CommandSource for ScriptedSource {
    async fn next_line(&self) -> Option<String> {
        if self.is_finished() {
            return None;
        }
        match self.pop_due() {
            Head::Due(line) => Some(line),
            Head::Exhausted => None,
            // Only the clock moving can release it
            Head::Waiting => std::future::pending().await,
        }
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}
