//! Terminal implementations of GameContext and CommandSource using Tokio.

use crate::{CommandSource, EnvError, GameContext};
use async_trait::async_trait;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Mutex};

/// Terminal context backed by Tokio and the system clock.
///
/// This is the "real" implementation used when a person plays the game.
/// Time comes from the monotonic clock. The seed is either supplied or
/// drawn once from OS entropy, and is always reported so a game can be
/// replayed.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,

    /// Master seed for every randomness stream of the session
    seed: u64,
}

impl TokioContext {
    /// Creates a new TokioContext seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Creates a new TokioContext with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            start: Instant::now(),
            seed,
        }
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared(seed: Option<u64>) -> Arc<Self> {
        Arc::new(seed.map_or_else(Self::new, Self::with_seed))
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GameContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

/// Line source reading the process's stdin.
///
/// Stdin is read on a dedicated thread (tokio's own stdin handle is not meant
/// for interactive use). Lines are forwarded over a channel; `finish()`
/// releases any waiting `next_line()` immediately and tells the reader thread
/// to stop forwarding.
///
/// # Limitations
///
/// The reader thread is detached and cannot be interrupted. If it is blocked
/// in `read_line` when `finish()` is called, it stays alive until stdin
/// delivers another line or reaches EOF, and only then exits. Dropping the
/// source does not join it. Hosts that need a prompt exit should end the
/// process (or shut their runtime down with `shutdown_background`) rather
/// than wait on the thread.
pub struct StdinSource {
    rx: Mutex<mpsc::Receiver<String>>,
    finished: Arc<AtomicBool>,
    finish_tx: watch::Sender<bool>,
}

impl StdinSource {
    /// Spawns the reader thread and returns the source.
    pub fn spawn() -> Result<Self, EnvError> {
        let (tx, rx) = mpsc::channel(16);
        let (finish_tx, _) = watch::channel(false);
        let finished = Arc::new(AtomicBool::new(false));

        let reader_finished = Arc::clone(&finished);
        std::thread::Builder::new()
            .name("portdive-stdin".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    if reader_finished.load(Ordering::Acquire) {
                        break;
                    }
                    match line {
                        Ok(line) => {
                            if tx.blocking_send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!("stdin read failed: {}", e);
                            break;
                        }
                    }
                }
                tracing::debug!("stdin reader stopped");
            })
            .map_err(|e| EnvError::context(format!("failed to spawn stdin reader: {e}")))?;

        Ok(Self {
            rx: Mutex::new(rx),
            finished,
            finish_tx,
        })
    }
}

#[async_trait]
impl CommandSource for StdinSource {
    async fn next_line(&self) -> Option<String> {
        if self.is_finished() {
            return None;
        }
        let mut finish_rx = self.finish_tx.subscribe();
        let mut rx = self.rx.lock().await;
        tokio::select! {
            line = rx.recv() => line,
            _ = finish_rx.wait_for(|done| *done) => None,
        }
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::Release);
        self.finish_tx.send_replace(true);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}
