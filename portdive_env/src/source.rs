//! Command source abstraction for player input.

use async_trait::async_trait;

/// Abstraction for the line-oriented player input stream.
///
/// # Implementations
///
/// - **Terminal**: `StdinSource` - a dedicated reader thread over stdin
/// - **Simulation**: `ScriptedSource` - a queue of pre-written lines
///
/// # Line Flow
///
/// ```text
/// Reader                     Source                     Session
///   |                           |                          |
///   |-- "p 3" ----------------->|                          |
///   |                           |-- next_line() ---------->|-- parse, apply
///   |                           |<------------- finish() --|   (game over)
///   |<-- stop ------------------|                          |
/// ```
#[async_trait]
pub trait CommandSource: Send + Sync + 'static {
    /// Receives the next raw command line.
    ///
    /// # Returns
    /// * `Some(line)` - A line was read (without its trailing newline)
    /// * `None` - The source reached EOF or was finished
    ///
    /// # Blocking
    /// This method waits until a line arrives, the source closes, or
    /// `finish()` is called.
    async fn next_line(&self) -> Option<String>;

    /// One-shot signal that the session has ended.
    ///
    /// Any pending or future `next_line()` returns `None` and the background
    /// reader (if any) stops. Calling it twice is harmless.
    fn finish(&self);

    /// Returns true once `finish()` has been called.
    fn is_finished(&self) -> bool;
}
