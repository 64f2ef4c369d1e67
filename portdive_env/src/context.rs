//! Core environment context trait for PortDive sessions.

use async_trait::async_trait;
use std::time::Duration;

/// Golden ratio prime used to spread seeds across independent streams.
const STREAM_PRIME: u64 = 0x9e37_79b9_7f4a_7c15;

/// Second mixing prime.
const SALT_PRIME: u64 = 0x517c_c1b7_2722_0a95;

/// Derives the seed of an independent randomness stream from a master seed.
///
/// Identical `(master, stream)` pairs always produce the same value, and
/// different streams never share a prefix of their sequence in practice.
pub fn mix_seed(master: u64, stream: u64) -> u64 {
    master
        .wrapping_mul(STREAM_PRIME)
        .wrapping_add(stream.wrapping_mul(SALT_PRIME))
        ^ stream
}

/// The central interface for Environment Interaction.
///
/// This trait abstracts the "real world" so that the game session can run
/// both in a terminal (tokio) and inside the simulation harness.
///
/// # Implementations
///
/// - **Terminal**: `TokioContext` - wraps `tokio::time`, seeded from OS entropy
///   unless a seed is supplied
/// - **Simulation**: `SimContext` - virtual clock, fixed seed
///
/// # Determinism
///
/// For simulation, all methods that would normally introduce non-determinism
/// (time, randomness) are controlled by the implementation.
#[async_trait]
pub trait GameContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances virtual clock
    async fn sleep(&self, duration: Duration);

    /// Returns the master seed of this context.
    fn seed(&self) -> u64;

    /// Derives the seed for one randomness stream of this context.
    ///
    /// # Arguments
    /// * `stream` - A stream identifier combined with the master seed
    fn derive_seed(&self, stream: u64) -> u64 {
        mix_seed(self.seed(), stream)
    }
}
