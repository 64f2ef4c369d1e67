//! PortDive Deterministic Simulation Harness
//!
//! This crate plays the PortDive engine in a controlled environment where
//! every run is reproducible from a single 64-bit seed.
//!
//! # Core Principle
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Time**: Virtual clock advances only when the session sleeps or a
//!   scenario ticks
//! - **Input**: Scripted lines released at fixed virtual times
//! - **Randomness**: Game, oracle and input streams derived from one seed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ScenarioRunner                         │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │ SimContext (Virtual Clock + Seed Streams)            │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │       │                        │                            │
//! │  ┌────▼────┐              ┌────▼──────────┐                 │
//! │  │  Game   │◄─ actions ───│ Oracle        │                 │
//! │  │         │── state ────►│ (knows key)   │                 │
//! │  └─────────┘              └───────────────┘                 │
//! │       │                                                     │
//! │  ┌────▼──────────────────────────┐                          │
//! │  │ SimExport (per-frame JSON)    │                          │
//! │  └───────────────────────────────┘                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use portdive_sim::{ScenarioRunner, ScenarioId};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::Deduction);
//! assert!(result.passed, "{:?}", result.failure_reason);
//! ```

mod context;
mod error;
mod exporter;
mod oracle;
mod runner;
mod source;
pub mod scenarios;

pub use context::SimContext;
pub use error::SimError;
pub use exporter::{SimEvent, SimExport, SimFrame};
pub use oracle::{Oracle, Strategy};
pub use runner::{ScenarioResult, ScenarioRunner, INPUT_STREAM, ORACLE_STREAM};
pub use scenarios::ScenarioId;
pub use source::{ScriptedLine, ScriptedSource};
