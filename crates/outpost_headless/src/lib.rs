//! Headless scenario runner for CI verification and interactive probing.
//!
//! This crate runs block simulations without graphics. This enables:
//!
//! - **Scenario runs**: Load a RON scenario, run it, print JSON metrics
//! - **CI verification**: Check that repeated runs end in the same state
//! - **Interactive sessions**: Drive a simulation with JSON lines on stdin
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (tick, spawn, set power, etc.)
//! - **stdout**: State updates and responses (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See the [`protocol`] module for the command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run a scenario
//! cargo run -p outpost_headless -- run --scenario scenarios/outpost_defense.ron
//!
//! # Verify determinism
//! cargo run -p outpost_headless -- verify --scenario scenarios/outpost_defense.ron --runs 5
//!
//! # Drive interactively
//! echo '{"cmd":"tick","count":60}' | cargo run -p outpost_headless -- serve
//! ```

pub mod metrics;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use metrics::{MetricsCollector, RunMetrics};
pub use protocol::{Command, Response};
pub use runner::{verify_determinism, DeterminismReport, ScenarioRunner};
pub use scenario::{Scenario, ScenarioError};
