//! Tooling around the stepctl configuration layer.
//!
//! This crate provides:
//! - Snapshot fixtures: statistics snapshots as versioned JSON
//! - Structured logging: core diagnostics as JSONL records
//! - Simulation: a stand-in integrator core that drives a handle end to end

#![forbid(unsafe_code)]

pub mod error;
pub mod fixtures;
pub mod simulate;
pub mod structured_log;

pub use error::{HarnessError, HarnessResult};
pub use fixtures::SnapshotFixture;
pub use simulate::{SimulationConfig, SimulationOutcome};
pub use structured_log::{LogEmitter, LogEntry, LogLevel};
