//! Configuration and runtime-introspection layer for an adaptive-step,
//! adaptive-order ODE integrator.
//!
//! The integrator core itself lives elsewhere. This crate owns what sits
//! between it and the caller:
//!
//! - **Vector contract** (`nvector`): operations and capability sets required
//!   of the state vector type
//! - **Configuration store** (`config`, `handle`): every tunable, mutated only
//!   through validated setters on [`IntegratorHandle`]
//! - **Validation engine** (`policy`): tolerant defaulting and strict
//!   cross-field rejection rules
//! - **Statistics** (`stats`): read-only view of integrator counters
//! - **Report formatter** (`report`): table and CSV renderings
//! - **Return flags** (`flags`): stable status codes and their names
//! - **Diagnostics** (`diag`): process-wide hook receiving every failure

#![deny(unsafe_code)]

pub mod caps;
pub mod config;
pub mod diag;
pub mod error;
pub mod flags;
pub mod handle;
pub mod nvector;
pub mod policy;
pub mod report;
pub mod stats;

pub use caps::BuildCapabilities;
pub use config::{ConfigurationRecord, LinearMultistep, MonitorFn, StepChangeFactors};
pub use diag::{Diagnostic, DiagnosticHook, Severity};
pub use error::{Capability, StepError, StepResult, Subsystem};
pub use flags::{ReturnFlag, return_flag_name};
pub use handle::{IntegratorHandle, IntegratorSetup, IntegratorState, NonlinearSolverContext};
pub use nvector::{NVector, SerialVector, VectorBackend, VectorOps};
pub use report::{OutputFormat, Record, RecordValue};
pub use stats::{IntegratorStats, LinearSolverStats, ProjectionStats, StatisticsSnapshot};
