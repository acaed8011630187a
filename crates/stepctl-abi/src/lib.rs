//! # stepctl-abi
//!
//! `extern "C"` boundary for the stepctl configuration and statistics layer.
//!
//! ```text
//! C caller -> ABI entry (this crate) -> null/pointer checks -> stepctl-core -> status
//! ```
//!
//! Every entry point that takes a handle checks it for null before any other
//! validation and returns a `ReturnFlag` code. Failures are also published to
//! the process-wide diagnostic hook in `stepctl-core`.

#![allow(clippy::missing_safety_doc)]

mod macros;
mod util;

pub mod config_abi;
pub mod flags_abi;
pub mod handle_abi;
pub mod report_abi;
pub mod stats_abi;

pub use config_abi::StepctlMonitorFn;
pub use handle_abi::{STEPCTL_ADAMS, STEPCTL_BDF};
pub use stats_abi::{StepctlIntegratorStats, StepctlLinearSolverStats, StepctlProjectionStats};
pub use util::StepctlMem;
