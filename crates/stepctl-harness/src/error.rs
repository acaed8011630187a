//! Harness error type.

use stepctl_core::StepError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Step(#[from] StepError),
    #[error("unsupported fixture version {found:?} (expected {expected:?})")]
    FixtureVersion { found: String, expected: &'static str },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
