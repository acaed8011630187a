//! Error taxonomy shared by every configuration and statistics operation.

use thiserror::Error;

use crate::flags::ReturnFlag;

/// Optional collaborators an operation may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    NonlinearSolver,
    LinearSolver,
    Projection,
}

impl Subsystem {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NonlinearSolver => "nonlinear solver",
            Self::LinearSolver => "linear solver",
            Self::Projection => "projection",
        }
    }
}

/// Features that may be compiled out of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Monitoring,
    FusedKernels,
}

impl Capability {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monitoring => "monitoring",
            Self::FusedKernels => "fused integrator kernels",
        }
    }
}

/// Failure reported by a setter, accessor, or the report formatter.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("integrator handle is null")]
    NullHandle,
    #[error("{op}: {reason}")]
    IllegalConfiguration { op: &'static str, reason: String },
    #[error("{op}: {} is not attached", .subsystem.as_str())]
    MissingSubsystem {
        op: &'static str,
        subsystem: Subsystem,
    },
    #[error("{op}: this build does not include {} support", .capability.as_str())]
    CapabilityNotBuilt {
        op: &'static str,
        capability: Capability,
    },
    #[error("{op}: allocation failed")]
    AllocationFailure { op: &'static str },
    #[error("report sink: {0}")]
    Sink(#[from] std::io::Error),
}

impl StepError {
    pub(crate) fn illegal(op: &'static str, reason: impl Into<String>) -> Self {
        Self::IllegalConfiguration {
            op,
            reason: reason.into(),
        }
    }

    /// Status code carried across the C boundary for this error.
    #[must_use]
    pub fn flag(&self) -> ReturnFlag {
        match self {
            Self::NullHandle => ReturnFlag::MemNull,
            Self::IllegalConfiguration { .. } | Self::CapabilityNotBuilt { .. } => {
                ReturnFlag::IllInput
            }
            Self::MissingSubsystem {
                subsystem: Subsystem::Projection,
                ..
            } => ReturnFlag::ProjMemNull,
            Self::MissingSubsystem { .. } | Self::AllocationFailure { .. } => ReturnFlag::MemFail,
            Self::Sink(_) => ReturnFlag::UnrecognizedErr,
        }
    }

    /// Name of the operation that failed, when known.
    #[must_use]
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::IllegalConfiguration { op, .. }
            | Self::MissingSubsystem { op, .. }
            | Self::CapabilityNotBuilt { op, .. }
            | Self::AllocationFailure { op } => Some(*op),
            Self::NullHandle | Self::Sink(_) => None,
        }
    }
}

/// Result alias for this crate.
pub type StepResult<T> = Result<T, StepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(StepError::NullHandle.flag(), ReturnFlag::MemNull);
        assert_eq!(
            StepError::illegal("set_max_ord", "too big").flag(),
            ReturnFlag::IllInput
        );
        assert_eq!(
            StepError::CapabilityNotBuilt {
                op: "set_monitor_fn",
                capability: Capability::Monitoring,
            }
            .flag(),
            ReturnFlag::IllInput
        );
        assert_eq!(
            StepError::MissingSubsystem {
                op: "set_max_nonlin_iters",
                subsystem: Subsystem::NonlinearSolver,
            }
            .flag(),
            ReturnFlag::MemFail
        );
        assert_eq!(
            StepError::MissingSubsystem {
                op: "projection_stats",
                subsystem: Subsystem::Projection,
            }
            .flag(),
            ReturnFlag::ProjMemNull
        );
    }

    #[test]
    fn display_names_operation() {
        let err = StepError::illegal("set_min_step", "hmin < 0 illegal");
        assert_eq!(err.to_string(), "set_min_step: hmin < 0 illegal");
        assert_eq!(err.operation(), Some("set_min_step"));

        let err = StepError::CapabilityNotBuilt {
            op: "set_monitor_frequency",
            capability: Capability::Monitoring,
        };
        assert!(err.to_string().contains("monitoring"));
    }
}
