//! Process-wide diagnostic reporting.
//!
//! Every failed operation returns a [`StepError`] to its caller and also
//! publishes a [`Diagnostic`] here. With no hook installed the message goes
//! to stderr. A hook must not install or clear hooks itself.

use parking_lot::RwLock;

use crate::error::StepError;
use crate::flags::ReturnFlag;

/// Severity attached to a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Structured message delivered to the diagnostic hook.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub flag: ReturnFlag,
    pub operation: &'static str,
    pub message: String,
}

impl Diagnostic {
    /// Build the diagnostic that accompanies a failed `operation`.
    #[must_use]
    pub fn from_error(operation: &'static str, err: &StepError) -> Self {
        Self {
            severity: Severity::Error,
            flag: err.flag(),
            operation,
            message: err.to_string(),
        }
    }
}

/// Receiver for diagnostics.
pub type DiagnosticHook = Box<dyn Fn(&Diagnostic) + Send + Sync>;

static HOOK: RwLock<Option<DiagnosticHook>> = parking_lot::const_rwlock(None);

/// Install `hook`, returning the previously installed one.
pub fn set_diagnostic_hook(hook: DiagnosticHook) -> Option<DiagnosticHook> {
    HOOK.write().replace(hook)
}

/// Remove the installed hook so diagnostics fall back to stderr.
pub fn clear_diagnostic_hook() -> Option<DiagnosticHook> {
    HOOK.write().take()
}

/// Deliver a diagnostic to the hook, or stderr when none is installed.
pub fn emit(diagnostic: &Diagnostic) {
    let guard = HOOK.read();
    match guard.as_ref() {
        Some(hook) => hook(diagnostic),
        None => eprintln!(
            "[stepctl] {} {}: {}",
            diagnostic.severity.as_str(),
            diagnostic.operation,
            diagnostic.message
        ),
    }
}

/// Publish `err` on behalf of `operation`.
pub fn report_error(operation: &'static str, err: &StepError) {
    emit(&Diagnostic::from_error(operation, err));
}

/// Pass `result` through, publishing a diagnostic when it is an error.
pub(crate) fn check<T>(operation: &'static str, result: Result<T, StepError>) -> Result<T, StepError> {
    result.inspect_err(|err| report_error(operation, err))
}
