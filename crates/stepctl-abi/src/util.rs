//! Shared internal utilities for ABI adapters.

use std::ffi::{c_int, c_long};

use stepctl_core::diag;
use stepctl_core::{IntegratorHandle, ReturnFlag, SerialVector, StepError, StepResult};

/// Handle type behind every `void*`-style integrator pointer.
pub type StepctlMem = IntegratorHandle<SerialVector>;

pub(crate) const SUCCESS: c_int = ReturnFlag::Success as c_int;

/// Status code for `result`.
pub(crate) fn status(result: StepResult<()>) -> c_int {
    match result {
        Ok(()) => SUCCESS,
        Err(err) => err.flag().code(),
    }
}

/// Report a null handle for `op` and return its status.
pub(crate) fn null_handle(op: &'static str) -> c_int {
    let err = StepError::NullHandle;
    diag::report_error(op, &err);
    err.flag().code()
}

/// Run `f` on the handle behind `mem`, checking for null first.
///
/// # Safety
///
/// `mem` must be null or point to a live handle not aliased for the call.
pub(crate) unsafe fn with_handle<F>(op: &'static str, mem: *mut StepctlMem, f: F) -> c_int
where
    F: FnOnce(&mut StepctlMem) -> StepResult<()>,
{
    // SAFETY: caller guarantees validity when non-null.
    match unsafe { mem.as_mut() } {
        Some(h) => status(f(h)),
        None => null_handle(op),
    }
}

/// Copy a value out of the handle into `out`.
///
/// # Safety
///
/// `mem` as for [`with_handle`]; `out` must be null or writable.
pub(crate) unsafe fn read_into<T, F>(
    op: &'static str,
    mem: *const StepctlMem,
    out: *mut T,
    get: F,
) -> c_int
where
    F: FnOnce(&StepctlMem) -> T,
{
    // SAFETY: caller guarantees validity when non-null.
    let Some(h) = (unsafe { mem.as_ref() }) else {
        return null_handle(op);
    };
    if out.is_null() {
        return status(diag_err(op, "output pointer is null"));
    }
    // SAFETY: `out` checked non-null above.
    unsafe { out.write(get(h)) };
    SUCCESS
}

/// Build and publish an `IllegalConfiguration` failure for `op`.
pub(crate) fn diag_err(op: &'static str, reason: &str) -> StepResult<()> {
    let err = StepError::IllegalConfiguration {
        op,
        reason: reason.to_owned(),
    };
    diag::report_error(op, &err);
    Err(err)
}

/// Saturating counter conversion for `long` out-parameters.
pub(crate) fn long(v: u64) -> c_long {
    c_long::try_from(v).unwrap_or(c_long::MAX)
}

/// Order and size conversion for `int` out-parameters.
pub(crate) fn int(v: usize) -> c_int {
    c_int::try_from(v).unwrap_or(c_int::MAX)
}

pub(crate) fn flag(v: c_int) -> bool {
    v != 0
}
