//! Handle lifetime and opaque user context.
//!
//! `stepctl_create` stands in for the integrator's allocation step so C
//! callers can obtain a handle; `stepctl_free` releases it together with
//! every resource the configuration layer owns.

use std::ffi::{c_int, c_void};
use std::ptr;

use stepctl_core::diag;
use stepctl_core::{IntegratorHandle, IntegratorSetup, LinearMultistep, SerialVector, StepError};

use crate::macros::abi_fn;
use crate::util::{SUCCESS, StepctlMem, null_handle, with_handle};

/// Adams-Moulton selector for `stepctl_create`.
pub const STEPCTL_ADAMS: c_int = 1;
/// BDF selector for `stepctl_create`.
pub const STEPCTL_BDF: c_int = 2;

/// Raw user context stored on the handle.
#[derive(Debug, Clone, Copy)]
pub(crate) struct UserPtr(pub(crate) *mut c_void);

abi_fn! {
    /// Allocate a handle for `n` state components and `nrtfn` root functions.
    ///
    /// Returns null on an unknown method or negative root count.
    fn stepctl_create(lmm: c_int, n: usize, nrtfn: c_int) -> *mut StepctlMem {
        const OP: &str = "stepctl_create";
        let method = match lmm {
            STEPCTL_ADAMS => LinearMultistep::Adams,
            STEPCTL_BDF => LinearMultistep::Bdf,
            other => {
                report(OP, format!("illegal value {other} for lmm"));
                return ptr::null_mut();
            }
        };
        let Ok(nrtfn) = usize::try_from(nrtfn) else {
            report(OP, "nrtfn < 0 illegal".to_owned());
            return ptr::null_mut();
        };
        let setup = IntegratorSetup::new(method, SerialVector::zeros(n)).with_root_fns(nrtfn);
        Box::into_raw(Box::new(IntegratorHandle::new(setup)))
    }
}

fn report(op: &'static str, reason: String) {
    diag::report_error(op, &StepError::IllegalConfiguration { op, reason });
}

abi_fn! {
    /// Release the handle behind `*mem` and null the caller's pointer.
    fn stepctl_free(mem: *mut *mut StepctlMem) {
        if mem.is_null() || (*mem).is_null() {
            return;
        }
        drop(Box::from_raw(*mem));
        *mem = ptr::null_mut();
    }
}

abi_fn! {
    fn stepctl_set_user_data(mem: *mut StepctlMem, user_data: *mut c_void) -> c_int {
        with_handle("set_user_data", mem, |h| {
            h.set_user_data(UserPtr(user_data));
            Ok(())
        })
    }
}

abi_fn! {
    /// Write the stored user context (null when unset) into `user_data`.
    fn stepctl_get_user_data(mem: *const StepctlMem, user_data: *mut *mut c_void) -> c_int {
        let Some(h) = mem.as_ref() else {
            return null_handle("get_user_data");
        };
        if !user_data.is_null() {
            *user_data = h.user_data::<UserPtr>().map_or(ptr::null_mut(), |p| p.0);
        }
        SUCCESS
    }
}
