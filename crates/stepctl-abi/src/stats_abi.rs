//! ABI entry points for the statistics aggregator.
//!
//! Scalars are written to caller out-parameters; vector-valued state is
//! copied into caller buffers whose length must match the state length.

use std::ffi::{c_int, c_long};
use std::slice;

use stepctl_core::diag;
use stepctl_core::{
    IntegratorStats, LinearSolverStats, NVector, ProjectionStats, SerialVector, StatisticsSnapshot,
    StepError, Subsystem,
};

use crate::macros::abi_fn;
use crate::util::{SUCCESS, StepctlMem, diag_err, int, long, null_handle, read_into, status};

/// Composite counters, laid out for C callers.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepctlIntegratorStats {
    pub nsteps: c_long,
    pub nfevals: c_long,
    pub nlinsetups: c_long,
    pub netfails: c_long,
    pub qlast: c_int,
    pub qcur: c_int,
    pub hinused: f64,
    pub hlast: f64,
    pub hcur: f64,
    pub tcur: f64,
}

impl From<IntegratorStats> for StepctlIntegratorStats {
    fn from(s: IntegratorStats) -> Self {
        Self {
            nsteps: long(s.nsteps),
            nfevals: long(s.nfevals),
            nlinsetups: long(s.nlinsetups),
            netfails: long(s.netfails),
            qlast: int(s.qlast),
            qcur: int(s.qcur),
            hinused: s.hinused,
            hlast: s.hlast,
            hcur: s.hcur,
            tcur: s.tcur,
        }
    }
}

impl From<&StatisticsSnapshot> for StepctlIntegratorStats {
    fn from(s: &StatisticsSnapshot) -> Self {
        Self {
            nsteps: long(s.nst),
            nfevals: long(s.nfe),
            nlinsetups: long(s.nsetups),
            netfails: long(s.netf),
            qlast: int(s.qu),
            qcur: int(s.qcur),
            hinused: s.h0u,
            hlast: s.hu,
            hcur: s.hcur,
            tcur: s.tcur,
        }
    }
}

/// Linear solver counters, laid out for C callers.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepctlLinearSolverStats {
    pub nje: c_long,
    pub nfe_dq: c_long,
    pub npe: c_long,
    pub nps: c_long,
    pub nli: c_long,
    pub ncfl: c_long,
    pub njtsetup: c_long,
    pub njtimes: c_long,
    pub lrw: c_long,
    pub liw: c_long,
}

impl From<LinearSolverStats> for StepctlLinearSolverStats {
    fn from(s: LinearSolverStats) -> Self {
        Self {
            nje: long(s.nje),
            nfe_dq: long(s.nfe_dq),
            npe: long(s.npe),
            nps: long(s.nps),
            nli: long(s.nli),
            ncfl: long(s.ncfl),
            njtsetup: long(s.njtsetup),
            njtimes: long(s.njtimes),
            lrw: long(s.lrw as u64),
            liw: long(s.liw as u64),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepctlProjectionStats {
    pub nproj: c_long,
    pub npfails: c_long,
}

impl From<ProjectionStats> for StepctlProjectionStats {
    fn from(s: ProjectionStats) -> Self {
        Self {
            nproj: long(s.nproj),
            npfails: long(s.npfails),
        }
    }
}

/// Generate a scalar getter `fn(mem, *mut T) -> c_int`.
macro_rules! getter {
    ($(#[$meta:meta])* $name:ident, $op:literal, $ty:ty, |$h:ident| $get:expr) => {
        abi_fn! {
            $(#[$meta])*
            fn $name(mem: *const StepctlMem, out: *mut $ty) -> c_int {
                read_into($op, mem, out, |$h| $get)
            }
        }
    };
}

getter!(stepctl_get_num_steps, "get_num_steps", c_long, |h| long(h.num_steps()));
getter!(stepctl_get_num_rhs_evals, "get_num_rhs_evals", c_long, |h| long(h.num_rhs_evals()));
getter!(stepctl_get_num_lin_solv_setups, "get_num_lin_solv_setups", c_long, |h| long(
    h.num_lin_solv_setups()
));
getter!(stepctl_get_num_err_test_fails, "get_num_err_test_fails", c_long, |h| long(
    h.num_err_test_fails()
));
getter!(stepctl_get_last_order, "get_last_order", c_int, |h| int(h.last_order()));
getter!(stepctl_get_current_order, "get_current_order", c_int, |h| int(h.current_order()));
getter!(stepctl_get_current_gamma, "get_current_gamma", f64, |h| h.current_gamma());
getter!(
    /// Zero unless stability limit detection is enabled.
    stepctl_get_num_stab_lim_order_reds,
    "get_num_stab_lim_order_reds",
    c_long,
    |h| long(h.num_stab_lim_order_reds())
);
getter!(stepctl_get_actual_init_step, "get_actual_init_step", f64, |h| h.actual_init_step());
getter!(stepctl_get_last_step, "get_last_step", f64, |h| h.last_step());
getter!(stepctl_get_current_step, "get_current_step", f64, |h| h.current_step());
getter!(stepctl_get_current_time, "get_current_time", f64, |h| h.current_time());
getter!(stepctl_get_tol_scale_factor, "get_tol_scale_factor", f64, |h| h.tol_scale_factor());
getter!(stepctl_get_num_g_evals, "get_num_g_evals", c_long, |h| long(h.num_g_evals()));
getter!(stepctl_get_num_nonlin_solv_iters, "get_num_nonlin_solv_iters", c_long, |h| long(
    h.num_nonlin_solv_iters()
));
getter!(
    stepctl_get_num_nonlin_solv_conv_fails,
    "get_num_nonlin_solv_conv_fails",
    c_long,
    |h| long(h.num_nonlin_solv_conv_fails())
);
getter!(stepctl_get_num_step_solve_fails, "get_num_step_solve_fails", c_long, |h| long(
    h.num_step_solve_fails()
));
getter!(
    stepctl_get_integrator_stats,
    "get_integrator_stats",
    StepctlIntegratorStats,
    |h| StepctlIntegratorStats::from(h.integrator_stats())
);

abi_fn! {
    fn stepctl_get_work_space(mem: *const StepctlMem, lenrw: *mut c_long, leniw: *mut c_long) -> c_int {
        let Some(h) = mem.as_ref() else {
            return null_handle("get_work_space");
        };
        let (lrw, liw) = h.work_space();
        if !lenrw.is_null() {
            *lenrw = long(lrw as u64);
        }
        if !leniw.is_null() {
            *leniw = long(liw as u64);
        }
        SUCCESS
    }
}

abi_fn! {
    fn stepctl_get_nonlin_solv_stats(mem: *const StepctlMem, nniters: *mut c_long, nnfails: *mut c_long) -> c_int {
        let Some(h) = mem.as_ref() else {
            return null_handle("get_nonlin_solv_stats");
        };
        let (nni, nnf) = h.nonlin_solv_stats();
        if !nniters.is_null() {
            *nniters = long(nni);
        }
        if !nnfails.is_null() {
            *nnfails = long(nnf);
        }
        SUCCESS
    }
}

abi_fn! {
    /// Copy the root flags into `rootsfound`, which must hold one entry per
    /// registered root function.
    fn stepctl_get_root_info(mem: *const StepctlMem, rootsfound: *mut c_int) -> c_int {
        let Some(h) = mem.as_ref() else {
            return null_handle("get_root_info");
        };
        let info = h.root_info();
        if !info.is_empty() {
            if rootsfound.is_null() {
                return status(diag_err("get_root_info", "rootsfound is null"));
            }
            slice::from_raw_parts_mut(rootsfound, info.len()).copy_from_slice(&info);
        }
        SUCCESS
    }
}

/// Copy the counters of an optional subsystem into `out`.
///
/// A handle without `subsystem` attached reports `MissingSubsystem`.
unsafe fn read_attached<T, F>(
    op: &'static str,
    mem: *const StepctlMem,
    out: *mut T,
    subsystem: Subsystem,
    get: F,
) -> c_int
where
    F: FnOnce(&StepctlMem) -> Option<T>,
{
    // SAFETY: caller guarantees validity when non-null.
    let Some(h) = (unsafe { mem.as_ref() }) else {
        return null_handle(op);
    };
    if out.is_null() {
        return status(diag_err(op, "output pointer is null"));
    }
    match get(h) {
        Some(value) => {
            // SAFETY: `out` checked non-null above.
            unsafe { out.write(value) };
            SUCCESS
        }
        None => {
            let err = StepError::MissingSubsystem { op, subsystem };
            diag::report_error(op, &err);
            err.flag().code()
        }
    }
}

abi_fn! {
    fn stepctl_get_linear_solver_stats(mem: *const StepctlMem, out: *mut StepctlLinearSolverStats) -> c_int {
        read_attached("get_linear_solver_stats", mem, out, Subsystem::LinearSolver, |h| {
            h.linear_solver_stats().map(StepctlLinearSolverStats::from)
        })
    }
}

abi_fn! {
    fn stepctl_get_projection_stats(mem: *const StepctlMem, out: *mut StepctlProjectionStats) -> c_int {
        read_attached("get_projection_stats", mem, out, Subsystem::Projection, |h| {
            h.projection_stats().map(StepctlProjectionStats::from)
        })
    }
}

/// Copy a state-shaped vector out of the handle into a caller buffer.
unsafe fn copy_vector<F>(op: &'static str, mem: *const StepctlMem, dst: *mut f64, len: usize, read: F) -> c_int
where
    F: FnOnce(&StepctlMem, &mut SerialVector),
{
    // SAFETY: caller guarantees validity when non-null.
    let Some(h) = (unsafe { mem.as_ref() }) else {
        return null_handle(op);
    };
    let mut tmp = SerialVector::zeros(0);
    read(h, &mut tmp);
    if dst.is_null() || tmp.len() != len {
        return status(diag_err(op, "destination does not match the state length"));
    }
    // SAFETY: `dst` is non-null and the caller promises `len` writable slots.
    unsafe { slice::from_raw_parts_mut(dst, len) }.copy_from_slice(tmp.as_slice());
    SUCCESS
}

abi_fn! {
    fn stepctl_get_err_weights(mem: *const StepctlMem, eweight: *mut f64, len: usize) -> c_int {
        copy_vector("get_err_weights", mem, eweight, len, |h, v| h.err_weights(v))
    }
}

abi_fn! {
    fn stepctl_get_est_local_errors(mem: *const StepctlMem, ele: *mut f64, len: usize) -> c_int {
        copy_vector("get_est_local_errors", mem, ele, len, |h, v| h.est_local_errors(v))
    }
}

abi_fn! {
    fn stepctl_get_current_state(mem: *const StepctlMem, y: *mut f64, len: usize) -> c_int {
        copy_vector("get_current_state", mem, y, len, |h, v| h.current_state(v))
    }
}
