//! ABI entry points for the configuration store.
//!
//! Every setter checks the handle for null before anything else and returns
//! a `ReturnFlag` status. Boolean inputs treat any non-zero value as true.

use std::ffi::{c_int, c_long, c_void};
use std::slice;

use stepctl_core::{SerialVector, StatisticsSnapshot};

use crate::macros::handle_fn;
use crate::stats_abi::StepctlIntegratorStats;
use crate::util::{diag_err, flag};

/// Monitor callback: receives the current counters and the context pointer
/// given at registration.
pub type StepctlMonitorFn =
    Option<unsafe extern "C" fn(stats: *const StepctlIntegratorStats, ctx: *mut c_void) -> c_int>;

// ---------------------------------------------------------------------------
// Order and step bounds
// ---------------------------------------------------------------------------

handle_fn! {
    fn stepctl_set_max_ord(maxord: c_int) => "set_max_ord", |h| h.set_max_ord(i64::from(maxord))
}

handle_fn! {
    tolerant fn stepctl_set_max_num_steps(mxsteps: c_long) => "set_max_num_steps",
        |h| h.set_max_num_steps(i64::from(mxsteps))
}

handle_fn! {
    tolerant fn stepctl_set_max_hnil_warns(mxhnil: c_int) => "set_max_hnil_warns",
        |h| h.set_max_hnil_warns(mxhnil)
}

handle_fn! {
    fn stepctl_set_stab_lim_det(sldet: c_int) => "set_stab_lim_det", |h| h.set_stab_lim_det(flag(sldet))
}

handle_fn! {
    tolerant fn stepctl_set_init_step(hin: f64) => "set_init_step", |h| h.set_init_step(hin)
}

handle_fn! {
    fn stepctl_set_min_step(hmin: f64) => "set_min_step", |h| h.set_min_step(hmin)
}

handle_fn! {
    fn stepctl_set_max_step(hmax: f64) => "set_max_step", |h| h.set_max_step(hmax)
}

// ---------------------------------------------------------------------------
// Step-change factors
// ---------------------------------------------------------------------------

handle_fn! {
    tolerant fn stepctl_set_eta_fixed_step_bounds(eta_min_fx: f64, eta_max_fx: f64)
        => "set_eta_fixed_step_bounds", |h| h.set_eta_fixed_step_bounds(eta_min_fx, eta_max_fx)
}

handle_fn! {
    tolerant fn stepctl_set_eta_max_first_step(eta_max_fs: f64) => "set_eta_max_first_step",
        |h| h.set_eta_max_first_step(eta_max_fs)
}

handle_fn! {
    tolerant fn stepctl_set_eta_max_early_step(eta_max_es: f64) => "set_eta_max_early_step",
        |h| h.set_eta_max_early_step(eta_max_es)
}

handle_fn! {
    tolerant fn stepctl_set_num_steps_eta_max_early_step(small_nst: c_long)
        => "set_num_steps_eta_max_early_step",
        |h| h.set_num_steps_eta_max_early_step(i64::from(small_nst))
}

handle_fn! {
    tolerant fn stepctl_set_eta_max(eta_max_gs: f64) => "set_eta_max", |h| h.set_eta_max(eta_max_gs)
}

handle_fn! {
    tolerant fn stepctl_set_eta_min(eta_min: f64) => "set_eta_min", |h| h.set_eta_min(eta_min)
}

handle_fn! {
    tolerant fn stepctl_set_eta_min_err_fail(eta_min_ef: f64) => "set_eta_min_err_fail",
        |h| h.set_eta_min_err_fail(eta_min_ef)
}

handle_fn! {
    tolerant fn stepctl_set_eta_max_err_fail(eta_max_ef: f64) => "set_eta_max_err_fail",
        |h| h.set_eta_max_err_fail(eta_max_ef)
}

handle_fn! {
    tolerant fn stepctl_set_num_fails_eta_max_err_fail(small_nef: c_int)
        => "set_num_fails_eta_max_err_fail", |h| h.set_num_fails_eta_max_err_fail(small_nef)
}

handle_fn! {
    tolerant fn stepctl_set_eta_conv_fail(eta_cf: f64) => "set_eta_conv_fail", |h| h.set_eta_conv_fail(eta_cf)
}

// ---------------------------------------------------------------------------
// Failure thresholds and solver coupling
// ---------------------------------------------------------------------------

handle_fn! {
    fn stepctl_set_max_err_test_fails(maxnef: c_int) => "set_max_err_test_fails",
        |h| match u32::try_from(maxnef) {
            Ok(n) => {
                h.set_max_err_test_fails(n);
                Ok(())
            }
            Err(_) => diag_err("set_max_err_test_fails", "maxnef < 0 illegal"),
        }
}

handle_fn! {
    fn stepctl_set_max_conv_fails(maxncf: c_int) => "set_max_conv_fails",
        |h| match u32::try_from(maxncf) {
            Ok(n) => {
                h.set_max_conv_fails(n);
                Ok(())
            }
            Err(_) => diag_err("set_max_conv_fails", "maxncf < 0 illegal"),
        }
}

handle_fn! {
    fn stepctl_set_max_nonlin_iters(maxcor: c_int) => "set_max_nonlin_iters",
        |h| h.set_max_nonlin_iters(maxcor)
}

handle_fn! {
    tolerant fn stepctl_set_nonlin_conv_coef(nlscoef: f64) => "set_nonlin_conv_coef",
        |h| h.set_nonlin_conv_coef(nlscoef)
}

handle_fn! {
    fn stepctl_set_lsetup_frequency(msbp: c_long) => "set_lsetup_frequency",
        |h| h.set_lsetup_frequency(i64::from(msbp))
}

handle_fn! {
    tolerant fn stepctl_set_delta_gamma_max_lsetup(dgmax_lsetup: f64) => "set_delta_gamma_max_lsetup",
        |h| h.set_delta_gamma_max_lsetup(dgmax_lsetup)
}

// ---------------------------------------------------------------------------
// Stop time and root finding
// ---------------------------------------------------------------------------

handle_fn! {
    fn stepctl_set_stop_time(tstop: f64) => "set_stop_time", |h| h.set_stop_time(tstop)
}

handle_fn! {
    tolerant fn stepctl_set_interpolate_stop_time(interp: c_int) => "set_interpolate_stop_time",
        |h| h.set_interpolate_stop_time(flag(interp))
}

handle_fn! {
    tolerant fn stepctl_clear_stop_time() => "clear_stop_time", |h| h.clear_stop_time()
}

handle_fn! {
    /// `rootdir` must hold one entry per registered root function.
    fn stepctl_set_root_direction(rootdir: *const c_int) => "set_root_direction", |h| {
        let n = h.num_root_fns();
        if n > 0 && rootdir.is_null() {
            return diag_err("set_root_direction", "rootdir is null");
        }
        let dirs = if n == 0 { &[][..] } else { slice::from_raw_parts(rootdir, n) };
        h.set_root_direction(dirs)
    }
}

handle_fn! {
    tolerant fn stepctl_set_no_inactive_root_warn() => "set_no_inactive_root_warn",
        |h| h.set_no_inactive_root_warn()
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

handle_fn! {
    /// Install `len` constraint values, or release the constraints when
    /// `constraints` is null or `len` is zero.
    fn stepctl_set_constraints(constraints: *const f64, len: usize) => "set_constraints", |h| {
        if constraints.is_null() || len == 0 {
            return h.set_constraints(None);
        }
        let c = SerialVector::from_slice(slice::from_raw_parts(constraints, len));
        h.set_constraints(Some(&c))
    }
}

// ---------------------------------------------------------------------------
// Build-gated features
// ---------------------------------------------------------------------------

handle_fn! {
    fn stepctl_set_use_fused_kernels(onoff: c_int) => "set_use_fused_kernels",
        |h| h.set_use_fused_kernels(flag(onoff))
}

handle_fn! {
    /// Register `monitor` (or clear it with null), passing `ctx` on every call.
    fn stepctl_set_monitor_fn(monitor: StepctlMonitorFn, ctx: *mut c_void) => "set_monitor_fn", |h| {
        let hook = monitor.map(|f| {
            Box::new(move |snap: &StatisticsSnapshot| {
                let stats = StepctlIntegratorStats::from(snap);
                // SAFETY: the caller registered `f` and `ctx` together.
                unsafe { f(&stats, ctx) };
            }) as stepctl_core::MonitorFn
        });
        h.set_monitor_fn(hook)
    }
}

handle_fn! {
    fn stepctl_set_monitor_frequency(nst: c_long) => "set_monitor_frequency",
        |h| h.set_monitor_frequency(i64::from(nst))
}
