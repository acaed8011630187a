//! Integration test: C ABI surface.
//!
//! Null handles, status codes, caller-released names, and the `FILE*`
//! report sink.
//!
//! Run: cargo test -p stepctl-abi --test abi_surface_test

use std::ffi::{CStr, c_int, c_long, c_void};
use std::ptr;

use stepctl_abi::config_abi::*;
use stepctl_abi::flags_abi::*;
use stepctl_abi::handle_abi::*;
use stepctl_abi::report_abi::*;
use stepctl_abi::stats_abi::*;
use stepctl_abi::{
    STEPCTL_BDF, StepctlIntegratorStats, StepctlLinearSolverStats, StepctlMem,
    StepctlProjectionStats,
};
use stepctl_core::{
    IntegratorHandle, IntegratorSetup, LinearMultistep, LinearSolverStats, ProjectionStats,
    ReturnFlag, SerialVector,
};

const SUCCESS: c_int = ReturnFlag::Success as c_int;
const MEM_NULL: c_int = ReturnFlag::MemNull as c_int;
const ILL_INPUT: c_int = ReturnFlag::IllInput as c_int;
const MEM_FAIL: c_int = ReturnFlag::MemFail as c_int;
const PROJ_MEM_NULL: c_int = ReturnFlag::ProjMemNull as c_int;

fn create(n: usize, nrtfn: c_int) -> *mut StepctlMem {
    let mem = unsafe { stepctl_create(STEPCTL_BDF, n, nrtfn) };
    assert!(!mem.is_null());
    mem
}

fn free(mut mem: *mut StepctlMem) {
    unsafe { stepctl_free(&mut mem) };
    assert!(mem.is_null());
}

fn flag_name(code: c_long) -> String {
    unsafe {
        let p = stepctl_get_return_flag_name(code);
        assert!(!p.is_null());
        let s = CStr::from_ptr(p).to_string_lossy().into_owned();
        stepctl_free_name(p);
        s
    }
}

/// Read everything written to `f` so far.
unsafe fn slurp(f: *mut libc::FILE) -> String {
    let mut out = Vec::new();
    let mut buf = [0u8; 256];
    unsafe {
        libc::rewind(f);
        loop {
            let n = libc::fread(buf.as_mut_ptr().cast(), 1, buf.len(), f);
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
    }
    String::from_utf8(out).unwrap()
}

#[test]
fn null_handle_is_checked_first() {
    let null = ptr::null_mut::<StepctlMem>();
    unsafe {
        assert_eq!(stepctl_set_max_ord(null, 99), MEM_NULL);
        assert_eq!(stepctl_set_min_step(null, -1.0), MEM_NULL);
        assert_eq!(stepctl_set_eta_max(null, 0.0), MEM_NULL);
        assert_eq!(stepctl_set_constraints(null, ptr::null(), 0), MEM_NULL);
        assert_eq!(stepctl_set_monitor_frequency(null, -1), MEM_NULL);
        assert_eq!(stepctl_set_max_conv_fails(null, -1), MEM_NULL);
        assert_eq!(stepctl_clear_stop_time(null), MEM_NULL);
        assert_eq!(stepctl_set_root_direction(null, ptr::null()), MEM_NULL);
        assert_eq!(stepctl_print_all_stats(null, ptr::null_mut(), 7), MEM_NULL);

        let mut nst: c_long = -1;
        assert_eq!(stepctl_get_num_steps(null, &mut nst), MEM_NULL);
        assert_eq!(nst, -1);

        let mut ls = StepctlLinearSolverStats::default();
        assert_eq!(stepctl_get_linear_solver_stats(null, &mut ls), MEM_NULL);
        let mut proj = StepctlProjectionStats::default();
        assert_eq!(stepctl_get_projection_stats(null, &mut proj), MEM_NULL);
    }
}

#[test]
fn create_rejects_unknown_method() {
    unsafe {
        assert!(stepctl_create(7, 3, 0).is_null());
        assert!(stepctl_create(STEPCTL_BDF, 3, -1).is_null());
    }
    let mut none = ptr::null_mut::<StepctlMem>();
    unsafe { stepctl_free(&mut none) };
}

#[test]
fn strict_setters_return_ill_input() {
    let mem = create(3, 0);
    unsafe {
        assert_eq!(stepctl_set_max_ord(mem, 6), ILL_INPUT);
        assert_eq!(stepctl_set_max_ord(mem, 3), SUCCESS);
        assert_eq!(stepctl_set_max_step(mem, 1.0), SUCCESS);
        assert_eq!(stepctl_set_min_step(mem, 2.0), ILL_INPUT);
        assert_eq!(stepctl_set_root_direction(mem, ptr::null()), ILL_INPUT);
        assert_eq!(stepctl_set_lsetup_frequency(mem, -1), ILL_INPUT);
        assert_eq!(stepctl_set_max_err_test_fails(mem, -1), ILL_INPUT);
        assert_eq!(stepctl_set_max_conv_fails(mem, 4), SUCCESS);

        let bad = [1.0, 3.0, 0.0];
        assert_eq!(stepctl_set_constraints(mem, bad.as_ptr(), bad.len()), ILL_INPUT);
        let good = [1.0, -1.0, 2.0];
        assert_eq!(stepctl_set_constraints(mem, good.as_ptr(), good.len()), SUCCESS);
        assert_eq!(stepctl_set_constraints(mem, ptr::null(), 0), SUCCESS);

        // Tolerant setters always succeed.
        assert_eq!(stepctl_set_eta_max(mem, -4.0), SUCCESS);
        assert_eq!(stepctl_set_eta_fixed_step_bounds(mem, 2.0, 0.0), SUCCESS);

        let mut q: c_int = 0;
        assert_eq!(stepctl_get_current_order(mem, &mut q), SUCCESS);
        assert_eq!(stepctl_get_num_steps(mem, ptr::null_mut()), ILL_INPUT);
    }
    free(mem);
}

#[test]
fn zero_length_constraints_clear() {
    let mem = create(3, 0);
    let good = [1.0, -1.0, 2.0];
    unsafe {
        assert_eq!(stepctl_set_constraints(mem, good.as_ptr(), good.len()), SUCCESS);
        assert!((*mem).config().constraints().is_some());

        // Non-null pointer, zero length.
        assert_eq!(stepctl_set_constraints(mem, good.as_ptr(), 0), SUCCESS);
        assert!((*mem).config().constraints().is_none());
    }
    free(mem);
}

#[test]
fn subsystem_stats_need_attachment() {
    let bare = create(2, 0);
    let handle = IntegratorHandle::new(
        IntegratorSetup::new(LinearMultistep::Bdf, SerialVector::zeros(2))
            .with_linear_solver(LinearSolverStats {
                nje: 3,
                nli: 11,
                lrw: 40,
                liw: 6,
                ..LinearSolverStats::default()
            })
            .with_projection(ProjectionStats {
                nproj: 5,
                npfails: 1,
            }),
    );
    let mem = Box::into_raw(Box::new(handle));
    unsafe {
        let mut ls = StepctlLinearSolverStats::default();
        assert_eq!(stepctl_get_linear_solver_stats(bare, &mut ls), MEM_FAIL);
        assert_eq!(ls, StepctlLinearSolverStats::default());
        let mut proj = StepctlProjectionStats::default();
        assert_eq!(stepctl_get_projection_stats(bare, &mut proj), PROJ_MEM_NULL);

        assert_eq!(stepctl_get_linear_solver_stats(mem, ptr::null_mut()), ILL_INPUT);
        assert_eq!(stepctl_get_linear_solver_stats(mem, &mut ls), SUCCESS);
        assert_eq!((ls.nje, ls.nli, ls.nps), (3, 11, 0));
        assert_eq!((ls.lrw, ls.liw), (40, 6));

        assert_eq!(stepctl_get_projection_stats(mem, &mut proj), SUCCESS);
        assert_eq!(
            proj,
            StepctlProjectionStats {
                nproj: 5,
                npfails: 1
            }
        );
    }
    free(bare);
    free(mem);
}

#[test]
fn root_directions_through_abi() {
    let mem = create(2, 2);
    let dirs: [c_int; 2] = [1, -1];
    unsafe {
        assert_eq!(stepctl_set_root_direction(mem, dirs.as_ptr()), SUCCESS);
        assert_eq!((*mem).config().root_directions(), &[1, -1]);

        (*mem).state_mut().iroots = vec![0, 1];
        let mut found: [c_int; 2] = [9, 9];
        assert_eq!(stepctl_get_root_info(mem, found.as_mut_ptr()), SUCCESS);
        assert_eq!(found, [0, 1]);
    }
    free(mem);
}

#[test]
fn vectors_copy_into_caller_buffers() {
    let mem = create(3, 0);
    unsafe {
        (*mem).state_mut().ewt = SerialVector::from_slice(&[0.5, 1.0, 2.0]);
        let mut buf = [0.0; 3];
        assert_eq!(stepctl_get_err_weights(mem, buf.as_mut_ptr(), 3), SUCCESS);
        assert_eq!(buf, [0.5, 1.0, 2.0]);

        let mut short = [0.0; 2];
        assert_eq!(stepctl_get_err_weights(mem, short.as_mut_ptr(), 2), ILL_INPUT);
    }
    free(mem);
}

#[test]
fn composite_stats_struct() {
    let mem = create(1, 0);
    unsafe {
        {
            let s = (*mem).state_mut();
            s.nst = 5;
            s.qu = 2;
            s.next_q = 3;
            s.hu = 0.25;
            s.tn = 1.5;
        }
        let mut stats = StepctlIntegratorStats::default();
        assert_eq!(stepctl_get_integrator_stats(mem, &mut stats), SUCCESS);
        assert_eq!(stats.nsteps, 5);
        assert_eq!((stats.qlast, stats.qcur), (2, 3));
        assert_eq!(stats.hlast, 0.25);
        assert_eq!(stats.tcur, 1.5);
    }
    free(mem);
}

unsafe extern "C" fn count_calls(stats: *const StepctlIntegratorStats, ctx: *mut c_void) -> c_int {
    unsafe {
        assert!(!stats.is_null());
        *ctx.cast::<u32>() += 1;
    }
    0
}

#[test]
fn monitor_receives_context() {
    let mem = create(1, 0);
    let mut calls: u32 = 0;
    unsafe {
        let ctx = (&mut calls as *mut u32).cast::<c_void>();
        assert_eq!(stepctl_set_monitor_frequency(mem, -2), ILL_INPUT);
        assert_eq!(stepctl_set_monitor_fn(mem, Some(count_calls), ctx), SUCCESS);
        assert_eq!(stepctl_set_monitor_frequency(mem, 1), SUCCESS);
        for step in 1..=3 {
            (*mem).state_mut().nst = step;
            (*mem).run_monitor();
        }
    }
    assert_eq!(calls, 3);
    free(mem);
}

#[test]
fn user_data_passes_through() {
    let mem = create(1, 0);
    let mut payload = 42_i32;
    unsafe {
        let mut out: *mut c_void = ptr::null_mut();
        assert_eq!(stepctl_get_user_data(mem, &mut out), SUCCESS);
        assert!(out.is_null());

        let p = (&mut payload as *mut i32).cast::<c_void>();
        assert_eq!(stepctl_set_user_data(mem, p), SUCCESS);
        assert_eq!(stepctl_get_user_data(mem, &mut out), SUCCESS);
        assert_eq!(out, p);
    }
    free(mem);
}

#[test]
fn flag_names_are_caller_owned() {
    assert_eq!(flag_name(0), "SUCCESS");
    assert_eq!(flag_name(-22), "ILL_INPUT");
    assert_eq!(flag_name(-29), "PROJ_MEM_NULL");
    assert_eq!(flag_name(-1000), "NONE");
    unsafe { stepctl_free_name(ptr::null_mut()) };
}

#[test]
fn report_to_file_stream() {
    let handle = IntegratorHandle::new(
        IntegratorSetup::new(LinearMultistep::Bdf, SerialVector::zeros(2))
            .with_linear_solver(LinearSolverStats::default()),
    );
    let mem = Box::into_raw(Box::new(handle));
    unsafe {
        (*mem).state_mut().nst = 4;
        (*mem).state_mut().nni = 8;

        let f = libc::tmpfile();
        assert!(!f.is_null());
        assert_eq!(stepctl_print_all_stats(mem, f, 2), ILL_INPUT);
        assert_eq!(stepctl_print_all_stats(mem, ptr::null_mut(), 0), ILL_INPUT);
        assert_eq!(stepctl_print_all_stats(mem, f, 0), SUCCESS);
        let table = slurp(f);
        libc::fclose(f);

        assert!(table.starts_with("Current time"));
        assert!(table.contains(&format!("{:<30}= 2", "NLS iters per step")));
        assert!(table.contains("Jac fn evals"));
        assert!(table.contains("LS iters per NLS iter"));

        let f = libc::tmpfile();
        assert_eq!(stepctl_print_all_stats(mem, f, 1), SUCCESS);
        let csv = slurp(f);
        libc::fclose(f);
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("Current time,"));
    }
    free(mem);
}
