//! Integration test: statistics read path and report rendering.
//!
//! Drives a handle the way the integrator core would (writing counters
//! through `state_mut`) and checks what the accessors and the formatter
//! expose.
//!
//! Run: cargo test -p stepctl-core --test statistics_test

use stepctl_core::{
    IntegratorHandle, IntegratorSetup, LinearMultistep, LinearSolverStats, OutputFormat,
    ProjectionStats, SerialVector, StatisticsSnapshot,
};

fn bdf_with_bounds(hmin: f64, hmax: f64, q: i64) -> IntegratorHandle<SerialVector> {
    let mut h = IntegratorHandle::new(IntegratorSetup::new(
        LinearMultistep::Bdf,
        SerialVector::zeros(3),
    ));
    h.set_min_step(hmin).unwrap();
    h.set_max_step(hmax).unwrap();
    h.set_max_ord(q).unwrap();
    h
}

/// Minimal stand-in for the integrator core: advances time with a step kept
/// inside the configured bounds and ramps the order up to its cap.
fn advance(h: &mut IntegratorHandle<SerialVector>, steps: u64) {
    let hmin = h.config().min_step();
    let hmax = h.config().max_step();
    let qmax = h.config().max_order();
    for _ in 0..steps {
        let s = h.state_mut();
        let proposed = if s.nst == 0 { 1e-3 } else { s.next_h * 2.0 };
        let step = proposed.min(hmax).max(hmin);
        if s.nst == 0 {
            s.h0u = step;
        }
        s.nst += 1;
        s.nfe += 2;
        s.nni += 2;
        s.h = step;
        s.hu = step;
        s.tn += step;
        s.qu = s.next_q.max(1);
        s.next_q = (s.qu + 1).min(qmax);
        s.next_h = (step * 2.0).min(hmax).max(hmin);
    }
}

#[test]
fn equal_bounds_survive_reciprocal_rounding() {
    // 1 / (1 / hb) lands one ulp below hb.
    let hb = 28.938_815_352_182_598;
    let mut h = bdf_with_bounds(hb, hb, 2);
    assert!(h.config().max_step() < h.config().min_step());
    advance(&mut h, 3);

    let stats = h.integrator_stats();
    assert_eq!(stats.nsteps, 3);
    assert_eq!(stats.hinused, hb);
    assert_eq!(stats.hlast, hb);
    assert_eq!(stats.hcur, hb);
}

#[test]
fn end_to_end_bounds_hold() {
    let mut h = bdf_with_bounds(1e-6, 10.0, 3);
    advance(&mut h, 5);

    let stats = h.integrator_stats();
    assert_eq!(stats.nsteps, 5);
    assert!(stats.qlast <= 3);
    assert!(stats.qcur <= 3);
    assert!((1e-6..=10.0).contains(&stats.hlast));
    assert!((1e-6..=10.0).contains(&stats.hcur));
    assert_eq!(stats.hinused, 1e-3);
    assert!(stats.tcur > 0.0);
}

#[test]
fn snapshot_mirrors_accessors() {
    let mut h = bdf_with_bounds(1e-6, 1.0, 5);
    advance(&mut h, 4);
    h.state_mut().nge = 9;

    let snap = h.snapshot();
    assert_eq!(snap.nst, h.num_steps());
    assert_eq!(snap.nfe, h.num_rhs_evals());
    assert_eq!(snap.nni, h.num_nonlin_solv_iters());
    assert_eq!(snap.nge, h.num_g_evals());
    assert_eq!(snap.tcur, h.current_time());
    assert_eq!(snap, StatisticsSnapshot::capture(&h));
    assert_eq!(h.nonlin_solv_stats(), (8, 0));
}

#[test]
fn accessors_are_live_not_cached() {
    let mut h = bdf_with_bounds(0.0, 0.0, 2);
    let before = h.snapshot();
    advance(&mut h, 1);
    assert_ne!(h.snapshot(), before);
    assert_eq!(h.num_steps(), 1);
}

#[test]
fn current_state_copies_solution() {
    let mut h = bdf_with_bounds(0.0, 0.0, 2);
    h.state_mut().y = SerialVector::from_slice(&[1.0, 2.0, 3.0]);
    h.state_mut().acor = SerialVector::from_slice(&[0.1, 0.0, -0.1]);

    let mut y = SerialVector::zeros(3);
    h.current_state(&mut y);
    assert_eq!(y.as_slice(), &[1.0, 2.0, 3.0]);

    let mut ele = SerialVector::zeros(3);
    h.est_local_errors(&mut ele);
    assert_eq!(ele.as_slice(), &[0.1, 0.0, -0.1]);
}

#[test]
fn root_info_is_a_copy() {
    let mut h = IntegratorHandle::new(
        IntegratorSetup::new(LinearMultistep::Adams, SerialVector::zeros(1)).with_root_fns(2),
    );
    h.state_mut().iroots = vec![0, -1];
    let mut info = h.root_info();
    info[0] = 7;
    assert_eq!(h.root_info(), vec![0, -1]);
}

#[test]
fn report_through_handle() {
    let mut h = IntegratorHandle::new(
        IntegratorSetup::new(LinearMultistep::Bdf, SerialVector::zeros(2))
            .with_linear_solver(LinearSolverStats::default())
            .with_projection(ProjectionStats::default()),
    );
    advance(&mut h, 3);
    if let Some(ls) = h.linear_solver_mut() {
        ls.nli = 12;
        ls.nje = 1;
    }

    let mut out = Vec::new();
    h.print_all_stats(&mut out, OutputFormat::Table).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("NLS iters per step"));
    assert!(text.contains(&format!("{:<30}= 2", "LS iters per NLS iter")));
    assert!(text.lines().last().unwrap().starts_with("Projection fails"));

    let mut csv = Vec::new();
    h.print_all_stats(&mut csv, OutputFormat::Csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    assert_eq!(csv.matches('\n').count(), 1);
    assert!(csv.contains(",Jac fn evals,1,"));
}

#[test]
fn contrived_state_omits_per_step_ratio() {
    let mut h = bdf_with_bounds(0.0, 0.0, 2);
    h.state_mut().nni = 5;

    let mut out = Vec::new();
    h.print_all_stats(&mut out, OutputFormat::Table).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("NLS iters"));
    assert!(!text.contains("per step"));
    assert!(!text.contains("NaN"));
}
