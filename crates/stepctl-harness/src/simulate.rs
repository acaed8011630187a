//! Simulated integrator collaborator.
//!
//! Stands in for the integrator core: it reads step-control settings from
//! the configuration store once per step and writes the counters the
//! statistics layer exposes. No ODE is solved; step sizes and orders follow a
//! deterministic schedule kept inside the configured bounds.

use stepctl_core::{
    BuildCapabilities, IntegratorHandle, IntegratorSetup, IntegratorStats, LinearMultistep,
    LinearSolverStats, SerialVector, StatisticsSnapshot,
};

use crate::error::{HarnessError, HarnessResult};

/// First step tried when no initial step is configured.
const DEFAULT_H0: f64 = 1e-4;
/// Every this many steps the simulated error test fails once.
const ERR_TEST_PERIOD: u64 = 7;
/// Corrector iterations per step.
const NLS_ITERS_PER_STEP: u64 = 2;

/// Inputs for one simulated run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub method: LinearMultistep,
    pub steps: u64,
    pub max_order: i64,
    pub hmin: f64,
    pub hmax: f64,
    pub state_len: usize,
    pub capabilities: BuildCapabilities,
    pub with_linear_solver: bool,
    /// Call the monitor hook every this many steps (0 disables it).
    pub monitor_interval: i64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            method: LinearMultistep::Bdf,
            steps: 10,
            max_order: 5,
            hmin: 0.0,
            hmax: 0.0,
            state_len: 3,
            capabilities: BuildCapabilities::compiled(),
            with_linear_solver: true,
            monitor_interval: 0,
        }
    }
}

/// Result of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub stats: IntegratorStats,
    pub snapshot: StatisticsSnapshot,
    /// Snapshots delivered to the monitor hook, in order.
    pub monitored: Vec<StatisticsSnapshot>,
}

/// Build a handle and apply `cfg`'s bounds through the validated setters.
pub fn configure(cfg: &SimulationConfig) -> HarnessResult<IntegratorHandle<SerialVector>> {
    if cfg.state_len == 0 {
        return Err(HarnessError::InvalidArgument("state length must be positive".into()));
    }
    let mut setup = IntegratorSetup::new(cfg.method, SerialVector::zeros(cfg.state_len))
        .with_capabilities(cfg.capabilities);
    if cfg.with_linear_solver {
        setup = setup.with_linear_solver(LinearSolverStats::default());
    }
    let mut h = IntegratorHandle::new(setup);
    h.set_max_step(cfg.hmax)?;
    h.set_min_step(cfg.hmin)?;
    h.set_max_ord(cfg.max_order)?;
    Ok(h)
}

/// Advance `h` by up to `steps` simulated steps, stopping early at the stop
/// time. Returns the number of steps taken.
pub fn advance(h: &mut IntegratorHandle<SerialVector>, steps: u64) -> u64 {
    let mut taken = 0;
    while taken < steps && step_once(h) {
        taken += 1;
        h.run_monitor();
    }
    taken
}

/// Keep `step` inside `[hmin, 1/hmax_inv]`.
///
/// The upper bound is tested in reciprocal form and the minimum applied last:
/// `1/hmax_inv` may round below `hmin` when the two bounds are equal.
fn bound_step(step: f64, hmin: f64, hmax_inv: f64) -> f64 {
    let capped = if step * hmax_inv > 1.0 { 1.0 / hmax_inv } else { step };
    capped.max(hmin)
}

fn step_once(h: &mut IntegratorHandle<SerialVector>) -> bool {
    let cfg = h.config();
    let hmin = cfg.min_step();
    let hmax_inv = cfg.max_step_inv();
    let qmax = cfg.max_order();
    let msbp = u64::try_from(cfg.lsetup_frequency()).unwrap_or(1).max(1);
    let eta = cfg.step_change_factors();
    let tstop = cfg.stop_time();
    let hin = cfg.init_step();

    if let Some(ts) = tstop
        && h.current_time() >= ts
    {
        return false;
    }

    let nst = h.num_steps();
    let first = nst == 0;
    let mut step = if first {
        if hin > 0.0 { hin } else { DEFAULT_H0 }
    } else {
        h.current_step()
    };
    step = bound_step(step, hmin, hmax_inv);

    let mut netf = 0;
    if !first && (nst + 1) % ERR_TEST_PERIOD == 0 {
        // One rejected attempt, retried with the error-failure reduction.
        netf = 1;
        step = bound_step(step * eta.eta_max_ef, hmin, hmax_inv);
    }
    if let Some(ts) = tstop {
        let t = h.current_time();
        if t + step > ts && ts > t {
            step = ts - t;
        }
    }

    let growth = if first {
        eta.eta_max_fs
    } else if i64::try_from(nst).unwrap_or(i64::MAX) <= eta.small_nst {
        eta.eta_max_es
    } else {
        eta.eta_max_gs
    };
    // Ramp towards the largest growth allowed, never past the general cap.
    let next = bound_step(step * growth.min(2.0), hmin, hmax_inv);

    let attempts = 1 + netf;
    let s = h.state_mut();
    if first {
        s.h0u = step;
    }
    s.nst += 1;
    s.netf += netf;
    s.nfe += attempts * (NLS_ITERS_PER_STEP + 1);
    s.nni += attempts * NLS_ITERS_PER_STEP;
    if s.nst % msbp == 1 || msbp == 1 {
        s.nsetups += 1;
    }
    s.h = step;
    s.hu = step;
    s.tn += step;
    s.qu = s.next_q.clamp(1, qmax);
    s.next_q = if netf > 0 { s.qu } else { (s.qu + 1).min(qmax) };
    s.next_h = next;
    s.gamma = step;
    let nni = s.nni;
    let nsetups = s.nsetups;

    if let Some(ls) = h.linear_solver_mut() {
        ls.nje = nsetups;
        ls.nli = nni;
        ls.njtimes = nni;
    }
    true
}

/// Configure a handle from `cfg` and run it to completion.
pub fn run(cfg: &SimulationConfig) -> HarnessResult<(IntegratorHandle<SerialVector>, SimulationOutcome)> {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut h = configure(cfg)?;
    let monitored = Rc::new(RefCell::new(Vec::new()));
    if cfg.monitor_interval > 0 {
        let sink = Rc::clone(&monitored);
        h.set_monitor_fn(Some(Box::new(move |s| sink.borrow_mut().push(*s))))?;
        h.set_monitor_frequency(cfg.monitor_interval)?;
    }
    advance(&mut h, cfg.steps);

    let outcome = SimulationOutcome {
        stats: h.integrator_stats(),
        snapshot: h.snapshot(),
        monitored: monitored.borrow().clone(),
    };
    Ok((h, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_stay_inside_bounds() {
        let cfg = SimulationConfig {
            steps: 40,
            hmin: 1e-5,
            hmax: 0.05,
            max_order: 3,
            ..SimulationConfig::default()
        };
        let mut h = configure(&cfg).unwrap();
        for _ in 0..cfg.steps {
            assert_eq!(advance(&mut h, 1), 1);
            assert!((1e-5..=0.05).contains(&h.last_step()));
            assert!((1e-5..=0.05).contains(&h.current_step()));
            assert!(h.last_order() <= 3 && h.current_order() <= 3);
        }
        assert_eq!(h.num_steps(), 40);
        assert!(h.num_err_test_fails() > 0);
    }

    #[test]
    fn stop_time_is_not_overrun() {
        let mut h = configure(&SimulationConfig::default()).unwrap();
        h.set_init_step(0.3);
        h.set_stop_time(1.0).unwrap();
        let taken = advance(&mut h, 20);
        assert!(taken < 20);
        assert!(h.current_time() <= 1.0 + 1e-12);
    }

    #[test]
    fn equal_step_bounds_pin_the_step() {
        let hb = 28.938_815_352_182_598;
        let cfg = SimulationConfig {
            steps: 10,
            hmin: hb,
            hmax: hb,
            ..SimulationConfig::default()
        };
        let (h, outcome) = run(&cfg).unwrap();
        assert_eq!(outcome.stats.nsteps, 10);
        assert_eq!(h.actual_init_step(), hb);
        assert_eq!(h.last_step(), hb);
        assert_eq!(h.current_step(), hb);
    }

    #[test]
    fn bound_step_never_leaves_the_range() {
        assert_eq!(bound_step(5.0, 1.0, 0.5), 2.0);
        assert_eq!(bound_step(0.1, 1.0, 0.5), 1.0);
        assert_eq!(bound_step(1.5, 1.0, 0.5), 1.5);
        // Unbounded maximum.
        assert_eq!(bound_step(1e9, 0.0, 0.0), 1e9);
    }

    #[test]
    fn inconsistent_bounds_fail_configuration() {
        let cfg = SimulationConfig {
            hmin: 2.0,
            hmax: 1.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(configure(&cfg), Err(HarnessError::Step(_))));
    }

    #[test]
    fn monitor_interval_collects_snapshots() {
        let cfg = SimulationConfig {
            steps: 9,
            monitor_interval: 3,
            capabilities: BuildCapabilities::ALL,
            ..SimulationConfig::default()
        };
        let (_, outcome) = run(&cfg).unwrap();
        let at: Vec<u64> = outcome.monitored.iter().map(|s| s.nst).collect();
        assert_eq!(at, vec![3, 6, 9]);
    }
}
