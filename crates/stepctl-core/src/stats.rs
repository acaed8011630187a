//! Statistics aggregator.
//!
//! Read path over the counters the integrator core maintains. Scalars are
//! returned by value; vector-valued state is copied into a caller-supplied
//! destination. Absent subsystems contribute `None`, never an error.

use crate::handle::IntegratorHandle;
use crate::nvector::NVector;

/// Counters kept by an attached linear solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearSolverStats {
    /// Jacobian evaluations.
    pub nje: u64,
    /// RHS evaluations spent on difference-quotient Jacobians.
    pub nfe_dq: u64,
    /// Preconditioner setups.
    pub npe: u64,
    /// Preconditioner solves.
    pub nps: u64,
    /// Linear iterations.
    pub nli: u64,
    /// Linear convergence failures.
    pub ncfl: u64,
    /// Jacobian-vector product setups.
    pub njtsetup: u64,
    /// Jacobian-vector product evaluations.
    pub njtimes: u64,
    pub lrw: usize,
    pub liw: usize,
}

/// Counters kept by an attached projection subsystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionStats {
    pub nproj: u64,
    pub npfails: u64,
}

/// Most commonly consumed counters, fetched in one call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntegratorStats {
    pub nsteps: u64,
    pub nfevals: u64,
    pub nlinsetups: u64,
    pub netfails: u64,
    pub qlast: usize,
    pub qcur: usize,
    pub hinused: f64,
    pub hlast: f64,
    pub hcur: f64,
    pub tcur: f64,
}

/// Owned copy of every scalar the report formatter renders.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatisticsSnapshot {
    pub tcur: f64,
    pub nst: u64,
    pub netf: u64,
    pub ncfn: u64,
    pub h0u: f64,
    pub hu: f64,
    pub hcur: f64,
    pub qu: usize,
    pub qcur: usize,
    pub nor: u64,
    pub nfe: u64,
    pub nni: u64,
    pub nnf: u64,
    pub nsetups: u64,
    pub nge: u64,
    pub gamma: f64,
    pub tolsf: f64,
    pub lrw: usize,
    pub liw: usize,
    pub linear_solver: Option<LinearSolverStats>,
    pub projection: Option<ProjectionStats>,
}

impl StatisticsSnapshot {
    /// Copy the live counters out of `handle`.
    #[must_use]
    pub fn capture<V: NVector>(handle: &IntegratorHandle<V>) -> Self {
        let s = &handle.state;
        Self {
            tcur: s.tn,
            nst: s.nst,
            netf: s.netf,
            ncfn: s.ncfn,
            h0u: s.h0u,
            hu: s.hu,
            hcur: s.next_h,
            qu: s.qu,
            qcur: s.next_q,
            nor: handle.num_stab_lim_order_reds(),
            nfe: s.nfe,
            nni: s.nni,
            nnf: s.nnf,
            nsetups: s.nsetups,
            nge: s.nge,
            gamma: s.gamma,
            tolsf: s.tolsf,
            lrw: s.lrw,
            liw: s.liw,
            linear_solver: handle.ls,
            projection: handle.proj,
        }
    }
}

impl<V: NVector> IntegratorHandle<V> {
    #[must_use]
    pub fn num_steps(&self) -> u64 {
        self.state.nst
    }

    #[must_use]
    pub fn num_rhs_evals(&self) -> u64 {
        self.state.nfe
    }

    #[must_use]
    pub fn num_lin_solv_setups(&self) -> u64 {
        self.state.nsetups
    }

    #[must_use]
    pub fn num_err_test_fails(&self) -> u64 {
        self.state.netf
    }

    #[must_use]
    pub fn last_order(&self) -> usize {
        self.state.qu
    }

    #[must_use]
    pub fn current_order(&self) -> usize {
        self.state.next_q
    }

    #[must_use]
    pub fn current_gamma(&self) -> f64 {
        self.state.gamma
    }

    /// Zero unless stability limit detection is on.
    #[must_use]
    pub fn num_stab_lim_order_reds(&self) -> u64 {
        if self.config.sldet { self.state.nor } else { 0 }
    }

    #[must_use]
    pub fn actual_init_step(&self) -> f64 {
        self.state.h0u
    }

    #[must_use]
    pub fn last_step(&self) -> f64 {
        self.state.hu
    }

    #[must_use]
    pub fn current_step(&self) -> f64 {
        self.state.next_h
    }

    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.state.tn
    }

    #[must_use]
    pub fn tol_scale_factor(&self) -> f64 {
        self.state.tolsf
    }

    /// `(real words, integer words)` held by the integrator.
    #[must_use]
    pub fn work_space(&self) -> (usize, usize) {
        (self.state.lrw, self.state.liw)
    }

    pub fn current_state(&self, dst: &mut V) {
        self.state.y.scale_into(1.0, dst);
    }

    pub fn err_weights(&self, dst: &mut V) {
        self.state.ewt.scale_into(1.0, dst);
    }

    pub fn est_local_errors(&self, dst: &mut V) {
        self.state.acor.scale_into(1.0, dst);
    }

    #[must_use]
    pub fn integrator_stats(&self) -> IntegratorStats {
        let s = &self.state;
        IntegratorStats {
            nsteps: s.nst,
            nfevals: s.nfe,
            nlinsetups: s.nsetups,
            netfails: s.netf,
            qlast: s.qu,
            qcur: s.next_q,
            hinused: s.h0u,
            hlast: s.hu,
            hcur: s.next_h,
            tcur: s.tn,
        }
    }

    #[must_use]
    pub fn num_g_evals(&self) -> u64 {
        self.state.nge
    }

    /// Which root functions were found to have a root, with crossing sign.
    #[must_use]
    pub fn root_info(&self) -> Vec<i32> {
        self.state.iroots.clone()
    }

    #[must_use]
    pub fn num_nonlin_solv_iters(&self) -> u64 {
        self.state.nni
    }

    #[must_use]
    pub fn num_nonlin_solv_conv_fails(&self) -> u64 {
        self.state.nnf
    }

    /// `(iterations, convergence failures)` of the nonlinear solver.
    #[must_use]
    pub fn nonlin_solv_stats(&self) -> (u64, u64) {
        (self.state.nni, self.state.nnf)
    }

    /// Steps rejected because the nonlinear solver failed.
    #[must_use]
    pub fn num_step_solve_fails(&self) -> u64 {
        self.state.ncfn
    }

    #[must_use]
    pub fn linear_solver_stats(&self) -> Option<LinearSolverStats> {
        self.ls
    }

    #[must_use]
    pub fn projection_stats(&self) -> Option<ProjectionStats> {
        self.proj
    }

    #[must_use]
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot::capture(self)
    }
}
