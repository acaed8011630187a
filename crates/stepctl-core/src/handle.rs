//! Integrator handle and its validated write path.
//!
//! An [`IntegratorHandle`] owns the configuration store, the live counters
//! maintained by the integrator core, and the optional subsystem records.
//! Callers change configuration only through the setters here. The integrator
//! core writes counters through [`IntegratorHandle::state_mut`] and friends.

use std::any::Any;

use crate::caps::BuildCapabilities;
use crate::config::{ConfigurationRecord, LinearMultistep, MonitorFn};
use crate::diag;
use crate::error::{Capability, StepError, StepResult, Subsystem};
use crate::nvector::{NVector, VectorOps};
use crate::policy::{self, TolerantRule};
use crate::stats::{LinearSolverStats, ProjectionStats};

/// Real words of fixed-size integrator storage.
pub const FIXED_LRW: usize = 58;
/// Integer words of fixed-size integrator storage.
pub const FIXED_LIW: usize = 40;

/// Default iteration cap for the nonlinear solver.
pub const NLS_MAXCOR_DEFAULT: u32 = 3;

/// Settings owned by an attached nonlinear solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonlinearSolverContext {
    pub max_iters: u32,
}

impl Default for NonlinearSolverContext {
    fn default() -> Self {
        Self {
            max_iters: NLS_MAXCOR_DEFAULT,
        }
    }
}

/// Everything fixed by the one-time allocation step.
#[derive(Debug, Clone)]
pub struct IntegratorSetup<V> {
    pub method: LinearMultistep,
    /// Order bound for the lifetime of the handle; `None` uses the method limit.
    pub max_order: Option<usize>,
    /// Template for every state-shaped vector.
    pub template: V,
    pub num_root_fns: usize,
    pub capabilities: BuildCapabilities,
    pub nonlinear_solver: Option<NonlinearSolverContext>,
    pub linear_solver: Option<LinearSolverStats>,
    pub projection: Option<ProjectionStats>,
}

impl<V: NVector> IntegratorSetup<V> {
    #[must_use]
    pub fn new(method: LinearMultistep, template: V) -> Self {
        Self {
            method,
            max_order: None,
            template,
            num_root_fns: 0,
            capabilities: BuildCapabilities::compiled(),
            nonlinear_solver: Some(NonlinearSolverContext::default()),
            linear_solver: None,
            projection: None,
        }
    }

    #[must_use]
    pub fn with_max_order(mut self, q: usize) -> Self {
        self.max_order = Some(q);
        self
    }

    #[must_use]
    pub fn with_root_fns(mut self, n: usize) -> Self {
        self.num_root_fns = n;
        self
    }

    #[must_use]
    pub fn with_capabilities(mut self, caps: BuildCapabilities) -> Self {
        self.capabilities = caps;
        self
    }

    #[must_use]
    pub fn without_nonlinear_solver(mut self) -> Self {
        self.nonlinear_solver = None;
        self
    }

    #[must_use]
    pub fn with_linear_solver(mut self, stats: LinearSolverStats) -> Self {
        self.linear_solver = Some(stats);
        self
    }

    #[must_use]
    pub fn with_projection(mut self, stats: ProjectionStats) -> Self {
        self.projection = Some(stats);
        self
    }
}

/// Counters and state the integrator core maintains.
#[derive(Debug, Clone)]
pub struct IntegratorState<V> {
    pub nst: u64,
    pub nfe: u64,
    pub nsetups: u64,
    pub netf: u64,
    /// Order used on the last successful step.
    pub qu: usize,
    /// Order to attempt on the next step.
    pub next_q: usize,
    /// Step size being attempted; its sign gives the direction of integration.
    pub h: f64,
    pub hu: f64,
    pub next_h: f64,
    pub h0u: f64,
    pub gamma: f64,
    /// Order reductions from stability limit detection.
    pub nor: u64,
    pub tn: f64,
    pub tolsf: f64,
    pub lrw: usize,
    pub liw: usize,
    pub nni: u64,
    pub nnf: u64,
    pub ncfn: u64,
    pub nge: u64,
    pub iroots: Vec<i32>,
    pub ewt: V,
    pub acor: V,
    pub y: V,
}

impl<V: NVector> IntegratorState<V> {
    fn new(template: &V, qmax_alloc: usize, nrtfn: usize) -> Self {
        let (lrw1, liw1) = template.space();
        // Nordsieck history plus the error weight, correction, and work vectors.
        let nvecs = qmax_alloc + 5;
        Self {
            nst: 0,
            nfe: 0,
            nsetups: 0,
            netf: 0,
            qu: 0,
            next_q: 0,
            h: 0.0,
            hu: 0.0,
            next_h: 0.0,
            h0u: 0.0,
            gamma: 0.0,
            nor: 0,
            tn: 0.0,
            tolsf: 1.0,
            lrw: FIXED_LRW + nvecs * lrw1,
            liw: FIXED_LIW + nvecs * liw1,
            nni: 0,
            nnf: 0,
            ncfn: 0,
            nge: 0,
            iroots: vec![0; nrtfn],
            ewt: template.clone_empty(),
            acor: template.clone_empty(),
            y: template.clone_empty(),
        }
    }
}

/// One integration run: configuration, live counters, and subsystems.
pub struct IntegratorHandle<V> {
    pub(crate) config: ConfigurationRecord<V>,
    pub(crate) state: IntegratorState<V>,
    pub(crate) caps: BuildCapabilities,
    pub(crate) alloc_done: bool,
    pub(crate) nrtfn: usize,
    pub(crate) nls: Option<NonlinearSolverContext>,
    pub(crate) ls: Option<LinearSolverStats>,
    pub(crate) proj: Option<ProjectionStats>,
    template_len: usize,
}

impl<V: NVector> IntegratorHandle<V> {
    /// Handle whose one-time allocation has completed.
    #[must_use]
    pub fn new(setup: IntegratorSetup<V>) -> Self {
        Self::build(setup, true)
    }

    /// Handle that has not completed its allocation phase.
    #[must_use]
    pub fn uninitialized(setup: IntegratorSetup<V>) -> Self {
        Self::build(setup, false)
    }

    fn build(setup: IntegratorSetup<V>, alloc_done: bool) -> Self {
        let method_max = setup.method.max_order();
        let qmax_alloc = setup
            .max_order
            .map_or(method_max, |q| q.clamp(1, method_max));
        Self {
            config: ConfigurationRecord::new(setup.method, qmax_alloc, setup.num_root_fns),
            state: IntegratorState::new(&setup.template, qmax_alloc, setup.num_root_fns),
            caps: setup.capabilities,
            alloc_done,
            nrtfn: setup.num_root_fns,
            nls: setup.nonlinear_solver,
            ls: setup.linear_solver,
            proj: setup.projection,
            template_len: setup.template.len(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ConfigurationRecord<V> {
        &self.config
    }

    #[must_use]
    pub fn capabilities(&self) -> BuildCapabilities {
        self.caps
    }

    #[must_use]
    pub fn alloc_done(&self) -> bool {
        self.alloc_done
    }

    #[must_use]
    pub fn num_root_fns(&self) -> usize {
        self.nrtfn
    }

    #[must_use]
    pub fn nonlinear_solver(&self) -> Option<&NonlinearSolverContext> {
        self.nls.as_ref()
    }

    // -----------------------------------------------------------------------
    // Collaborator write path
    // -----------------------------------------------------------------------

    /// Counters and vectors, for the integrator core only.
    pub fn state_mut(&mut self) -> &mut IntegratorState<V> {
        &mut self.state
    }

    /// Linear solver counters, for the integrator core only.
    pub fn linear_solver_mut(&mut self) -> Option<&mut LinearSolverStats> {
        self.ls.as_mut()
    }

    /// Projection counters, for the integrator core only.
    pub fn projection_mut(&mut self) -> Option<&mut ProjectionStats> {
        self.proj.as_mut()
    }

    pub fn attach_linear_solver(&mut self, stats: LinearSolverStats) {
        self.ls = Some(stats);
    }

    pub fn attach_projection(&mut self, stats: ProjectionStats) {
        self.proj = Some(stats);
    }

    /// Invoke the monitor hook when the step count hits the configured interval.
    ///
    /// Returns true when the hook ran.
    pub fn run_monitor(&mut self) -> bool {
        let interval = self.config.monitor_interval;
        let nst = self.state.nst;
        let due = interval > 0 && nst > 0 && nst % interval.unsigned_abs() == 0;
        if !due || self.config.monitor.is_none() {
            return false;
        }
        let snapshot = self.snapshot();
        match self.config.monitor.as_mut() {
            Some(monitor) => {
                monitor(&snapshot);
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Order and step bounds
    // -----------------------------------------------------------------------

    pub fn set_max_ord(&mut self, maxord: i64) -> StepResult<()> {
        const OP: &str = "set_max_ord";
        let q = diag::check(OP, policy::check_max_order(OP, maxord, self.config.qmax_alloc))?;
        self.config.qmax = q;
        Ok(())
    }

    /// Zero restores the default; a negative value disables the step limit.
    pub fn set_max_num_steps(&mut self, mxstep: i64) {
        self.config.mxstep = self.resolve(policy::MXSTEP, mxstep);
    }

    pub fn set_max_hnil_warns(&mut self, mxhnil: i32) {
        self.config.mxhnil = mxhnil;
    }

    pub fn set_stab_lim_det(&mut self, on: bool) -> StepResult<()> {
        const OP: &str = "set_stab_lim_det";
        if on && self.config.lmm != LinearMultistep::Bdf {
            return diag::check(
                OP,
                Err(StepError::illegal(OP, "attempt to use stability limit detection with a non-BDF method")),
            );
        }
        self.config.sldet = on;
        Ok(())
    }

    /// Zero asks the integrator to estimate the first step.
    pub fn set_init_step(&mut self, hin: f64) {
        self.config.hin = hin;
    }

    pub fn set_min_step(&mut self, hmin: f64) -> StepResult<()> {
        const OP: &str = "set_min_step";
        let stored = diag::check(OP, policy::check_min_step(OP, hmin, self.config.hmax_inv))?;
        self.config.hmin = stored;
        Ok(())
    }

    /// Zero removes the bound.
    pub fn set_max_step(&mut self, hmax: f64) -> StepResult<()> {
        const OP: &str = "set_max_step";
        let hmax_inv = diag::check(OP, policy::check_max_step(OP, hmax, self.config.hmin))?;
        self.config.hmax_inv = hmax_inv;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Step-change factors (tolerant)
    // -----------------------------------------------------------------------

    pub fn set_eta_fixed_step_bounds(&mut self, eta_min_fx: f64, eta_max_fx: f64) {
        self.config.eta.eta_min_fx = self.resolve(policy::ETA_MIN_FX, eta_min_fx);
        self.config.eta.eta_max_fx = self.resolve(policy::ETA_MAX_FX, eta_max_fx);
    }

    pub fn set_eta_max_first_step(&mut self, eta_max_fs: f64) {
        self.config.eta.eta_max_fs = self.resolve(policy::ETA_MAX_FS, eta_max_fs);
    }

    pub fn set_eta_max_early_step(&mut self, eta_max_es: f64) {
        self.config.eta.eta_max_es = self.resolve(policy::ETA_MAX_ES, eta_max_es);
    }

    pub fn set_num_steps_eta_max_early_step(&mut self, small_nst: i64) {
        self.config.eta.small_nst = self.resolve(policy::SMALL_NST, small_nst);
    }

    pub fn set_eta_max(&mut self, eta_max_gs: f64) {
        self.config.eta.eta_max_gs = self.resolve(policy::ETA_MAX_GS, eta_max_gs);
    }

    pub fn set_eta_min(&mut self, eta_min: f64) {
        self.config.eta.eta_min = self.resolve(policy::ETA_MIN, eta_min);
    }

    pub fn set_eta_min_err_fail(&mut self, eta_min_ef: f64) {
        self.config.eta.eta_min_ef = self.resolve(policy::ETA_MIN_EF, eta_min_ef);
    }

    pub fn set_eta_max_err_fail(&mut self, eta_max_ef: f64) {
        self.config.eta.eta_max_ef = self.resolve(policy::ETA_MAX_EF, eta_max_ef);
    }

    pub fn set_num_fails_eta_max_err_fail(&mut self, small_nef: i32) {
        self.config.eta.small_nef = self.resolve(policy::SMALL_NEF, small_nef);
    }

    pub fn set_eta_conv_fail(&mut self, eta_cf: f64) {
        self.config.eta.eta_cf = self.resolve(policy::ETA_CF, eta_cf);
    }

    fn resolve<T: Copy>(&mut self, rule: TolerantRule<T>, input: T) -> T {
        let resolved = rule.apply(input);
        if resolved.defaulted {
            self.config.substitutions += 1;
        }
        resolved.value
    }

    // -----------------------------------------------------------------------
    // Stop time
    // -----------------------------------------------------------------------

    pub fn set_stop_time(&mut self, tstop: f64) -> StepResult<()> {
        const OP: &str = "set_stop_time";
        diag::check(
            OP,
            policy::check_stop_time(OP, tstop, self.state.nst, self.state.tn, self.state.h),
        )?;
        self.config.tstop = tstop;
        self.config.tstopset = true;
        Ok(())
    }

    pub fn set_interpolate_stop_time(&mut self, interp: bool) {
        self.config.tstopinterp = interp;
    }

    pub fn clear_stop_time(&mut self) {
        self.config.tstopset = false;
    }

    // -----------------------------------------------------------------------
    // Failure thresholds and solver coupling
    // -----------------------------------------------------------------------

    pub fn set_max_err_test_fails(&mut self, maxnef: u32) {
        self.config.maxnef = maxnef;
    }

    pub fn set_max_conv_fails(&mut self, maxncf: u32) {
        self.config.maxncf = maxncf;
    }

    pub fn set_max_nonlin_iters(&mut self, maxcor: i32) -> StepResult<()> {
        const OP: &str = "set_max_nonlin_iters";
        let result = match self.nls.as_mut() {
            None => Err(StepError::MissingSubsystem {
                op: OP,
                subsystem: Subsystem::NonlinearSolver,
            }),
            Some(_) if maxcor < 1 => Err(StepError::illegal(OP, "maximum iterations must be >= 1")),
            Some(nls) => {
                nls.max_iters = maxcor.unsigned_abs();
                Ok(())
            }
        };
        diag::check(OP, result)
    }

    pub fn set_nonlin_conv_coef(&mut self, nlscoef: f64) {
        self.config.nlscoef = nlscoef;
    }

    /// Zero restores the default frequency.
    pub fn set_lsetup_frequency(&mut self, msbp: i64) -> StepResult<()> {
        const OP: &str = "set_lsetup_frequency";
        self.config.msbp = diag::check(OP, policy::check_lsetup_frequency(OP, msbp))?;
        Ok(())
    }

    pub fn set_delta_gamma_max_lsetup(&mut self, dgmax_lsetup: f64) {
        self.config.dgmax_lsetup = self.resolve(policy::DGMAX_LSETUP, dgmax_lsetup);
    }

    // -----------------------------------------------------------------------
    // Root finding
    // -----------------------------------------------------------------------

    /// One direction per registered root function: +1 rising, -1 falling,
    /// 0 either.
    pub fn set_root_direction(&mut self, rootdir: &[i32]) -> StepResult<()> {
        const OP: &str = "set_root_direction";
        let result = if self.nrtfn == 0 {
            Err(StepError::illegal(OP, "rootfinding was not initialized"))
        } else if rootdir.len() != self.nrtfn {
            Err(StepError::illegal(
                OP,
                format!("expected {} root directions, got {}", self.nrtfn, rootdir.len()),
            ))
        } else {
            Ok(())
        };
        diag::check(OP, result)?;
        self.config.rootdir.copy_from_slice(rootdir);
        Ok(())
    }

    pub fn set_no_inactive_root_warn(&mut self) {
        self.config.mxgnull = 0;
    }

    // -----------------------------------------------------------------------
    // Constraints
    // -----------------------------------------------------------------------

    /// Install inequality constraints, or release them with `None` or an
    /// empty vector.
    pub fn set_constraints(&mut self, constraints: Option<&V>) -> StepResult<()> {
        const OP: &str = "set_constraints";
        let Some(c) = constraints.filter(|c| !c.is_empty()) else {
            self.release_constraints();
            return Ok(());
        };
        diag::check(OP, self.validate_constraints(OP, c))?;

        let stored = match self.config.constraints.take() {
            Some(existing) => existing,
            None => {
                let (lrw1, liw1) = c.space();
                self.state.lrw += lrw1;
                self.state.liw += liw1;
                c.clone_empty()
            }
        };
        let stored = self.config.constraints.insert(stored);
        c.scale_into(1.0, stored);
        Ok(())
    }

    fn validate_constraints(&self, op: &'static str, c: &V) -> StepResult<()> {
        if !c.ops().supports(VectorOps::CONSTRAINTS) {
            return Err(StepError::illegal(
                op,
                "a required vector operation is not implemented",
            ));
        }
        if c.len() != self.template_len {
            return Err(StepError::illegal(
                op,
                format!("constraints length {} does not match state length {}", c.len(), self.template_len),
            ));
        }
        policy::check_constraint_norm(op, c.max_norm())
    }

    fn release_constraints(&mut self) {
        if let Some(old) = self.config.constraints.take() {
            let (lrw1, liw1) = old.space();
            self.state.lrw -= lrw1;
            self.state.liw -= liw1;
        }
    }

    // -----------------------------------------------------------------------
    // Build-gated features
    // -----------------------------------------------------------------------

    pub fn set_use_fused_kernels(&mut self, on: bool) -> StepResult<()> {
        const OP: &str = "set_use_fused_kernels";
        let backend = self.state.ewt.backend();
        diag::check(
            OP,
            policy::check_fused_kernels(OP, self.caps, self.alloc_done, backend),
        )?;
        self.config.usefused = on;
        Ok(())
    }

    pub fn set_monitor_fn(&mut self, monitor: Option<MonitorFn>) -> StepResult<()> {
        const OP: &str = "set_monitor_fn";
        diag::check(OP, policy::require_capability(OP, self.caps, Capability::Monitoring))?;
        self.config.monitor = monitor;
        Ok(())
    }

    pub fn set_monitor_frequency(&mut self, nst: i64) -> StepResult<()> {
        const OP: &str = "set_monitor_frequency";
        diag::check(OP, policy::require_capability(OP, self.caps, Capability::Monitoring))?;
        let interval = diag::check(OP, policy::check_monitor_interval(OP, nst))?;
        self.config.monitor_interval = interval;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Opaque user context
    // -----------------------------------------------------------------------

    pub fn set_user_data<T: Any>(&mut self, data: T) {
        self.config.user_data = Some(Box::new(data));
    }

    pub fn clear_user_data(&mut self) -> Option<Box<dyn Any>> {
        self.config.user_data.take()
    }

    /// The stored context, if one of type `T` is present.
    #[must_use]
    pub fn user_data<T: Any>(&self) -> Option<&T> {
        self.config.user_data.as_ref()?.downcast_ref::<T>()
    }

    pub fn user_data_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.config.user_data.as_mut()?.downcast_mut::<T>()
    }
}
