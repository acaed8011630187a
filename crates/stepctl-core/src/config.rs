//! Configuration store.
//!
//! Holds every tunable the integrator consults during step control. Fields
//! are private; they change only through the validated setters on
//! [`IntegratorHandle`](crate::handle::IntegratorHandle) and are read through
//! the getters below.

use std::any::Any;
use std::fmt;

use crate::nvector::NVector;
use crate::stats::StatisticsSnapshot;

// ---------------------------------------------------------------------------
// Named defaults
// ---------------------------------------------------------------------------

/// Maximum order for Adams methods.
pub const ADAMS_Q_MAX: usize = 12;
/// Maximum order for BDF methods.
pub const BDF_Q_MAX: usize = 5;

pub const HMIN_DEFAULT: f64 = 0.0;
/// Reciprocal of an unbounded maximum step.
pub const HMAX_INV_DEFAULT: f64 = 0.0;
pub const MXSTEP_DEFAULT: i64 = 500;
pub const MXHNIL_DEFAULT: i32 = 10;
pub const MXNEF_DEFAULT: u32 = 7;
pub const MXNCF_DEFAULT: u32 = 10;
pub const MSBP_DEFAULT: i64 = 20;
pub const DGMAX_LSETUP_DEFAULT: f64 = 0.3;
pub const NLSCOEF_DEFAULT: f64 = 0.1;
pub const MXGNULL_DEFAULT: i32 = 1;

pub const ETA_MIN_FX_DEFAULT: f64 = 0.0;
pub const ETA_MAX_FX_DEFAULT: f64 = 1.5;
pub const ETA_MAX_FS_DEFAULT: f64 = 10000.0;
pub const ETA_MAX_ES_DEFAULT: f64 = 10.0;
pub const ETA_MAX_GS_DEFAULT: f64 = 10.0;
pub const ETA_MIN_DEFAULT: f64 = 0.1;
pub const ETA_MIN_EF_DEFAULT: f64 = 0.1;
pub const ETA_MAX_EF_DEFAULT: f64 = 0.2;
pub const ETA_CF_DEFAULT: f64 = 0.25;
pub const SMALL_NST_DEFAULT: i64 = 10;
pub const SMALL_NEF_DEFAULT: i32 = 2;

/// Linear multistep family used by the integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinearMultistep {
    Adams,
    Bdf,
}

impl LinearMultistep {
    /// Largest order the family supports.
    #[must_use]
    pub const fn max_order(self) -> usize {
        match self {
            Self::Adams => ADAMS_Q_MAX,
            Self::Bdf => BDF_Q_MAX,
        }
    }
}

/// Callback the integrator core invokes every `interval` steps.
pub type MonitorFn = Box<dyn FnMut(&StatisticsSnapshot)>;

/// Step-size change factors for each step-control regime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepChangeFactors {
    /// Keep the step when the proposed ratio lies in `[eta_min_fx, eta_max_fx]`.
    pub eta_min_fx: f64,
    pub eta_max_fx: f64,
    /// Growth cap on the first step.
    pub eta_max_fs: f64,
    /// Growth cap while `nst <= small_nst`.
    pub eta_max_es: f64,
    pub small_nst: i64,
    /// Growth cap on general steps.
    pub eta_max_gs: f64,
    pub eta_min: f64,
    /// Bounds after an error test failure.
    pub eta_min_ef: f64,
    pub eta_max_ef: f64,
    /// Failures before `eta_max_ef` applies.
    pub small_nef: i32,
    /// Factor after a nonlinear convergence failure.
    pub eta_cf: f64,
}

impl Default for StepChangeFactors {
    fn default() -> Self {
        Self {
            eta_min_fx: ETA_MIN_FX_DEFAULT,
            eta_max_fx: ETA_MAX_FX_DEFAULT,
            eta_max_fs: ETA_MAX_FS_DEFAULT,
            eta_max_es: ETA_MAX_ES_DEFAULT,
            small_nst: SMALL_NST_DEFAULT,
            eta_max_gs: ETA_MAX_GS_DEFAULT,
            eta_min: ETA_MIN_DEFAULT,
            eta_min_ef: ETA_MIN_EF_DEFAULT,
            eta_max_ef: ETA_MAX_EF_DEFAULT,
            small_nef: SMALL_NEF_DEFAULT,
            eta_cf: ETA_CF_DEFAULT,
        }
    }
}

/// Every tunable parameter of one integration run.
pub struct ConfigurationRecord<V> {
    pub(crate) lmm: LinearMultistep,
    pub(crate) qmax: usize,
    pub(crate) qmax_alloc: usize,
    pub(crate) mxstep: i64,
    pub(crate) mxhnil: i32,
    pub(crate) sldet: bool,
    pub(crate) hin: f64,
    pub(crate) hmin: f64,
    pub(crate) hmax_inv: f64,
    pub(crate) eta: StepChangeFactors,
    pub(crate) maxnef: u32,
    pub(crate) maxncf: u32,
    pub(crate) msbp: i64,
    pub(crate) dgmax_lsetup: f64,
    pub(crate) nlscoef: f64,
    pub(crate) tstop: f64,
    pub(crate) tstopset: bool,
    pub(crate) tstopinterp: bool,
    pub(crate) rootdir: Vec<i32>,
    pub(crate) mxgnull: i32,
    pub(crate) constraints: Option<V>,
    pub(crate) monitor: Option<MonitorFn>,
    pub(crate) monitor_interval: i64,
    pub(crate) usefused: bool,
    pub(crate) user_data: Option<Box<dyn Any>>,
    pub(crate) substitutions: u64,
}

impl<V: NVector> ConfigurationRecord<V> {
    pub(crate) fn new(lmm: LinearMultistep, qmax_alloc: usize, nrtfn: usize) -> Self {
        Self {
            lmm,
            qmax: qmax_alloc,
            qmax_alloc,
            mxstep: MXSTEP_DEFAULT,
            mxhnil: MXHNIL_DEFAULT,
            sldet: false,
            hin: 0.0,
            hmin: HMIN_DEFAULT,
            hmax_inv: HMAX_INV_DEFAULT,
            eta: StepChangeFactors::default(),
            maxnef: MXNEF_DEFAULT,
            maxncf: MXNCF_DEFAULT,
            msbp: MSBP_DEFAULT,
            dgmax_lsetup: DGMAX_LSETUP_DEFAULT,
            nlscoef: NLSCOEF_DEFAULT,
            tstop: 0.0,
            tstopset: false,
            tstopinterp: false,
            // Both crossing directions are monitored until told otherwise.
            rootdir: vec![0; nrtfn],
            mxgnull: MXGNULL_DEFAULT,
            constraints: None,
            monitor: None,
            monitor_interval: 0,
            usefused: false,
            user_data: None,
            substitutions: 0,
        }
    }

    #[must_use]
    pub fn method(&self) -> LinearMultistep {
        self.lmm
    }

    #[must_use]
    pub fn max_order(&self) -> usize {
        self.qmax
    }

    /// Order bound fixed when the handle was allocated.
    #[must_use]
    pub fn max_order_alloc(&self) -> usize {
        self.qmax_alloc
    }

    #[must_use]
    pub fn max_num_steps(&self) -> i64 {
        self.mxstep
    }

    #[must_use]
    pub fn max_hnil_warns(&self) -> i32 {
        self.mxhnil
    }

    #[must_use]
    pub fn stab_lim_det(&self) -> bool {
        self.sldet
    }

    #[must_use]
    pub fn init_step(&self) -> f64 {
        self.hin
    }

    #[must_use]
    pub fn min_step(&self) -> f64 {
        self.hmin
    }

    /// Stored reciprocal of the maximum step; 0 means unbounded.
    #[must_use]
    pub fn max_step_inv(&self) -> f64 {
        self.hmax_inv
    }

    /// Maximum step, `f64::INFINITY` when unbounded.
    #[must_use]
    pub fn max_step(&self) -> f64 {
        1.0 / self.hmax_inv
    }

    #[must_use]
    pub fn step_change_factors(&self) -> StepChangeFactors {
        self.eta
    }

    #[must_use]
    pub fn max_err_test_fails(&self) -> u32 {
        self.maxnef
    }

    #[must_use]
    pub fn max_conv_fails(&self) -> u32 {
        self.maxncf
    }

    #[must_use]
    pub fn lsetup_frequency(&self) -> i64 {
        self.msbp
    }

    #[must_use]
    pub fn delta_gamma_max_lsetup(&self) -> f64 {
        self.dgmax_lsetup
    }

    #[must_use]
    pub fn nonlin_conv_coef(&self) -> f64 {
        self.nlscoef
    }

    /// Stop time, if one is set.
    #[must_use]
    pub fn stop_time(&self) -> Option<f64> {
        self.tstopset.then_some(self.tstop)
    }

    #[must_use]
    pub fn interpolate_stop_time(&self) -> bool {
        self.tstopinterp
    }

    #[must_use]
    pub fn root_directions(&self) -> &[i32] {
        &self.rootdir
    }

    /// Warnings allowed for root functions identically zero at the start.
    #[must_use]
    pub fn inactive_root_warnings(&self) -> i32 {
        self.mxgnull
    }

    #[must_use]
    pub fn constraints(&self) -> Option<&V> {
        self.constraints.as_ref()
    }

    #[must_use]
    pub fn has_monitor(&self) -> bool {
        self.monitor.is_some()
    }

    #[must_use]
    pub fn monitor_interval(&self) -> i64 {
        self.monitor_interval
    }

    #[must_use]
    pub fn fused_kernels(&self) -> bool {
        self.usefused
    }

    /// Number of out-of-range inputs replaced by their defaults so far.
    #[must_use]
    pub fn default_substitutions(&self) -> u64 {
        self.substitutions
    }
}

impl<V: fmt::Debug> fmt::Debug for ConfigurationRecord<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationRecord")
            .field("lmm", &self.lmm)
            .field("qmax", &self.qmax)
            .field("qmax_alloc", &self.qmax_alloc)
            .field("mxstep", &self.mxstep)
            .field("hmin", &self.hmin)
            .field("hmax_inv", &self.hmax_inv)
            .field("eta", &self.eta)
            .field("maxnef", &self.maxnef)
            .field("maxncf", &self.maxncf)
            .field("msbp", &self.msbp)
            .field("tstop", &self.tstopset.then_some(self.tstop))
            .field("rootdir", &self.rootdir)
            .field("constraints", &self.constraints)
            .field("monitor", &self.monitor.is_some())
            .field("monitor_interval", &self.monitor_interval)
            .field("usefused", &self.usefused)
            .field("user_data", &self.user_data.is_some())
            .finish_non_exhaustive()
    }
}
