//! Validation and defaulting rules.
//!
//! Two policies apply, chosen per field:
//! - tolerant: an out-of-range input is a request for the field's named
//!   default. The setter succeeds and stores the default.
//! - strict: the input is rejected with `IllegalConfiguration` and the stored
//!   value is left untouched. Used where legality depends on another field or
//!   on solver progress.
//!
//! Strict checks here are pure: they compute the value to store and the
//! caller commits it only on `Ok`, so a multi-field invariant is never left
//! half-applied.

use crate::caps::BuildCapabilities;
use crate::config::{
    DGMAX_LSETUP_DEFAULT, ETA_CF_DEFAULT, ETA_MAX_EF_DEFAULT, ETA_MAX_ES_DEFAULT,
    ETA_MAX_FS_DEFAULT, ETA_MAX_FX_DEFAULT, ETA_MAX_GS_DEFAULT, ETA_MIN_DEFAULT,
    ETA_MIN_EF_DEFAULT, ETA_MIN_FX_DEFAULT, HMAX_INV_DEFAULT, HMIN_DEFAULT, MSBP_DEFAULT,
    MXSTEP_DEFAULT, SMALL_NEF_DEFAULT, SMALL_NST_DEFAULT,
};
use crate::error::{Capability, StepError, StepResult};
use crate::nvector::VectorBackend;

/// Smallest legal constraint magnitude.
pub const CONSTRAINT_NORM_MIN: f64 = 0.5;
/// Largest legal constraint magnitude.
pub const CONSTRAINT_NORM_MAX: f64 = 2.5;

// ---------------------------------------------------------------------------
// Tolerant rules
// ---------------------------------------------------------------------------

/// Outcome of applying a tolerant rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    /// True when the input was replaced by the default.
    pub defaulted: bool,
}

/// Sentinel-to-default rule for one field.
#[derive(Debug, Clone, Copy)]
pub struct TolerantRule<T: 'static> {
    pub field: &'static str,
    pub default: T,
    pub legal: fn(T) -> bool,
}

impl<T: Copy> TolerantRule<T> {
    /// Keep `input` when legal, otherwise substitute the default.
    #[must_use]
    pub fn apply(&self, input: T) -> Resolved<T> {
        if (self.legal)(input) {
            Resolved {
                value: input,
                defaulted: false,
            }
        } else {
            Resolved {
                value: self.default,
                defaulted: true,
            }
        }
    }
}

fn in_unit_closed(x: f64) -> bool {
    (0.0..=1.0).contains(&x)
}

fn in_unit_open(x: f64) -> bool {
    x > 0.0 && x < 1.0
}

fn at_least_one(x: f64) -> bool {
    x >= 1.0
}

fn above_one(x: f64) -> bool {
    x > 1.0
}

fn non_negative_f(x: f64) -> bool {
    x >= 0.0
}

fn non_negative_i64(n: i64) -> bool {
    n >= 0
}

fn non_negative_i32(n: i32) -> bool {
    n >= 0
}

fn non_zero_i64(n: i64) -> bool {
    n != 0
}

pub const ETA_MIN_FX: TolerantRule<f64> = TolerantRule {
    field: "eta_min_fx",
    default: ETA_MIN_FX_DEFAULT,
    legal: in_unit_closed,
};

pub const ETA_MAX_FX: TolerantRule<f64> = TolerantRule {
    field: "eta_max_fx",
    default: ETA_MAX_FX_DEFAULT,
    legal: at_least_one,
};

pub const ETA_MAX_FS: TolerantRule<f64> = TolerantRule {
    field: "eta_max_fs",
    default: ETA_MAX_FS_DEFAULT,
    legal: above_one,
};

pub const ETA_MAX_ES: TolerantRule<f64> = TolerantRule {
    field: "eta_max_es",
    default: ETA_MAX_ES_DEFAULT,
    legal: above_one,
};

pub const SMALL_NST: TolerantRule<i64> = TolerantRule {
    field: "small_nst",
    default: SMALL_NST_DEFAULT,
    legal: non_negative_i64,
};

pub const ETA_MAX_GS: TolerantRule<f64> = TolerantRule {
    field: "eta_max_gs",
    default: ETA_MAX_GS_DEFAULT,
    legal: above_one,
};

pub const ETA_MIN: TolerantRule<f64> = TolerantRule {
    field: "eta_min",
    default: ETA_MIN_DEFAULT,
    legal: in_unit_open,
};

pub const ETA_MIN_EF: TolerantRule<f64> = TolerantRule {
    field: "eta_min_ef",
    default: ETA_MIN_EF_DEFAULT,
    legal: in_unit_open,
};

pub const ETA_MAX_EF: TolerantRule<f64> = TolerantRule {
    field: "eta_max_ef",
    default: ETA_MAX_EF_DEFAULT,
    legal: in_unit_open,
};

pub const SMALL_NEF: TolerantRule<i32> = TolerantRule {
    field: "small_nef",
    default: SMALL_NEF_DEFAULT,
    legal: non_negative_i32,
};

pub const ETA_CF: TolerantRule<f64> = TolerantRule {
    field: "eta_cf",
    default: ETA_CF_DEFAULT,
    legal: in_unit_open,
};

pub const DGMAX_LSETUP: TolerantRule<f64> = TolerantRule {
    field: "dgmax_lsetup",
    default: DGMAX_LSETUP_DEFAULT,
    legal: non_negative_f,
};

/// Zero selects the default; negative values disable the step limit.
pub const MXSTEP: TolerantRule<i64> = TolerantRule {
    field: "mxstep",
    default: MXSTEP_DEFAULT,
    legal: non_zero_i64,
};

// ---------------------------------------------------------------------------
// Strict rules
// ---------------------------------------------------------------------------

/// Order bound must be positive and no larger than the allocation-time bound.
pub fn check_max_order(op: &'static str, maxord: i64, qmax_alloc: usize) -> StepResult<usize> {
    if maxord <= 0 {
        return Err(StepError::illegal(op, "maxord <= 0 illegal"));
    }
    match usize::try_from(maxord) {
        Ok(q) if q <= qmax_alloc => Ok(q),
        _ => Err(StepError::illegal(
            op,
            format!("maxord {maxord} exceeds the allocated order bound {qmax_alloc}"),
        )),
    }
}

/// Resolve a new minimum step against the stored reciprocal maximum.
pub fn check_min_step(op: &'static str, hmin: f64, hmax_inv: f64) -> StepResult<f64> {
    if hmin.is_nan() || hmin < 0.0 {
        return Err(StepError::illegal(op, "hmin < 0 illegal"));
    }
    if hmin == 0.0 {
        return Ok(HMIN_DEFAULT);
    }
    if hmin * hmax_inv > 1.0 {
        return Err(StepError::illegal(op, "inconsistent step size limits: hmin > hmax"));
    }
    Ok(hmin)
}

/// Resolve a new maximum step into the reciprocal that gets stored.
pub fn check_max_step(op: &'static str, hmax: f64, hmin: f64) -> StepResult<f64> {
    if hmax.is_nan() || hmax < 0.0 {
        return Err(StepError::illegal(op, "hmax < 0 illegal"));
    }
    if hmax == 0.0 {
        return Ok(HMAX_INV_DEFAULT);
    }
    let hmax_inv = 1.0 / hmax;
    if hmax_inv * hmin > 1.0 {
        return Err(StepError::illegal(op, "inconsistent step size limits: hmin > hmax"));
    }
    Ok(hmax_inv)
}

/// A stop time behind the current direction of travel can never be reached.
///
/// Only checked once the integrator has taken at least one step.
pub fn check_stop_time(op: &'static str, tstop: f64, nst: u64, tn: f64, h: f64) -> StepResult<()> {
    if nst > 0 && (tstop - tn) * h < 0.0 {
        return Err(StepError::illegal(
            op,
            format!("the value tstop = {tstop} is behind current t = {tn} in the direction of integration"),
        ));
    }
    Ok(())
}

/// Constraint kinds are encoded as 0, ±1, ±2, so the max-norm must lie in
/// `[0.5, 2.5]`.
pub fn check_constraint_norm(op: &'static str, norm: f64) -> StepResult<()> {
    if !(CONSTRAINT_NORM_MIN..=CONSTRAINT_NORM_MAX).contains(&norm) {
        return Err(StepError::illegal(op, format!("illegal values in constraints vector (max norm {norm})")));
    }
    Ok(())
}

/// Linear solver setup frequency: negative rejected, zero selects the default.
pub fn check_lsetup_frequency(op: &'static str, msbp: i64) -> StepResult<i64> {
    match msbp {
        n if n < 0 => Err(StepError::illegal(op, "a negative setup frequency was provided")),
        0 => Ok(MSBP_DEFAULT),
        n => Ok(n),
    }
}

/// Monitor call interval must be non-negative.
pub fn check_monitor_interval(op: &'static str, nst: i64) -> StepResult<i64> {
    if nst < 0 {
        return Err(StepError::illegal(op, "step interval must be >= 0"));
    }
    Ok(nst)
}

/// Fail unless `capability` is part of this build.
pub fn require_capability(
    op: &'static str,
    caps: BuildCapabilities,
    capability: Capability,
) -> StepResult<()> {
    let built = match capability {
        Capability::Monitoring => caps.monitoring,
        Capability::FusedKernels => caps.fused_kernels,
    };
    if built {
        Ok(())
    } else {
        Err(StepError::CapabilityNotBuilt { op, capability })
    }
}

/// Fused kernels need a built capability, a completed allocation, and an
/// accelerator-resident vector backend.
pub fn check_fused_kernels(
    op: &'static str,
    caps: BuildCapabilities,
    alloc_done: bool,
    backend: VectorBackend,
) -> StepResult<()> {
    require_capability(op, caps, Capability::FusedKernels)?;
    if !alloc_done || !backend.is_accelerator_resident() {
        return Err(StepError::illegal(
            op,
            format!("fused kernels not supported for the {} vector backend", backend.as_str()),
        ));
    }
    Ok(())
}
