//! Report formatter.
//!
//! Renders a [`StatisticsSnapshot`] as an aligned table or a single CSV
//! record. Linear solver and projection blocks appear only when those
//! subsystems are attached, and ratio records only when their denominator is
//! positive.

use std::fmt::Write as _;
use std::io::Write;
use std::str::FromStr;

use crate::diag;
use crate::error::{StepError, StepResult};
use crate::handle::IntegratorHandle;
use crate::nvector::NVector;
use crate::stats::StatisticsSnapshot;

/// Width of the label column in table output.
pub const TABLE_LABEL_WIDTH: usize = 30;

/// Output encodings accepted by the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
}

impl OutputFormat {
    /// Decode the integer selector used across the C boundary.
    pub fn from_raw(raw: i32) -> StepResult<Self> {
        match raw {
            0 => Ok(Self::Table),
            1 => Ok(Self::Csv),
            other => Err(StepError::illegal(
                "print_all_stats",
                format!("invalid formatting option {other}"),
            )),
        }
    }

    #[must_use]
    pub const fn as_raw(self) -> i32 {
        match self {
            Self::Table => 0,
            Self::Csv => 1,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "csv" => Ok(Self::Csv),
            _ => Err(StepError::illegal(
                "print_all_stats",
                format!("invalid formatting option {s:?}"),
            )),
        }
    }
}

/// Value of one labeled record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordValue {
    Real(f64),
    Count(u64),
}

/// One labeled scalar in a report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub label: &'static str,
    pub value: RecordValue,
}

impl Record {
    const fn real(label: &'static str, value: f64) -> Self {
        Self {
            label,
            value: RecordValue::Real(value),
        }
    }

    const fn count(label: &'static str, value: u64) -> Self {
        Self {
            label,
            value: RecordValue::Count(value),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(num: u64, den: u64) -> f64 {
    num as f64 / den as f64
}

/// Records in report order.
#[must_use]
pub fn records(s: &StatisticsSnapshot) -> Vec<Record> {
    let mut out = vec![
        Record::real("Current time", s.tcur),
        Record::count("Steps", s.nst),
        Record::count("Error test fails", s.netf),
        Record::count("NLS step fails", s.ncfn),
        Record::real("Initial step size", s.h0u),
        Record::real("Last step size", s.hu),
        Record::real("Current step size", s.hcur),
        Record::count("Last method order", s.qu as u64),
        Record::count("Current method order", s.qcur as u64),
        Record::count("Stab. lim. order reductions", s.nor),
        Record::count("RHS fn evals", s.nfe),
        Record::count("NLS iters", s.nni),
        Record::count("NLS fails", s.nnf),
    ];
    if s.nst > 0 {
        out.push(Record::real("NLS iters per step", ratio(s.nni, s.nst)));
    }
    out.push(Record::count("LS setups", s.nsetups));

    if let Some(ls) = s.linear_solver {
        out.extend([
            Record::count("Jac fn evals", ls.nje),
            Record::count("LS RHS fn evals", ls.nfe_dq),
            Record::count("Prec setup evals", ls.npe),
            Record::count("Prec solves", ls.nps),
            Record::count("LS iters", ls.nli),
            Record::count("LS fails", ls.ncfl),
            Record::count("Jac-times setups", ls.njtsetup),
            Record::count("Jac-times evals", ls.njtimes),
        ]);
        if s.nni > 0 {
            out.extend([
                Record::real("LS iters per NLS iter", ratio(ls.nli, s.nni)),
                Record::real("Jac evals per NLS iter", ratio(ls.nje, s.nni)),
                Record::real("Prec evals per NLS iter", ratio(ls.npe, s.nni)),
            ]);
        }
    }

    out.push(Record::count("Root fn evals", s.nge));

    if let Some(p) = s.projection {
        out.push(Record::count("Projection fn evals", p.nproj));
        out.push(Record::count("Projection fails", p.npfails));
    }
    out
}

/// `%g`-style rendering: plain notation for moderate magnitudes, scientific
/// otherwise.
fn table_real(x: f64) -> String {
    let mag = x.abs();
    if x == 0.0 || !x.is_finite() || (1e-4..1e16).contains(&mag) {
        format!("{x}")
    } else {
        format!("{x:e}")
    }
}

/// Render `s` in `fmt` as a string.
#[must_use]
pub fn render(s: &StatisticsSnapshot, fmt: OutputFormat) -> String {
    let mut out = String::new();
    match fmt {
        OutputFormat::Table => {
            for r in records(s) {
                let value = match r.value {
                    RecordValue::Real(x) => table_real(x),
                    RecordValue::Count(n) => n.to_string(),
                };
                let _ = writeln!(out, "{:<width$}= {value}", r.label, width = TABLE_LABEL_WIDTH);
            }
        }
        OutputFormat::Csv => {
            for (i, r) in records(s).into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = match r.value {
                    RecordValue::Real(x) => write!(out, "{},{x:e}", r.label),
                    RecordValue::Count(n) => write!(out, "{},{n}", r.label),
                };
            }
            out.push('\n');
        }
    }
    out
}

/// Write `s` to `sink` in `fmt`.
pub fn print_all_stats<W: Write + ?Sized>(
    s: &StatisticsSnapshot,
    sink: &mut W,
    fmt: OutputFormat,
) -> StepResult<()> {
    sink.write_all(render(s, fmt).as_bytes())?;
    sink.flush()?;
    Ok(())
}

impl<V: NVector> IntegratorHandle<V> {
    /// Write the full statistics report for this handle.
    pub fn print_all_stats<W: Write + ?Sized>(&self, sink: &mut W, fmt: OutputFormat) -> StepResult<()> {
        diag::check("print_all_stats", print_all_stats(&self.snapshot(), sink, fmt))
    }
}
