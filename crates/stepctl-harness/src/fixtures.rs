//! Statistics snapshot fixtures.
//!
//! A fixture is a JSON record of every counter the report formatter reads,
//! so reports can be rendered and compared without a live integrator.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stepctl_core::{LinearSolverStats, ProjectionStats, StatisticsSnapshot};

use crate::error::{HarnessError, HarnessResult};

/// Schema version written by this crate.
pub const FIXTURE_VERSION: &str = "stepctl-snapshot-v1";

/// Linear solver counters as stored in a fixture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearSolverFixture {
    pub nje: u64,
    pub nfe_dq: u64,
    pub npe: u64,
    pub nps: u64,
    pub nli: u64,
    pub ncfl: u64,
    pub njtsetup: u64,
    pub njtimes: u64,
}

/// Projection counters as stored in a fixture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionFixture {
    pub nproj: u64,
    pub npfails: u64,
}

/// Serialized statistics snapshot.
///
/// Missing counters default to zero; missing subsystem blocks mean the
/// subsystem was not attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFixture {
    pub version: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub tcur: f64,
    #[serde(default)]
    pub nst: u64,
    #[serde(default)]
    pub netf: u64,
    #[serde(default)]
    pub ncfn: u64,
    #[serde(default)]
    pub h0u: f64,
    #[serde(default)]
    pub hu: f64,
    #[serde(default)]
    pub hcur: f64,
    #[serde(default)]
    pub qu: usize,
    #[serde(default)]
    pub qcur: usize,
    #[serde(default)]
    pub nor: u64,
    #[serde(default)]
    pub nfe: u64,
    #[serde(default)]
    pub nni: u64,
    #[serde(default)]
    pub nnf: u64,
    #[serde(default)]
    pub nsetups: u64,
    #[serde(default)]
    pub nge: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linear_solver: Option<LinearSolverFixture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<ProjectionFixture>,
}

impl SnapshotFixture {
    /// Record `snapshot` under `label`.
    #[must_use]
    pub fn capture(label: impl Into<String>, s: &StatisticsSnapshot) -> Self {
        Self {
            version: FIXTURE_VERSION.to_string(),
            label: label.into(),
            tcur: s.tcur,
            nst: s.nst,
            netf: s.netf,
            ncfn: s.ncfn,
            h0u: s.h0u,
            hu: s.hu,
            hcur: s.hcur,
            qu: s.qu,
            qcur: s.qcur,
            nor: s.nor,
            nfe: s.nfe,
            nni: s.nni,
            nnf: s.nnf,
            nsetups: s.nsetups,
            nge: s.nge,
            linear_solver: s.linear_solver.map(|ls| LinearSolverFixture {
                nje: ls.nje,
                nfe_dq: ls.nfe_dq,
                npe: ls.npe,
                nps: ls.nps,
                nli: ls.nli,
                ncfl: ls.ncfl,
                njtsetup: ls.njtsetup,
                njtimes: ls.njtimes,
            }),
            projection: s.projection.map(|p| ProjectionFixture {
                nproj: p.nproj,
                npfails: p.npfails,
            }),
        }
    }

    /// Rebuild the snapshot this fixture describes.
    #[must_use]
    pub fn to_snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            tcur: self.tcur,
            nst: self.nst,
            netf: self.netf,
            ncfn: self.ncfn,
            h0u: self.h0u,
            hu: self.hu,
            hcur: self.hcur,
            qu: self.qu,
            qcur: self.qcur,
            nor: self.nor,
            nfe: self.nfe,
            nni: self.nni,
            nnf: self.nnf,
            nsetups: self.nsetups,
            nge: self.nge,
            linear_solver: self.linear_solver.map(|ls| LinearSolverStats {
                nje: ls.nje,
                nfe_dq: ls.nfe_dq,
                npe: ls.npe,
                nps: ls.nps,
                nli: ls.nli,
                ncfl: ls.ncfl,
                njtsetup: ls.njtsetup,
                njtimes: ls.njtimes,
                ..LinearSolverStats::default()
            }),
            projection: self.projection.map(|p| ProjectionStats {
                nproj: p.nproj,
                npfails: p.npfails,
            }),
            ..StatisticsSnapshot::default()
        }
    }

    /// Parse and version-check a fixture.
    pub fn from_json(json: &str) -> HarnessResult<Self> {
        let fixture: Self = serde_json::from_str(json)?;
        if fixture.version != FIXTURE_VERSION {
            return Err(HarnessError::FixtureVersion {
                found: fixture.version,
                expected: FIXTURE_VERSION,
            });
        }
        Ok(fixture)
    }

    pub fn to_json(&self) -> HarnessResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_fixture_defaults_to_zero() {
        let json = r#"{"version":"stepctl-snapshot-v1","nst":4,"nni":9}"#;
        let f = SnapshotFixture::from_json(json).unwrap();
        let s = f.to_snapshot();
        assert_eq!(s.nst, 4);
        assert_eq!(s.nni, 9);
        assert_eq!(s.nfe, 0);
        assert!(s.linear_solver.is_none());
        assert!(s.projection.is_none());
    }

    #[test]
    fn wrong_version_rejected() {
        let err = SnapshotFixture::from_json(r#"{"version":"v0"}"#).unwrap_err();
        assert!(matches!(err, HarnessError::FixtureVersion { .. }));
    }

    #[test]
    fn capture_preserves_subsystem_presence() {
        let s = StatisticsSnapshot {
            nst: 3,
            projection: Some(ProjectionStats {
                nproj: 2,
                npfails: 1,
            }),
            ..StatisticsSnapshot::default()
        };
        let f = SnapshotFixture::capture("proj", &s);
        let back = SnapshotFixture::from_json(&f.to_json().unwrap())
            .unwrap()
            .to_snapshot();
        assert_eq!(back.projection, s.projection);
        assert!(back.linear_solver.is_none());
        assert_eq!(back.nst, 3);
    }
}
