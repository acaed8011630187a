//! Integration test: simulated runs, fixtures, and the diagnostics log.
//!
//! Run: cargo test -p stepctl-harness --test simulate_flow_test

use std::sync::{Arc, Mutex as StdMutex};

use parking_lot::Mutex;
use stepctl_core::diag;
use stepctl_core::report::{self, OutputFormat};
use stepctl_core::{BuildCapabilities, LinearMultistep};
use stepctl_harness::structured_log::{install_diagnostic_logger, validate_log_line};
use stepctl_harness::{HarnessError, LogEmitter, SimulationConfig, SnapshotFixture, simulate};

/// The diagnostic hook is process-wide; tests that emit diagnostics hold this.
static HOOK_GUARD: StdMutex<()> = StdMutex::new(());

#[test]
fn adams_run_respects_order_cap() {
    let cfg = SimulationConfig {
        method: LinearMultistep::Adams,
        steps: 25,
        max_order: 4,
        hmax: 0.1,
        ..SimulationConfig::default()
    };
    let (h, outcome) = simulate::run(&cfg).unwrap();
    assert_eq!(outcome.stats.nsteps, 25);
    assert!(outcome.stats.qlast <= 4 && outcome.stats.qcur <= 4);
    assert!(outcome.stats.hlast <= 0.1);
    assert_eq!(outcome.snapshot, h.snapshot());
    assert!(outcome.monitored.is_empty());
}

#[test]
fn fixture_renders_same_report_as_live_snapshot() {
    let (_, outcome) = simulate::run(&SimulationConfig::default()).unwrap();
    let fixture = SnapshotFixture::capture("default", &outcome.snapshot);
    let reloaded = SnapshotFixture::from_json(&fixture.to_json().unwrap()).unwrap();

    let live = report::render(&outcome.snapshot, OutputFormat::Table);
    let replayed = report::render(&reloaded.to_snapshot(), OutputFormat::Table);
    assert_eq!(live, replayed);
    assert!(live.contains("Jac fn evals"));
}

#[test]
fn fixture_file_round_trip_through_disk() {
    let (_, outcome) = simulate::run(&SimulationConfig {
        steps: 5,
        ..SimulationConfig::default()
    })
    .unwrap();
    let path = std::env::temp_dir().join(format!("stepctl-fixture-{}.json", std::process::id()));
    let fixture = SnapshotFixture::capture("disk", &outcome.snapshot);
    std::fs::write(&path, fixture.to_json().unwrap()).unwrap();
    let loaded = SnapshotFixture::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, fixture);
    assert_eq!(loaded.to_snapshot().nst, 5);
}

#[test]
fn missing_fixture_is_io_error() {
    let err = SnapshotFixture::from_file(std::path::Path::new("/nonexistent/stepctl.json")).unwrap_err();
    assert!(matches!(err, HarnessError::Io(_)));
}

#[test]
fn monitor_without_capability_is_rejected() {
    let _g = HOOK_GUARD.lock().unwrap_or_else(|e| e.into_inner());
    let cfg = SimulationConfig {
        monitor_interval: 2,
        capabilities: BuildCapabilities::NONE,
        ..SimulationConfig::default()
    };
    assert!(matches!(simulate::run(&cfg), Err(HarnessError::Step(_))));
}

#[test]
fn rejected_configuration_is_logged() {
    let _g = HOOK_GUARD.lock().unwrap_or_else(|e| e.into_inner());
    let emitter = Arc::new(Mutex::new(LogEmitter::to_buffer("flow")));
    install_diagnostic_logger(Arc::clone(&emitter));

    let cfg = SimulationConfig {
        max_order: 0,
        ..SimulationConfig::default()
    };
    let result = simulate::run(&cfg);
    diag::clear_diagnostic_hook();
    assert!(result.is_err());

    let text = emitter.lock().contents();
    let entries: Vec<_> = text
        .lines()
        .enumerate()
        .map(|(i, l)| validate_log_line(l, i + 1).unwrap())
        .collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event, "diagnostic");
    assert_eq!(entries[0].operation.as_deref(), Some("set_max_ord"));
    assert_eq!(entries[0].status_name.as_deref(), Some("ILL_INPUT"));
    assert_eq!(entries[0].trace_id, "stepctl::flow::001");
}

#[test]
fn csv_report_is_single_line() {
    let (_, outcome) = simulate::run(&SimulationConfig::default()).unwrap();
    let csv = report::render(&outcome.snapshot, OutputFormat::Csv);
    assert_eq!(csv.lines().count(), 1);
    assert!(csv.ends_with('\n'));
    assert!(csv.starts_with("Current time,"));
}
