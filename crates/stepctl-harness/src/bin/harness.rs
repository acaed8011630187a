//! CLI entrypoint for the stepctl harness.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use stepctl_core::report::{self, OutputFormat};
use stepctl_core::{BuildCapabilities, LinearMultistep, diag, return_flag_name};
use stepctl_harness::structured_log::install_diagnostic_logger;
use stepctl_harness::{
    HarnessError, LogEmitter, LogEntry, LogLevel, SimulationConfig, SnapshotFixture, simulate,
};

/// Tooling for the stepctl integrator configuration layer.
#[derive(Debug, Parser)]
#[command(name = "stepctl-harness")]
#[command(about = "Render statistics reports, translate return flags, and run simulated integrations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a statistics report from a snapshot fixture.
    Report {
        /// Snapshot fixture JSON.
        #[arg(long)]
        snapshot: PathBuf,
        /// Output encoding (`table` or `csv`).
        #[arg(long, default_value = "table")]
        format: String,
        /// Write the report here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the name of each return flag code.
    FlagName {
        #[arg(required = true, allow_negative_numbers = true)]
        codes: Vec<i64>,
    },
    /// Drive a simulated integrator and print its statistics report.
    Simulate {
        #[arg(long, default_value_t = 10)]
        steps: u64,
        /// Linear multistep family (`adams` or `bdf`).
        #[arg(long, default_value = "bdf")]
        method: String,
        #[arg(long, default_value_t = 5)]
        max_order: i64,
        #[arg(long, default_value_t = 0.0)]
        hmin: f64,
        /// Maximum step; 0 leaves it unbounded.
        #[arg(long, default_value_t = 0.0)]
        hmax: f64,
        /// Output encoding (`table` or `csv`).
        #[arg(long, default_value = "table")]
        format: String,
        /// Build capabilities (e.g. `monitoring,fused`, `all`, `none`).
        #[arg(long)]
        caps: Option<String>,
        /// Call the monitor every this many steps.
        #[arg(long, default_value_t = 0)]
        monitor: i64,
        /// JSONL diagnostics log.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Also save the final snapshot as a fixture.
        #[arg(long)]
        fixture_out: Option<PathBuf>,
    },
}

fn parse_method(s: &str) -> Result<LinearMultistep, HarnessError> {
    match s.to_ascii_lowercase().as_str() {
        "adams" => Ok(LinearMultistep::Adams),
        "bdf" => Ok(LinearMultistep::Bdf),
        other => Err(HarnessError::InvalidArgument(format!("unknown method {other:?}"))),
    }
}

fn write_out(text: &str, output: Option<&PathBuf>) -> std::io::Result<()> {
    match output {
        Some(path) => std::fs::write(path, text),
        None => std::io::stdout().write_all(text.as_bytes()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Report {
            snapshot,
            format,
            output,
        } => {
            let fmt: OutputFormat = format.parse()?;
            let fixture = SnapshotFixture::from_file(&snapshot)?;
            let text = report::render(&fixture.to_snapshot(), fmt);
            write_out(&text, output.as_ref())?;
            if let Some(path) = output {
                eprintln!("Wrote {} report to {}", fmt.as_str(), path.display());
            }
        }
        Command::FlagName { codes } => {
            for code in codes {
                println!("{code}\t{}", return_flag_name(code));
            }
        }
        Command::Simulate {
            steps,
            method,
            max_order,
            hmin,
            hmax,
            format,
            caps,
            monitor,
            log,
            fixture_out,
        } => {
            let fmt: OutputFormat = format.parse()?;
            let cfg = SimulationConfig {
                method: parse_method(&method)?,
                steps,
                max_order,
                hmin,
                hmax,
                capabilities: caps
                    .as_deref()
                    .map_or_else(BuildCapabilities::compiled, BuildCapabilities::from_list_loose),
                monitor_interval: monitor,
                ..SimulationConfig::default()
            };

            let emitter = match &log {
                Some(path) => {
                    let emitter = Arc::new(Mutex::new(LogEmitter::to_file(path, "simulate")?));
                    install_diagnostic_logger(Arc::clone(&emitter));
                    emitter.lock().emit_entry(
                        LogEntry::new("", LogLevel::Info, "simulate_start").with_details(
                            serde_json::json!({
                                "steps": steps,
                                "method": method,
                                "max_order": max_order,
                                "hmin": hmin,
                                "hmax": hmax,
                            }),
                        ),
                    )?;
                    Some(emitter)
                }
                None => None,
            };

            let result = simulate::run(&cfg);

            if let Some(emitter) = &emitter {
                diag::clear_diagnostic_hook();
                let mut e = emitter.lock();
                let entry = match &result {
                    Ok((_, outcome)) => LogEntry::new("", LogLevel::Info, "simulate_end").with_details(
                        serde_json::json!({
                            "nst": outcome.stats.nsteps,
                            "tcur": outcome.stats.tcur,
                            "monitor_calls": outcome.monitored.len(),
                        }),
                    ),
                    Err(err) => LogEntry::new("", LogLevel::Error, "simulate_end").with_message(err.to_string()),
                };
                e.emit_entry(entry)?;
                e.flush()?;
            }

            let (_, outcome) = result?;
            print!("{}", report::render(&outcome.snapshot, fmt));
            if let Some(path) = fixture_out {
                let fixture = SnapshotFixture::capture("simulate", &outcome.snapshot);
                std::fs::write(&path, fixture.to_json()?)?;
                eprintln!("Wrote snapshot fixture to {}", path.display());
            }
        }
    }

    Ok(())
}
