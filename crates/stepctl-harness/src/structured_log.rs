//! Structured JSONL diagnostics log.
//!
//! Provides:
//! - [`LogEntry`]: one JSONL record with required and optional fields.
//! - [`LogEmitter`]: writes records to a file or an in-memory buffer.
//! - [`install_diagnostic_logger`]: routes every core diagnostic into an
//!   emitter.
//! - [`validate_log_line`]: checks a JSONL line against the schema.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use stepctl_core::diag::{self, Diagnostic, DiagnosticHook, Severity};

/// Severity level for log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<Severity> for LogLevel {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Warning => Self::Warn,
            Severity::Error => Self::Error,
        }
    }
}

/// Canonical structured log entry.
///
/// Required fields: `timestamp`, `trace_id`, `level`, `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Numeric return flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            operation: None,
            status: None,
            status_name: None,
            message: None,
            details: None,
        }
    }

    /// Entry describing a core diagnostic.
    #[must_use]
    pub fn from_diagnostic(trace_id: impl Into<String>, d: &Diagnostic) -> Self {
        Self::new(trace_id, d.severity.into(), "diagnostic")
            .with_operation(d.operation)
            .with_status(d.flag.code(), d.flag.name())
            .with_message(d.message.clone())
    }

    #[must_use]
    pub fn with_operation(mut self, op: impl Into<String>) -> Self {
        self.operation = Some(op.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, code: i32, name: impl Into<String>) -> Self {
        self.status = Some(code);
        self.status_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Serialize to a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

enum Sink {
    Writer(Box<dyn Write + Send>),
    Buffer(Vec<u8>),
}

/// Writes JSONL entries with sequential trace ids.
pub struct LogEmitter {
    sink: Sink,
    seq: u64,
    run_id: String,
}

impl LogEmitter {
    pub fn to_file(path: &Path, run_id: &str) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self {
            sink: Sink::Writer(Box::new(std::io::BufWriter::new(file))),
            seq: 0,
            run_id: run_id.to_string(),
        })
    }

    /// Emitter that keeps its output in memory (see [`LogEmitter::contents`]).
    #[must_use]
    pub fn to_buffer(run_id: &str) -> Self {
        Self {
            sink: Sink::Buffer(Vec::new()),
            seq: 0,
            run_id: run_id.to_string(),
        }
    }

    fn next_trace_id(&mut self) -> String {
        self.seq += 1;
        format!("stepctl::{}::{:03}", self.run_id, self.seq)
    }

    fn write_line(&mut self, entry: &LogEntry) -> std::io::Result<()> {
        let line = entry.to_jsonl().map_err(std::io::Error::other)?;
        match &mut self.sink {
            Sink::Writer(w) => writeln!(w, "{line}"),
            Sink::Buffer(b) => writeln!(b, "{line}"),
        }
    }

    /// Emit a bare event.
    pub fn emit(&mut self, level: LogLevel, event: &str) -> std::io::Result<LogEntry> {
        let entry = LogEntry::new(self.next_trace_id(), level, event);
        self.write_line(&entry)?;
        Ok(entry)
    }

    /// Emit `entry`, assigning a trace id if it has none.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> std::io::Result<()> {
        if entry.trace_id.is_empty() {
            entry.trace_id = self.next_trace_id();
        }
        self.write_line(&entry)
    }

    pub fn emit_diagnostic(&mut self, d: &Diagnostic) -> std::io::Result<()> {
        let entry = LogEntry::from_diagnostic(self.next_trace_id(), d);
        self.write_line(&entry)
    }

    /// Number of entries emitted so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.seq
    }

    /// Buffered output, empty for file-backed emitters.
    #[must_use]
    pub fn contents(&self) -> String {
        match &self.sink {
            Sink::Buffer(b) => String::from_utf8_lossy(b).into_owned(),
            Sink::Writer(_) => String::new(),
        }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.sink {
            Sink::Writer(w) => w.flush(),
            Sink::Buffer(_) => Ok(()),
        }
    }
}

/// Route core diagnostics into `emitter`, returning the previous hook.
///
/// Write failures are dropped; the failing operation still returns its
/// status to the caller.
pub fn install_diagnostic_logger(emitter: Arc<Mutex<LogEmitter>>) -> Option<DiagnosticHook> {
    diag::set_diagnostic_hook(Box::new(move |d| {
        let _ = emitter.lock().emit_diagnostic(d);
    }))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validation error for a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogValidationError {
    pub line_number: usize,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for LogValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: field '{}': {}", self.line_number, self.field, self.message)
    }
}

/// Validate one JSONL line: required fields present, and a diagnostic event
/// carries its operation and status.
pub fn validate_log_line(line: &str, line_number: usize) -> Result<LogEntry, Vec<LogValidationError>> {
    let err = |field: &str, message: String| LogValidationError {
        line_number,
        field: field.to_string(),
        message,
    };

    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| vec![err("<json>", format!("invalid JSON: {e}"))])?;
    let Some(obj) = value.as_object() else {
        return Err(vec![err("<root>", "expected JSON object".to_string())]);
    };

    let mut errors: Vec<LogValidationError> = ["timestamp", "trace_id", "level", "event"]
        .into_iter()
        .filter(|f| !obj.contains_key(*f))
        .map(|f| err(f, "required field missing".to_string()))
        .collect();

    if obj.get("event").and_then(|v| v.as_str()) == Some("diagnostic") {
        for f in ["operation", "status", "status_name"] {
            if !obj.contains_key(f) {
                errors.push(err(f, "required for diagnostic events".to_string()));
            }
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value(value).map_err(|e| vec![err("<schema>", e.to_string())])
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_utc() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    let (y, m, d) = civil_from_days(secs / 86_400);
    format!(
        "{y:04}-{m:02}-{d:02}T{:02}:{:02}:{:02}.{:03}Z",
        (secs % 86_400) / 3600,
        (secs % 3600) / 60,
        secs % 60,
        duration.subsec_millis(),
    )
}

/// Gregorian date for a count of days since 1970-01-01.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z % 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = yoe + era * 400 + u64::from(m <= 2);
    (y, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepctl_core::ReturnFlag;

    #[test]
    fn civil_dates() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
        assert_eq!(civil_from_days(19_723), (2024, 1, 1));
    }

    #[test]
    fn diagnostic_entry_fields() {
        let d = Diagnostic {
            severity: Severity::Error,
            flag: ReturnFlag::IllInput,
            operation: "set_max_ord",
            message: "set_max_ord: maxord <= 0 illegal".to_string(),
        };
        let entry = LogEntry::from_diagnostic("t-1", &d);
        let line = entry.to_jsonl().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["level"], "error");
        assert_eq!(parsed["event"], "diagnostic");
        assert_eq!(parsed["operation"], "set_max_ord");
        assert_eq!(parsed["status"], -22);
        assert_eq!(parsed["status_name"], "ILL_INPUT");
        assert!(parsed.get("details").is_none());
        assert!(validate_log_line(&line, 1).is_ok());
    }

    #[test]
    fn emitter_numbers_trace_ids() {
        let mut e = LogEmitter::to_buffer("run-1");
        e.emit(LogLevel::Info, "start").unwrap();
        e.emit(LogLevel::Info, "end").unwrap();
        let text = e.contents();
        let ids: Vec<String> = text
            .lines()
            .map(|l| validate_log_line(l, 0).unwrap().trace_id)
            .collect();
        assert_eq!(ids, vec!["stepctl::run-1::001", "stepctl::run-1::002"]);
        assert_eq!(e.count(), 2);
    }

    #[test]
    fn validation_reports_missing_fields() {
        let errs = validate_log_line(r#"{"level":"info","event":"diagnostic"}"#, 3).unwrap_err();
        let fields: Vec<&str> = errs.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"timestamp"));
        assert!(fields.contains(&"trace_id"));
        assert!(fields.contains(&"status"));
        assert!(errs.iter().all(|e| e.line_number == 3));
        assert!(validate_log_line("not json", 1).is_err());
    }
}
