//! Diagnostics aggregation over a directory of JSON log files
//!
//! Each `*.json` file holds one object. `status` and `latency_ms` feed the
//! metrics; any other key is carried but ignored. A file that cannot be read,
//! does not parse, or is not an object is skipped with a warning and does not
//! count toward any metric.
//!
//! Toyota Way Principles:
//! - Jidoka: one bad log file never stops the scan
//! - Genchi Genbutsu: metrics are recomputed from the files on every run

use crate::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Report file written by [`run`]
pub const REPORT_FILE_NAME: &str = "por_eval_result.md";

/// Status value counted as a success
pub const OK_STATUS: &str = "ok";

/// One diagnostic log object
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticEntry {
    fields: Map<String, Value>,
}

impl DiagnosticEntry {
    /// Wrap a parsed JSON object
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// `status` when it is a string
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.fields.get("status").and_then(Value::as_str)
    }

    /// `latency_ms` when it is a number
    #[must_use]
    pub fn latency_ms(&self) -> Option<f64> {
        self.fields.get("latency_ms").and_then(Value::as_f64)
    }

    /// Whether this entry counts as an error (`status != "ok"`)
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status() != Some(OK_STATUS)
    }

    /// All fields of the object
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Aggregate quality metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    /// Entries loaded
    pub total_entries: usize,
    /// Entries whose status is not `ok`
    pub error_count: usize,
    /// Mean `latency_ms` over entries that have one
    pub average_latency_ms: Option<f64>,
    /// `(total - errors) / total`
    pub success_rate: Option<f64>,
}

/// Load every `*.json` object in `dir`, in path order
///
/// # Errors
///
/// Returns error if `dir` itself cannot be listed
pub fn load<P: AsRef<Path>>(dir: P) -> Result<Vec<DiagnosticEntry>> {
    let dir = dir.as_ref();
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut entries = Vec::with_capacity(paths.len());
    for path in &paths {
        match load_entry(path) {
            Ok(entry) => entries.push(entry),
            Err(reason) => warn!(path = %path.display(), %reason, "skipping diagnostic log"),
        }
    }

    info!(
        dir = %dir.display(),
        files = paths.len(),
        loaded = entries.len(),
        "diagnostic logs loaded"
    );
    Ok(entries)
}

fn load_entry(path: &Path) -> std::result::Result<DiagnosticEntry, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("unreadable: {e}"))?;
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(fields)) => Ok(DiagnosticEntry::new(fields)),
        Ok(_) => Err("not a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

/// Compute metrics over `entries`
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn analyze(entries: &[DiagnosticEntry]) -> Metrics {
    let total_entries = entries.len();
    let error_count = entries.iter().filter(|e| e.is_error()).count();

    let latencies: Vec<f64> = entries.iter().filter_map(DiagnosticEntry::latency_ms).collect();
    let average_latency_ms = if latencies.is_empty() {
        None
    } else {
        Some(latencies.iter().sum::<f64>() / latencies.len() as f64)
    };

    let success_rate = if total_entries == 0 {
        None
    } else {
        Some((total_entries - error_count) as f64 / total_entries as f64)
    };

    Metrics {
        total_entries,
        error_count,
        average_latency_ms,
        success_rate,
    }
}

/// Render `metrics` as a Markdown report (no trailing newline)
#[must_use]
pub fn report(metrics: &Metrics) -> String {
    let average = metrics
        .average_latency_ms
        .map_or_else(|| "N/A".to_string(), |avg| format!("{avg:.2} ms"));
    let success = metrics
        .success_rate
        .map_or_else(|| "N/A".to_string(), |rate| format!("{:.1}%", rate * 100.0));

    [
        "# PoR Diagnostic Report".to_string(),
        format!("- Total entries: {}", metrics.total_entries),
        format!("- Error count: {}", metrics.error_count),
        format!("- Average latency: {average}"),
        format!("- Success rate: {success}"),
    ]
    .join("\n")
}

/// Load `log_dir`, analyze it and write [`REPORT_FILE_NAME`] into `out_dir`
///
/// # Errors
///
/// Returns error if `log_dir` cannot be listed or the report cannot be written
pub fn run<L: AsRef<Path>, O: AsRef<Path>>(log_dir: L, out_dir: O) -> Result<Metrics> {
    let entries = load(log_dir)?;
    let metrics = analyze(&entries);

    fs::create_dir_all(out_dir.as_ref())?;
    let report_path = out_dir.as_ref().join(REPORT_FILE_NAME);
    fs::write(&report_path, report(&metrics))?;

    info!(
        path = %report_path.display(),
        total = metrics.total_entries,
        errors = metrics.error_count,
        "diagnostic report written"
    );
    Ok(metrics)
}
