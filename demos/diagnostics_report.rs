//! Diagnostics Report over a Log Directory
//!
//! Aggregates every `*.json` log in a directory and writes
//! `por_eval_result.md`. Without arguments, a small sample directory is
//! generated first (including one malformed file that is skipped).
//!
//! Usage: cargo run --example diagnostics_report [log_dir] [out_dir]

use anyhow::Context;
use por_engine::diagnostics::{self, REPORT_FILE_NAME};
use por_engine::telemetry::init_tracing;
use std::path::{Path, PathBuf};
use tracing::Level;

fn write_sample_logs(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    let samples = [
        ("001.json", r#"{"status":"ok","latency_ms":42,"model":"demo"}"#),
        ("002.json", r#"{"status":"ok","latency_ms":58}"#),
        ("003.json", r#"{"status":"error","latency_ms":150,"reason":"timeout"}"#),
        ("004.json", r#"{"status":"ok"}"#),
        ("005.json", "{ truncated"),
    ];
    for (name, body) in samples {
        std::fs::write(dir.join(name), body)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing(false, Level::INFO);

    let mut args = std::env::args().skip(1);
    let log_dir = match args.next() {
        Some(dir) => PathBuf::from(dir),
        None => {
            let dir = std::env::temp_dir().join("por_diagnostics_demo");
            write_sample_logs(&dir)?;
            dir
        }
    };
    let out_dir = args.next().map_or_else(|| log_dir.join("report"), PathBuf::from);

    let metrics = diagnostics::run(&log_dir, &out_dir)
        .with_context(|| format!("aggregating {}", log_dir.display()))?;

    let report_path = out_dir.join(REPORT_FILE_NAME);
    println!("{}\n", std::fs::read_to_string(&report_path)?);
    println!("Metrics (JSON): {}", serde_json::to_string(&metrics)?);
    println!("Report written to {}", report_path.display());

    Ok(())
}
