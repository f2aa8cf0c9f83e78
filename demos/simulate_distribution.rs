//! Monte-Carlo Simulation of the Existence Score
//!
//! Samples 10,000 `(Q, S_q, t)` triples with a fixed seed, scores them, writes
//! the `Q, S_q, t, E` table to CSV and prints a summary.
//!
//! Usage: cargo run --example simulate_distribution [output.csv]

use anyhow::Context;
use por_engine::batch::{BatchEvaluator, SamplingRanges};
use por_engine::telemetry::init_tracing;
use por_engine::Config;
use std::path::PathBuf;
use tracing::Level;

fn main() -> anyhow::Result<()> {
    init_tracing(false, Level::INFO);

    let output = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("por_simulation_results.csv"), PathBuf::from);

    println!("=== PoR Engine Monte-Carlo Simulation ===\n");

    let config = Config::builder().seed(42).build()?;
    let evaluator = BatchEvaluator::new(&config);

    let ranges = SamplingRanges {
        q: (0.0, 1.0),
        s_q: (0.0, 1.0),
        t: (0.5, 1.5),
    };
    println!("Ranges: Q {:?}, S_q {:?}, t {:?}", ranges.q, ranges.s_q, ranges.t);

    let results = evaluator
        .simulate_distribution(10_000, ranges, &mut evaluator.uniform(), Some(output.as_path()))
        .with_context(|| format!("simulation into {}", output.display()))?;

    let summary = evaluator.summarize(&results);
    println!("\nSamples:  {}", summary.total);
    println!("Missing:  {}", summary.missing);
    println!("Fired:    {} (E >= {})", summary.fired, config.fire_threshold());
    if let (Some(mean), Some(min), Some(max)) = (summary.mean, summary.min, summary.max) {
        println!("E mean:   {mean:.4}");
        println!("E range:  [{min:.4}, {max:.4}]");
    }
    println!("\nResults written to {}", output.display());

    Ok(())
}
