//! # PoR Engine: Point-of-Resonance Scoring and Evaluation
//!
//! **Version**: 0.1.0
//!
//! PoR Engine scores "resonance" events from three inputs (question pressure
//! `Q`, semantic density `S_q`, critical time `t`), runs those scores in bulk
//! over sampled or tabular inputs, persists dialogue turns to rotating Parquet
//! logs, and aggregates diagnostic JSON logs into a Markdown report.
//!
//! ## Components
//!
//! - [`scoring`]: pure formulas (`E = Q × S_q × t`, collapse frequency, ...)
//! - [`batch`]: Monte-Carlo sampling and per-row isolated evaluation
//! - [`evaluation`] / [`detector`]: CSV or Parquet tables in, scored tables out
//! - [`store`]: append-only turn records and a buffered JSONL result log
//! - [`diagnostics`]: metrics and report over a directory of JSON logs
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Jidoka**: one failing row or log file never voids a batch
//! - **Poka-Yoke safety**: ranges and domains are validated before any work
//! - **Genchi Genbutsu**: rotation decisions use on-disk sizes
//!
//! ## Example Usage
//!
//! ```rust
//! use por_engine::batch::{BatchEvaluator, SamplingRanges};
//! use por_engine::scoring;
//! use por_engine::Config;
//!
//! assert_eq!(scoring::existence(2.0, 3.0, 4.0)?, 24.0);
//!
//! let config = Config::builder().seed(7).build()?;
//! let evaluator = BatchEvaluator::new(&config);
//! let mut dist = evaluator.uniform();
//! let results =
//!     evaluator.simulate_distribution(1_000, SamplingRanges::default(), &mut dist, None)?;
//!
//! assert_eq!(results.len(), 1_000);
//! println!("{:?}", evaluator.summarize(&results));
//! # Ok::<(), por_engine::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod batch;
pub mod config;
pub mod detector;
pub mod diagnostics;
pub mod error;
pub mod evaluation;
pub mod scoring;
pub mod store;
pub mod table;
pub mod telemetry;

pub use config::Config;
pub use error::{Error, Result};
