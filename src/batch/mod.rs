//! Monte-Carlo batch evaluation
//!
//! [`BatchEvaluator`] samples `(Q, S_q, t)` triples and evaluates the
//! existence score over them in bulk. Evaluation is per-row isolated: a row
//! whose formula fails is logged and recorded as `None`, and the batch still
//! returns a value for every other row.
//!
//! ```rust
//! use por_engine::batch::{BatchEvaluator, SamplingRanges};
//! use por_engine::Config;
//!
//! let config = Config::builder().seed(7).build()?;
//! let evaluator = BatchEvaluator::new(&config);
//!
//! let results = evaluator.simulate_distribution(
//!     100,
//!     SamplingRanges::default(),
//!     &mut evaluator.uniform(),
//!     None,
//! )?;
//! assert_eq!(results.len(), 100);
//! assert!(results.iter().all(Option::is_some));
//! # Ok::<(), por_engine::Error>(())
//! ```

mod distribution;

pub use distribution::{FnDistribution, ParamDistribution, UniformDistribution};

use crate::scoring::ScoreSample;
use crate::{table, Config, Error, Result};
use arrow::array::{ArrayRef, Float64Array, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Inclusive `(min, max)` bounds of one parameter
pub type ParamRange = (f64, f64);

/// Sampling bounds for the three existence inputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingRanges {
    /// Bounds of `Q`
    pub q: ParamRange,
    /// Bounds of `S_q`
    pub s_q: ParamRange,
    /// Bounds of `t`
    pub t: ParamRange,
}

impl Default for SamplingRanges {
    fn default() -> Self {
        Self {
            q: (0.0, 1.0),
            s_q: (0.0, 1.0),
            t: (0.0, 1.0),
        }
    }
}

impl SamplingRanges {
    /// Reject ranges with `min > max`, a negative `min`, or NaN/infinite bounds
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotNumeric`] for NaN bounds and
    /// [`Error::InvalidRange`] for the other violations
    pub fn validate(&self) -> Result<()> {
        validate_range("Q", self.q)?;
        validate_range("S_q", self.s_q)?;
        validate_range("t", self.t)
    }
}

/// Validate one sampling range
///
/// # Errors
///
/// See [`SamplingRanges::validate`]
pub fn validate_range(name: &str, (min, max): ParamRange) -> Result<()> {
    if min.is_nan() || max.is_nan() {
        return Err(Error::not_numeric(format!("{name} range")));
    }
    let invalid = |reason| Error::InvalidRange {
        name: name.to_string(),
        min,
        max,
        reason,
    };
    if min > max {
        return Err(invalid("min must be <= max"));
    }
    if min < 0.0 {
        return Err(invalid("min cannot be negative"));
    }
    if max.is_infinite() {
        return Err(invalid("bounds must be finite"));
    }
    // uniform sampling scales the width by 1 / (1 - ε)
    if !((max - min) / (1.0 - f64::EPSILON)).is_finite() {
        return Err(invalid("range width overflows"));
    }
    Ok(())
}

/// Seam for the per-row score computed by [`BatchEvaluator::run`]
pub trait ExistenceModel {
    /// Score one sample
    ///
    /// # Errors
    ///
    /// Any error is isolated to the row by the evaluator
    fn existence(&self, sample: &ScoreSample) -> Result<f64>;
}

/// `E = Q × S_q × t`
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardModel;

impl ExistenceModel for StandardModel {
    fn existence(&self, sample: &ScoreSample) -> Result<f64> {
        sample.existence()
    }
}

/// Aggregate view of one batch of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Number of rows
    pub total: usize,
    /// Rows whose evaluation failed
    pub missing: usize,
    /// Rows with `E >= fire_threshold`
    pub fired: usize,
    /// Mean over evaluated rows, `None` if every row is missing
    pub mean: Option<f64>,
    /// Smallest evaluated score
    pub min: Option<f64>,
    /// Largest evaluated score
    pub max: Option<f64>,
}

/// Monte-Carlo evaluator over an [`ExistenceModel`]
#[derive(Debug, Clone)]
pub struct BatchEvaluator<M = StandardModel> {
    model: M,
    config: Config,
}

impl BatchEvaluator<StandardModel> {
    /// Evaluator using the standard existence formula
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_model(StandardModel, config)
    }
}

impl<M: ExistenceModel> BatchEvaluator<M> {
    /// Evaluator over a custom model
    #[must_use]
    pub fn with_model(model: M, config: &Config) -> Self {
        info!(seed = ?config.seed(), "batch evaluator initialized");
        Self {
            model,
            config: config.clone(),
        }
    }

    /// Configuration this evaluator was built with
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Uniform distribution seeded from the configuration
    #[must_use]
    pub fn uniform(&self) -> UniformDistribution {
        UniformDistribution::from_config(&self.config)
    }

    /// Draw `n` parameter triples
    ///
    /// Each dimension is drawn in bulk when the distribution supports it;
    /// otherwise (or if a bulk draw comes back with the wrong length) the
    /// whole table is drawn row by row with scalar draws.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any range is invalid
    pub fn sample_params<D: ParamDistribution + ?Sized>(
        &self,
        n: usize,
        ranges: SamplingRanges,
        distribution: &mut D,
    ) -> Result<Vec<ScoreSample>> {
        ranges.validate()?;

        if let Some(samples) = Self::sample_bulk(n, ranges, distribution) {
            return Ok(samples);
        }

        Ok((0..n)
            .map(|_| {
                ScoreSample::new(
                    distribution.draw(ranges.q.0, ranges.q.1),
                    distribution.draw(ranges.s_q.0, ranges.s_q.1),
                    distribution.draw(ranges.t.0, ranges.t.1),
                )
            })
            .collect())
    }

    fn sample_bulk<D: ParamDistribution + ?Sized>(
        n: usize,
        ranges: SamplingRanges,
        distribution: &mut D,
    ) -> Option<Vec<ScoreSample>> {
        let q = distribution.draw_bulk(ranges.q.0, ranges.q.1, n)?;
        let s_q = distribution.draw_bulk(ranges.s_q.0, ranges.s_q.1, n)?;
        let t = distribution.draw_bulk(ranges.t.0, ranges.t.1, n)?;

        if q.len() != n || s_q.len() != n || t.len() != n {
            warn!(
                expected = n,
                q = q.len(),
                s_q = s_q.len(),
                t = t.len(),
                "bulk draw returned wrong length, falling back to scalar draws"
            );
            return None;
        }

        Some(
            q.into_iter()
                .zip(s_q)
                .zip(t)
                .map(|((q, s_q), t)| ScoreSample::new(q, s_q, t))
                .collect(),
        )
    }

    /// Score every row independently
    ///
    /// The result has one entry per sample; `None` marks a row whose model
    /// call failed. When `output` is given, the table `Q, S_q, t, E` is
    /// written there (format from the extension, see [`table`]).
    ///
    /// # Errors
    ///
    /// Only writing `output` can fail; row failures never abort the batch
    pub fn run(&self, samples: &[ScoreSample], output: Option<&Path>) -> Result<Vec<Option<f64>>> {
        let results: Vec<Option<f64>> = samples
            .iter()
            .enumerate()
            .map(|(row, sample)| match self.model.existence(sample) {
                Ok(e) => Some(e),
                Err(e) => {
                    error!(
                        row,
                        q = sample.q,
                        s_q = sample.s_q,
                        t = sample.t,
                        error = %e,
                        "existence evaluation failed"
                    );
                    None
                }
            })
            .collect();

        if let Some(path) = output {
            table::write_table(path, &results_table(samples, &results)?)?;
            info!(path = %path.display(), rows = samples.len(), "results saved");
        }

        Ok(results)
    }

    /// [`sample_params`](Self::sample_params) followed by [`run`](Self::run)
    ///
    /// # Errors
    ///
    /// Returns error if a range is invalid or `output` cannot be written
    pub fn simulate_distribution<D: ParamDistribution + ?Sized>(
        &self,
        n: usize,
        ranges: SamplingRanges,
        distribution: &mut D,
        output: Option<&Path>,
    ) -> Result<Vec<Option<f64>>> {
        info!(n, output = ?output, "starting simulation");
        let samples = self.sample_params(n, ranges, distribution)?;
        let results = self.run(&samples, output)?;
        info!("simulation completed");
        Ok(results)
    }

    /// Summarize results against the configured fire threshold
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn summarize(&self, results: &[Option<f64>]) -> BatchSummary {
        let scored: Vec<f64> = results.iter().filter_map(|r| *r).collect();
        let threshold = self.config.fire_threshold();

        let mean = if scored.is_empty() {
            None
        } else {
            Some(scored.iter().sum::<f64>() / scored.len() as f64)
        };

        BatchSummary {
            total: results.len(),
            missing: results.len() - scored.len(),
            fired: scored.iter().filter(|&&e| e >= threshold).count(),
            mean,
            min: scored.iter().copied().reduce(f64::min),
            max: scored.iter().copied().reduce(f64::max),
        }
    }
}

/// Flat `Q, S_q, t, E` table; `E` is null for failed rows
///
/// # Errors
///
/// Returns [`Error::LengthMismatch`] if the slices differ in length
pub fn results_table(samples: &[ScoreSample], results: &[Option<f64>]) -> Result<RecordBatch> {
    if samples.len() != results.len() {
        return Err(Error::LengthMismatch {
            expected: samples.len(),
            actual: results.len(),
        });
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("Q", DataType::Float64, false),
        Field::new("S_q", DataType::Float64, false),
        Field::new("t", DataType::Float64, false),
        Field::new("E", DataType::Float64, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from_iter_values(samples.iter().map(|s| s.q))),
        Arc::new(Float64Array::from_iter_values(samples.iter().map(|s| s.s_q))),
        Arc::new(Float64Array::from_iter_values(samples.iter().map(|s| s.t))),
        Arc::new(Float64Array::from(results.to_vec())),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}
