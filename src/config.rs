//! Engine configuration
//!
//! A single [`Config`] is built once by the caller and passed by reference to
//! every component that needs a threshold, a limit or a seed. There is no
//! process-wide state: dropping the value is the whole teardown.
//!
//! ```rust
//! use por_engine::Config;
//!
//! let config = Config::builder()
//!     .fire_threshold(0.6)
//!     .seed(42)
//!     .build()?;
//! assert_eq!(config.seed(), Some(42));
//! # Ok::<(), por_engine::Error>(())
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default `E >= threshold` firing threshold for evaluation tables
pub const DEFAULT_FIRE_THRESHOLD: f64 = 0.5;

/// Default `cosine_shift > threshold` detector threshold
pub const DEFAULT_DETECTOR_THRESHOLD: f64 = 0.35;

/// Default turn-log rotation threshold (50 MiB)
pub const DEFAULT_MAX_LOG_BYTES: u64 = 50 * 1024 * 1024;

/// Default JSONL result-log rotation threshold (10 MiB)
pub const DEFAULT_RESULT_LOG_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Default number of buffered result-log entries before a flush
pub const DEFAULT_RESULT_LOG_BUFFER: usize = 100;

/// Default decimal places for the displayed `E` column
pub const DEFAULT_DISPLAY_PRECISION: u32 = 4;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    fire_threshold: f64,
    detector_threshold: f64,
    max_log_bytes: u64,
    result_log_max_bytes: u64,
    result_log_buffer: usize,
    display_precision: u32,
    seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fire_threshold: DEFAULT_FIRE_THRESHOLD,
            detector_threshold: DEFAULT_DETECTOR_THRESHOLD,
            max_log_bytes: DEFAULT_MAX_LOG_BYTES,
            result_log_max_bytes: DEFAULT_RESULT_LOG_MAX_BYTES,
            result_log_buffer: DEFAULT_RESULT_LOG_BUFFER,
            display_precision: DEFAULT_DISPLAY_PRECISION,
            seed: None,
        }
    }
}

impl Config {
    /// Create a builder starting from the defaults
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load a configuration from a JSON file
    ///
    /// Missing keys take their default value.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid JSON, or
    /// holds values the builder would reject
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Threshold for the `fired` column of evaluation tables
    #[must_use]
    pub const fn fire_threshold(&self) -> f64 {
        self.fire_threshold
    }

    /// Threshold for the detector's `cosine_shift` test
    #[must_use]
    pub const fn detector_threshold(&self) -> f64 {
        self.detector_threshold
    }

    /// Turn-log size that triggers rotation on the next append
    #[must_use]
    pub const fn max_log_bytes(&self) -> u64 {
        self.max_log_bytes
    }

    /// Result-log size that triggers rotation on the next flush
    #[must_use]
    pub const fn result_log_max_bytes(&self) -> u64 {
        self.result_log_max_bytes
    }

    /// Buffered result-log entries before an automatic flush
    #[must_use]
    pub const fn result_log_buffer(&self) -> usize {
        self.result_log_buffer
    }

    /// Decimal places of the rounded `E` column
    #[must_use]
    pub const fn display_precision(&self) -> u32 {
        self.display_precision
    }

    /// Sampling seed, if reproducible runs were requested
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn validate(&self) -> Result<()> {
        if !self.fire_threshold.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "fire_threshold must be finite, got {}",
                self.fire_threshold
            )));
        }
        if !self.detector_threshold.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "detector_threshold must be finite, got {}",
                self.detector_threshold
            )));
        }
        if self.result_log_buffer == 0 {
            return Err(Error::InvalidConfig(
                "result_log_buffer must be greater than 0".to_string(),
            ));
        }
        // f64 carries ~17 significant digits; more places round to nothing
        if self.display_precision > 15 {
            return Err(Error::InvalidConfig(format!(
                "display_precision must be <= 15, got {}",
                self.display_precision
            )));
        }
        Ok(())
    }
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the evaluation firing threshold
    #[must_use]
    pub fn fire_threshold(mut self, threshold: f64) -> Self {
        self.config.fire_threshold = threshold;
        self
    }

    /// Set the detector threshold
    #[must_use]
    pub fn detector_threshold(mut self, threshold: f64) -> Self {
        self.config.detector_threshold = threshold;
        self
    }

    /// Set the turn-log rotation threshold in bytes
    #[must_use]
    pub fn max_log_bytes(mut self, bytes: u64) -> Self {
        self.config.max_log_bytes = bytes;
        self
    }

    /// Set the result-log rotation threshold in bytes
    #[must_use]
    pub fn result_log_max_bytes(mut self, bytes: u64) -> Self {
        self.config.result_log_max_bytes = bytes;
        self
    }

    /// Set the result-log buffer size
    #[must_use]
    pub fn result_log_buffer(mut self, entries: usize) -> Self {
        self.config.result_log_buffer = entries;
        self
    }

    /// Set the decimal places of the displayed `E` column
    #[must_use]
    pub fn display_precision(mut self, places: u32) -> Self {
        self.config.display_precision = places;
        self
    }

    /// Seed the Monte-Carlo sampler
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for non-finite thresholds, a zero
    /// buffer size or an unusable precision
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
