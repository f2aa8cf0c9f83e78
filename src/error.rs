//! Error types for the PoR engine
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)
//!
//! Variants fall in four groups:
//! - Validation: [`Error::NotNumeric`], [`Error::InvalidRange`],
//!   [`Error::LengthMismatch`], [`Error::MissingColumn`]
//! - Domain: [`Error::OutOfDomain`], [`Error::DivisionByZero`]
//! - Storage / IO: [`Error::StorageError`], [`Error::Io`], [`Error::Arrow`],
//!   [`Error::Parquet`], [`Error::Csv`], [`Error::Json`]
//! - [`Error::InvalidConfig`] and [`Error::Other`]

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// PoR engine error types
#[derive(Error, Debug)]
pub enum Error {
    /// A NaN reached a numeric contract
    #[error("Input must be numeric: {name} is NaN")]
    NotNumeric {
        /// Parameter name
        name: String,
    },

    /// Unusable sampling range (`min > max`, negative or non-finite bounds)
    #[error("{name} range ({min}, {max}) is invalid: {reason}")]
    InvalidRange {
        /// Parameter name
        name: String,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
        /// Which rule the range broke
        reason: &'static str,
    },

    /// Vectors that must be paired element-wise have different lengths
    #[error("Length mismatch: expected {expected} elements, got {actual}")]
    LengthMismatch {
        /// Length of the first vector
        expected: usize,
        /// Length of the offending vector
        actual: usize,
    },

    /// Value outside the formula's domain (never clamped)
    #[error("{name} out of domain: {value} (requires {constraint})")]
    OutOfDomain {
        /// Parameter name
        name: String,
        /// Offending value
        value: f64,
        /// Human-readable constraint, e.g. `>= 0`
        constraint: &'static str,
    },

    /// Zero denominator
    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    /// Required table column absent
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Configuration rejected by the builder or loader
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Storage error (Parquet/Arrow/CSV layout)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for [`Error::NotNumeric`]
    pub(crate) fn not_numeric(name: impl Into<String>) -> Self {
        Self::NotNumeric { name: name.into() }
    }

    /// True for errors caused by bad caller input (ranges, NaN, lengths, columns)
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NotNumeric { .. }
                | Self::InvalidRange { .. }
                | Self::LengthMismatch { .. }
                | Self::MissingColumn(_)
        )
    }

    /// True for domain violations of an otherwise well-formed call
    #[must_use]
    pub const fn is_domain(&self) -> bool {
        matches!(self, Self::OutOfDomain { .. } | Self::DivisionByZero(_))
    }
}
