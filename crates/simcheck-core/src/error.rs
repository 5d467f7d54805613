//! Error types for simcheck-core.

use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while scoring a comparison.
///
/// A comparison that ran and found nothing is not an error; it yields an
/// [`AggregateResult`](crate::engine::AggregateResult) with `overall = 0`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The source document produced no text to compare.
    #[error("source document has no extractable text")]
    EmptySourceText,

    /// The configured n-gram size is below 1.
    #[error("invalid n-gram size {size}: must be at least 1")]
    InvalidNGramSize {
        /// The rejected size.
        size: usize,
    },

    /// The significance threshold is not a percentage.
    #[error("invalid significance threshold {value}: must be between 0 and 100")]
    InvalidThreshold {
        /// The rejected threshold.
        value: f64,
    },
}

/// Result type alias using [`EngineError`].
pub type EngineResult<T> = Result<T, EngineError>;
