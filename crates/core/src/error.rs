//! Error taxonomy shared by every engine crate.
//!
//! All variants are input-validation failures detected before any
//! computation runs. None of them are transient, so callers should never
//! retry on them.

use thiserror::Error;

/// Errors raised by the statistics engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// Column is missing from the dataset, has the wrong type or breaks a
    /// column constraint such as unique ids.
    #[error("Invalid column '{column}': {reason}")]
    InvalidColumn { column: String, reason: String },

    /// Zero variance (or an equivalent degenerate shape) where a spread is required.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Too few non-empty groups for a multi-group test.
    #[error("Insufficient groups: need at least {required}, got {actual}")]
    InsufficientGroups { required: usize, actual: usize },

    /// Too few observations for the requested computation.
    #[error("Insufficient sample: {0}")]
    InsufficientSample(String),

    /// Constant series passed to a correlation.
    #[error("Insufficient variance: {0}")]
    InsufficientVariance(String),

    /// Parameter outside its valid domain (alpha, fractions, mismatched lengths).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Reference distribution could not be constructed.
    #[error("Distribution error: {0}")]
    Distribution(String),
}

impl StatsError {
    /// Shorthand for [`StatsError::InvalidColumn`].
    pub fn invalid_column(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidColumn {
            column: column.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used across the engine crates.
pub type StatsResult<T> = Result<T, StatsError>;

/// Checks that a significance level lies strictly inside (0, 1).
///
/// # Errors
/// Returns [`StatsError::InvalidParameter`] for anything else, including NaN.
pub fn validate_alpha(alpha: f64) -> StatsResult<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(StatsError::InvalidParameter(format!(
            "alpha must lie in (0, 1), got {alpha}"
        )))
    }
}
