//! Error types for GRPO evaluation.
//!
//! Every check runs before any arithmetic, so a failed call never leaves a
//! partially computed loss or gradient behind.

use thiserror::Error;

/// Failures surfaced by advantage estimation and loss evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GrpoError {
    /// The group holds no samples.
    #[error("invalid group size {group_size}: a group needs at least one sample")]
    InvalidGroupSize { group_size: usize },

    /// A per-sample array does not have one entry per group member.
    #[error("length mismatch for `{field}`: expected {expected}, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A hyperparameter is negative or not finite.
    #[error("invalid hyperparameter `{name}` = {value}: must be finite and non-negative")]
    InvalidHyperparameter { name: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, GrpoError>;

/// Check that `values` has exactly `expected` entries.
pub(crate) fn ensure_len(field: &'static str, values: &[f64], expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(GrpoError::LengthMismatch {
            field,
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

/// Check that a hyperparameter is finite and `>= 0`.
pub(crate) fn ensure_non_negative(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(GrpoError::InvalidHyperparameter { name, value });
    }
    Ok(())
}
