//! # Error Types
//!
//! Errors raised by the shared numeric helpers.

use cosmwasm_std::{CheckedFromRatioError, CheckedMultiplyRatioError, OverflowError};
use thiserror::Error;

/// Failures of fixed-point or integer arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    /// Addition, subtraction or multiplication left the representable range.
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    /// A ratio could not be applied or built.
    #[error("Invalid ratio: {0}")]
    Ratio(String),

    /// Division by a zero amount or zero rate.
    #[error("Division by zero")]
    DivisionByZero,
}

impl From<OverflowError> for MathError {
    fn from(err: OverflowError) -> Self {
        Self::Overflow(err.to_string())
    }
}

impl From<CheckedMultiplyRatioError> for MathError {
    fn from(err: CheckedMultiplyRatioError) -> Self {
        Self::Ratio(err.to_string())
    }
}

impl From<CheckedFromRatioError> for MathError {
    fn from(err: CheckedFromRatioError) -> Self {
        Self::Ratio(err.to_string())
    }
}

/// Result alias for arithmetic helpers.
pub type MathResult<T> = Result<T, MathError>;
