//! Error types for expression building.

use thiserror::Error;

/// Errors while combining linear expressions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("Product of two non-constant members is not linear")]
    NonLinear,

    #[error("Division by a zero constant")]
    DivisionByZero,
}
