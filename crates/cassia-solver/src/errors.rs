//! Error types for the solver.

use cassia_core::{ConstraintId, Priority, Variable};
use thiserror::Error;

/// Errors returned by [`Solver`](crate::Solver) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("Constraint {0} has already been added")]
    DuplicateConstraint(ConstraintId),

    #[error("Required constraint {0} cannot be satisfied")]
    UnsatisfiableConstraint(ConstraintId),

    #[error("Constraint {0} has a negative priority")]
    NegativePriority(ConstraintId),

    #[error("Constraint {0} is not in the solver")]
    UnknownConstraint(ConstraintId),

    #[error("Variable {} already has an edit", .0.index())]
    DuplicateEditVariable(Variable),

    #[error("Variable {} has no edit", .0.index())]
    UnknownEditVariable(Variable),

    #[error("Edit priority {0} must be non-negative and below required")]
    BadEditPriority(Priority),

    #[error("Simplex did not converge within {limit} pivots")]
    IterationLimit { limit: usize },

    #[error("Internal solver error: {0}")]
    Internal(&'static str),
}
