//! Incremental Cassowary constraint solver.
//!
//! This crate implements:
//! - A simplex tableau over slack, error, and dummy symbols
//! - Incremental constraint insertion and removal with primal optimization
//! - Soft constraints weighted by priority
//! - Edit variables re-solved through dual optimization
//!
//! The algorithm follows "The Cassowary Linear Arithmetic Constraint Solving
//! Algorithm" by Greg J. Badros and Alan Borning.
//!
//! # Example
//!
//! ```
//! use cassia_core::{Priority, Relate, Space};
//! use cassia_solver::Solver;
//!
//! let mut space: Space<&str> = Space::new();
//! let left = space.new_param_with_context(0.0, "left");
//! let width = space.new_param_with_context(0.0, "width");
//!
//! let mut solver = Solver::new();
//! solver.add_constraint(&left.equals(10.0)).unwrap();
//! solver.add_constraint(&width.greater_than_or_equal_to(50.0)).unwrap();
//! solver.add_edit_variable(width.variable(), Priority::STRONG).unwrap();
//! solver.suggest_value(width.variable(), 120.0).unwrap();
//!
//! let updates = solver.flush_updates(&mut space);
//! assert_eq!(updates.len(), 2);
//! assert!((space.value(width) - 120.0).abs() < 1e-8);
//! ```

mod config;
mod errors;
mod row;
mod solver;
mod symbol;

pub use config::SolverConfig;
pub use errors::SolverError;
pub use row::EPSILON;
pub use solver::{Solver, Update};
