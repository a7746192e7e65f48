//! Core types for the cassia constraint solver.
//!
//! This crate provides the values the solver works on:
//! - A variable arena ([`Space`]) with [`Variable`] and [`Param`] handles
//! - Linear expression algebra ([`Term`], [`Expression`], [`Member`])
//! - Constraints with relations and priorities
//! - Error types
//!
//! # Example
//!
//! ```
//! use cassia_core::{Relate, Priority, Space};
//!
//! let mut space: Space = Space::new();
//! let left = space.new_param(0.0);
//! let right = space.new_param(0.0);
//!
//! let gap = (right - left).greater_than_or_equal_to(100.0);
//! let pin = left.equals(10.0).with_priority(Priority::WEAK);
//!
//! assert_eq!(gap.expression().constant(), -100.0);
//! assert!(!pin.priority().is_required());
//! ```

pub mod constraint;
pub mod errors;
pub mod expr;
pub mod space;

pub use constraint::*;
pub use errors::*;
pub use expr::*;
pub use space::*;
