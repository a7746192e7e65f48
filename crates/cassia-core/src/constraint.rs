//! Constraints, relations, and priorities.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::expr::Expression;

/// How a constraint's expression relates to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Relation {
    EqualTo,
    LessThanOrEqualTo,
    GreaterThanOrEqualTo,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::EqualTo => write!(f, "=="),
            Relation::LessThanOrEqualTo => write!(f, "<="),
            Relation::GreaterThanOrEqualTo => write!(f, ">="),
        }
    }
}

/// Constraint priority (strength).
///
/// Constraints below [`Priority::REQUIRED`] are soft: the solver may violate
/// them, paying a penalty proportional to the priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Priority(pub i64);

impl Priority {
    pub const REQUIRED: Priority = Priority(1_000_000_000);
    pub const STRONG: Priority = Priority(1_000_000);
    pub const MEDIUM: Priority = Priority(1_000);
    pub const WEAK: Priority = Priority(1);

    /// Check if this is a required priority.
    pub fn is_required(&self) -> bool {
        *self >= Self::REQUIRED
    }

    /// The objective weight of this priority.
    pub fn weight(&self) -> f64 {
        self.0 as f64
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::REQUIRED
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Priority::REQUIRED => write!(f, "required"),
            Priority::STRONG => write!(f, "strong"),
            Priority::MEDIUM => write!(f, "medium"),
            Priority::WEAK => write!(f, "weak"),
            Priority(value) => write!(f, "{}", value),
        }
    }
}

static NEXT_CONSTRAINT_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a constraint.
///
/// Minted once when a constraint is created. Clones share it; constraints built
/// separately never do, even if they are structurally equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(u64);

impl ConstraintId {
    fn next() -> Self {
        Self(NEXT_CONSTRAINT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A linear constraint `expression <relation> 0` with a priority.
#[derive(Debug, Clone)]
pub struct Constraint {
    id: ConstraintId,
    expression: Expression,
    relation: Relation,
    priority: Priority,
}

impl Constraint {
    /// Create a required constraint.
    pub fn new(expression: Expression, relation: Relation) -> Self {
        Self {
            id: ConstraintId::next(),
            expression,
            relation,
            priority: Priority::REQUIRED,
        }
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn id(&self) -> ConstraintId {
        self.id
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Constraint {}

impl std::hash::Hash for Constraint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
