//! Linear expression algebra.
//!
//! Every operand is one of three shapes, captured by [`Member`]: a plain
//! constant, a single weighted variable, or a full linear expression. Adding
//! and subtracting concatenates terms without merging like terms; the solver
//! folds duplicates when it encodes a constraint. Products and quotients are
//! only linear when one side is constant.

use std::ops::{Add, Div, Mul, Neg, Sub};

use smallvec::SmallVec;

use crate::constraint::{Constraint, Relation};
use crate::errors::ExpressionError;
use crate::space::{Param, Space, Variable};

/// A variable scaled by a coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Term {
    variable: Variable,
    coefficient: f64,
}

impl Term {
    /// Create a new term.
    pub fn new(variable: impl Into<Variable>, coefficient: f64) -> Self {
        Self {
            variable: variable.into(),
            coefficient,
        }
    }

    pub fn variable(&self) -> Variable {
        self.variable
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Evaluate against the current variable values.
    pub fn value<C>(&self, space: &Space<C>) -> f64 {
        self.coefficient * space.value(self.variable)
    }

    fn scaled(self, multiplier: f64) -> Self {
        Self {
            variable: self.variable,
            coefficient: self.coefficient * multiplier,
        }
    }
}

impl From<Variable> for Term {
    fn from(variable: Variable) -> Self {
        Term::new(variable, 1.0)
    }
}

impl From<Param> for Term {
    fn from(param: Param) -> Self {
        Term::new(param.variable(), 1.0)
    }
}

/// A linear expression: `constant + Σ(coefficient * variable)`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expression {
    terms: SmallVec<[Term; 4]>,
    constant: f64,
}

impl Expression {
    /// Create an expression from terms and a constant.
    pub fn new(terms: impl IntoIterator<Item = Term>, constant: f64) -> Self {
        Self {
            terms: terms.into_iter().collect(),
            constant,
        }
    }

    /// Create a constant expression.
    pub fn from_constant(constant: f64) -> Self {
        Self {
            terms: SmallVec::new(),
            constant,
        }
    }

    /// The terms, in the order they were combined.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// An expression without terms is a constant.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate against the current variable values.
    pub fn value<C>(&self, space: &Space<C>) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |acc, term| acc + term.value(space))
    }

    fn scaled(mut self, multiplier: f64) -> Self {
        for term in &mut self.terms {
            *term = term.scaled(multiplier);
        }
        self.constant *= multiplier;
        self
    }
}

impl From<Term> for Expression {
    fn from(term: Term) -> Self {
        Expression::new([term], 0.0)
    }
}

/// One operand of the expression algebra.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Constant(f64),
    Term(Term),
    Expression(Expression),
}

impl Member {
    /// Whether this member has no variable part.
    pub fn is_constant(&self) -> bool {
        match self {
            Member::Constant(_) => true,
            Member::Term(_) => false,
            Member::Expression(expr) => expr.is_constant(),
        }
    }

    /// The value of a constant member.
    pub fn constant_value(&self) -> Option<f64> {
        match self {
            Member::Constant(value) => Some(*value),
            Member::Expression(expr) if expr.is_constant() => Some(expr.constant),
            _ => None,
        }
    }

    /// Evaluate against the current variable values.
    pub fn value<C>(&self, space: &Space<C>) -> f64 {
        match self {
            Member::Constant(value) => *value,
            Member::Term(term) => term.value(space),
            Member::Expression(expr) => expr.value(space),
        }
    }

    pub fn into_expression(self) -> Expression {
        match self {
            Member::Constant(value) => Expression::from_constant(value),
            Member::Term(term) => Expression::from(term),
            Member::Expression(expr) => expr,
        }
    }

    /// `self + rhs`.
    pub fn sum(self, rhs: Member) -> Expression {
        let mut expr = self.into_expression();
        match rhs {
            Member::Constant(value) => expr.constant += value,
            Member::Term(term) => expr.terms.push(term),
            Member::Expression(other) => {
                expr.terms.extend(other.terms);
                expr.constant += other.constant;
            }
        }
        expr
    }

    /// `self - rhs`.
    pub fn difference(self, rhs: Member) -> Expression {
        let mut expr = self.into_expression();
        match rhs {
            Member::Constant(value) => expr.constant -= value,
            Member::Term(term) => expr.terms.push(term.scaled(-1.0)),
            Member::Expression(other) => {
                expr.terms
                    .extend(other.terms.into_iter().map(|term| term.scaled(-1.0)));
                expr.constant -= other.constant;
            }
        }
        expr
    }

    /// `self * rhs`, defined only when one side is constant.
    pub fn product(self, rhs: Member) -> Result<Expression, ExpressionError> {
        if let Some(multiplier) = self.constant_value() {
            return Ok(rhs.into_expression().scaled(multiplier));
        }
        match rhs.constant_value() {
            Some(multiplier) => Ok(self.into_expression().scaled(multiplier)),
            None => Err(ExpressionError::NonLinear),
        }
    }

    /// `self / rhs`, defined only for a non-zero constant divisor.
    pub fn quotient(self, rhs: Member) -> Result<Expression, ExpressionError> {
        let divisor = rhs.constant_value().ok_or(ExpressionError::NonLinear)?;
        if divisor == 0.0 {
            return Err(ExpressionError::DivisionByZero);
        }
        Ok(self.into_expression().scaled(1.0 / divisor))
    }

    /// Build the constraint `self <relation> rhs`, normalized to `self - rhs`.
    pub fn relate(self, rhs: Member, relation: Relation) -> Constraint {
        Constraint::new(self.difference(rhs), relation)
    }
}

impl From<f64> for Member {
    fn from(value: f64) -> Self {
        Member::Constant(value)
    }
}

impl From<Variable> for Member {
    fn from(variable: Variable) -> Self {
        Member::Term(Term::from(variable))
    }
}

impl From<Param> for Member {
    fn from(param: Param) -> Self {
        Member::Term(Term::from(param))
    }
}

impl From<Term> for Member {
    fn from(term: Term) -> Self {
        Member::Term(term)
    }
}

impl From<Expression> for Member {
    fn from(expr: Expression) -> Self {
        Member::Expression(expr)
    }
}

/// Constraint builders and fallible scaling for anything usable as a [`Member`].
pub trait Relate: Into<Member> + Sized {
    fn equals(self, rhs: impl Into<Member>) -> Constraint {
        self.into().relate(rhs.into(), Relation::EqualTo)
    }

    fn less_than_or_equal_to(self, rhs: impl Into<Member>) -> Constraint {
        self.into().relate(rhs.into(), Relation::LessThanOrEqualTo)
    }

    fn greater_than_or_equal_to(self, rhs: impl Into<Member>) -> Constraint {
        self.into().relate(rhs.into(), Relation::GreaterThanOrEqualTo)
    }

    fn try_mul(self, rhs: impl Into<Member>) -> Result<Expression, ExpressionError> {
        self.into().product(rhs.into())
    }

    fn try_div(self, rhs: impl Into<Member>) -> Result<Expression, ExpressionError> {
        self.into().quotient(rhs.into())
    }
}

impl<T: Into<Member>> Relate for T {}

macro_rules! impl_linear_ops {
    ($($ty:ty),* $(,)?) => {$(
        impl<R: Into<Member>> Add<R> for $ty {
            type Output = Expression;

            fn add(self, rhs: R) -> Expression {
                Member::from(self).sum(rhs.into())
            }
        }

        impl<R: Into<Member>> Sub<R> for $ty {
            type Output = Expression;

            fn sub(self, rhs: R) -> Expression {
                Member::from(self).difference(rhs.into())
            }
        }

        impl Neg for $ty {
            type Output = Expression;

            fn neg(self) -> Expression {
                Member::from(self).into_expression().scaled(-1.0)
            }
        }

        impl Mul<f64> for $ty {
            type Output = Expression;

            fn mul(self, rhs: f64) -> Expression {
                Member::from(self).into_expression().scaled(rhs)
            }
        }

        impl Div<f64> for $ty {
            type Output = Expression;

            /// Scale by `1 / rhs`.
            ///
            /// A zero divisor yields non-finite coefficients. Use
            /// [`Relate::try_div`] to get [`ExpressionError::DivisionByZero`]
            /// instead.
            fn div(self, rhs: f64) -> Expression {
                Member::from(self).into_expression().scaled(1.0 / rhs)
            }
        }

        impl Add<$ty> for f64 {
            type Output = Expression;

            fn add(self, rhs: $ty) -> Expression {
                Member::Constant(self).sum(rhs.into())
            }
        }

        impl Sub<$ty> for f64 {
            type Output = Expression;

            fn sub(self, rhs: $ty) -> Expression {
                Member::Constant(self).difference(rhs.into())
            }
        }

        impl Mul<$ty> for f64 {
            type Output = Expression;

            fn mul(self, rhs: $ty) -> Expression {
                Member::from(rhs).into_expression().scaled(self)
            }
        }
    )*};
}

impl_linear_ops!(Variable, Param, Term, Expression);
