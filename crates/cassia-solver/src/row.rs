//! Tableau rows.
//!
//! A row stores `basic = constant + Σ(coefficient * symbol)` for the symbol it
//! is keyed under in the tableau.

use std::collections::BTreeMap;

use crate::symbol::Symbol;

/// Tolerance below which a coefficient is treated as exactly zero.
pub const EPSILON: f64 = 1e-8;

/// Near-zero check for floating point values.
pub(crate) fn near_zero(value: f64) -> bool {
    value.abs() < EPSILON
}

/// A row in the simplex tableau.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Row {
    pub constant: f64,
    pub cells: BTreeMap<Symbol, f64>,
}

impl Row {
    pub(crate) fn new(constant: f64) -> Self {
        Self {
            constant,
            cells: BTreeMap::new(),
        }
    }

    /// Add `value` to the constant, returning the new constant.
    pub(crate) fn add(&mut self, value: f64) -> f64 {
        self.constant += value;
        self.constant
    }

    /// Add `coefficient` to the symbol's cell, dropping it if it cancels out.
    pub(crate) fn insert_symbol(&mut self, symbol: Symbol, coefficient: f64) {
        let entry = self.cells.entry(symbol).or_insert(0.0);
        *entry += coefficient;
        if near_zero(*entry) {
            self.cells.remove(&symbol);
        }
    }

    /// Add `coefficient * other` to this row.
    pub(crate) fn insert_row(&mut self, other: &Row, coefficient: f64) {
        self.constant += other.constant * coefficient;
        for (&symbol, &c) in &other.cells {
            self.insert_symbol(symbol, c * coefficient);
        }
    }

    pub(crate) fn remove(&mut self, symbol: Symbol) {
        self.cells.remove(&symbol);
    }

    pub(crate) fn reverse_sign(&mut self) {
        self.constant = -self.constant;
        for coefficient in self.cells.values_mut() {
            *coefficient = -*coefficient;
        }
    }

    /// Solve the row for `symbol`, which must be present.
    ///
    /// The symbol's coefficient becomes the implicit `-1` of the basic side:
    /// every other cell and the constant are divided by its negation.
    pub(crate) fn solve_for_symbol(&mut self, symbol: Symbol) {
        let Some(coefficient) = self.cells.remove(&symbol) else {
            panic!("{:?} is not in the row", symbol);
        };
        let multiplier = -1.0 / coefficient;
        self.constant *= multiplier;
        for c in self.cells.values_mut() {
            *c *= multiplier;
        }
    }

    /// Re-solve a row basic in `lhs` for `rhs`.
    pub(crate) fn solve_for_symbols(&mut self, lhs: Symbol, rhs: Symbol) {
        self.insert_symbol(lhs, -1.0);
        self.solve_for_symbol(rhs);
    }

    pub(crate) fn coefficient_for(&self, symbol: Symbol) -> f64 {
        self.cells.get(&symbol).copied().unwrap_or(0.0)
    }

    /// Replace `symbol` with the expression in `row`.
    pub(crate) fn substitute(&mut self, symbol: Symbol, row: &Row) {
        if let Some(coefficient) = self.cells.remove(&symbol) {
            self.insert_row(row, coefficient);
        }
    }

    /// First slack or error symbol in the row.
    pub(crate) fn any_pivotable_symbol(&self) -> Option<Symbol> {
        self.cells.keys().copied().find(Symbol::is_pivotable)
    }

    /// True when every symbol in the row is a dummy.
    pub(crate) fn all_dummies(&self) -> bool {
        self.cells.keys().all(Symbol::is_dummy)
    }
}
