//! The Cassowary solver.
//!
//! The tableau maps each basic symbol to a [`Row`] over non-basic symbols.
//! Inserting a constraint encodes it as a row, picks a subject to make basic,
//! and re-runs primal simplex on the objective. Edit variables take the cheaper
//! route: a suggestion shifts row constants and dual simplex restores
//! feasibility without a full re-solve.
//!
//! Rows and cells are ordered by symbol creation, so every "first found"
//! choice below is deterministic.

use std::collections::BTreeMap;

use cassia_core::{
    Constraint, ConstraintId, Expression, Priority, Relation, Space, Term, Variable,
};
use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::config::SolverConfig;
use crate::errors::SolverError;
use crate::row::{near_zero, Row};
use crate::symbol::{Symbol, SymbolKind, Tag};

/// A flushed value for a param that carries a context.
#[derive(Debug, Clone, PartialEq)]
pub struct Update<C> {
    pub context: C,
    pub value: f64,
}

#[derive(Debug, Clone, Copy)]
struct ConstraintRecord {
    tag: Tag,
    priority: Priority,
}

#[derive(Debug, Clone)]
struct EditInfo {
    tag: Tag,
    constraint: Constraint,
    constant: f64,
}

/// Which objective row a primal pass minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Objective {
    Main,
    Artificial,
}

/// Tableau state restored when an insertion is rejected midway.
#[derive(Debug)]
struct Snapshot {
    rows: BTreeMap<Symbol, Row>,
    objective: Row,
    infeasible_rows: Vec<Symbol>,
}

/// The Cassowary constraint solver.
#[derive(Debug)]
pub struct Solver {
    config: SolverConfig,
    /// Counter for generating unique symbol IDs
    symbol_counter: usize,
    /// Live constraints and the symbols that encode them
    constraints: IndexMap<ConstraintId, ConstraintRecord>,
    /// The tableau rows, keyed by their basic symbol
    rows: BTreeMap<Symbol, Row>,
    /// External symbol of every variable seen so far
    var_symbols: IndexMap<Variable, Symbol>,
    edits: IndexMap<Variable, EditInfo>,
    /// The objective function row
    objective: Row,
    /// Artificial objective, only present during phase 1
    artificial: Option<Row>,
    /// Rows whose constant went negative, pending dual optimization
    infeasible_rows: Vec<Symbol>,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    /// Create a new solver with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    /// Create a new solver.
    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            config,
            symbol_counter: 0,
            constraints: IndexMap::new(),
            rows: BTreeMap::new(),
            var_symbols: IndexMap::new(),
            edits: IndexMap::new(),
            objective: Row::new(0.0),
            artificial: None,
            infeasible_rows: Vec::new(),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Drop every constraint, edit, and variable mapping.
    pub fn reset(&mut self) {
        *self = Self::with_config(self.config);
    }

    /// Check whether a constraint is currently in the solver.
    pub fn has_constraint(&self, constraint: &Constraint) -> bool {
        self.constraints.contains_key(&constraint.id())
    }

    /// Add a constraint to the solver.
    pub fn add_constraint(&mut self, constraint: &Constraint) -> Result<(), SolverError> {
        let id = constraint.id();
        if self.constraints.contains_key(&id) {
            return Err(SolverError::DuplicateConstraint(id));
        }
        if constraint.priority().0 < 0 {
            return Err(SolverError::NegativePriority(id));
        }

        let mut tag = Tag::default();
        let mut row = self.create_row(constraint, &mut tag);
        let mut subject = Self::choose_subject(&row, &tag);

        // A row of dummies is either redundant or in conflict with the
        // required equalities already present.
        if subject.is_none() && row.all_dummies() {
            if !near_zero(row.constant) {
                warn!(constraint = %id, "rejecting unsatisfiable constraint");
                return Err(SolverError::UnsatisfiableConstraint(id));
            }
            subject = Some(tag.marker);
        }

        match subject {
            Some(subject) => {
                row.solve_for_symbol(subject);
                self.substitute(subject, &row);
                self.rows.insert(subject, row);
            }
            None => {
                let snapshot = self.snapshot();
                match self.add_with_artificial_variable(row) {
                    Ok(true) => {}
                    Ok(false) => {
                        self.restore(snapshot);
                        warn!(constraint = %id, "rejecting unsatisfiable constraint");
                        return Err(SolverError::UnsatisfiableConstraint(id));
                    }
                    Err(err) => {
                        self.restore(snapshot);
                        return Err(err);
                    }
                }
            }
        }

        self.constraints.insert(
            id,
            ConstraintRecord {
                tag,
                priority: constraint.priority(),
            },
        );
        debug!(
            constraint = %id,
            relation = %constraint.relation(),
            priority = %constraint.priority(),
            "added constraint"
        );

        self.optimize(Objective::Main)
    }

    /// Add several constraints, undoing the batch if any insertion fails.
    ///
    /// The undo is best effort: a failure while removing an already inserted
    /// constraint is logged and otherwise ignored.
    pub fn add_constraints<'a>(
        &mut self,
        constraints: impl IntoIterator<Item = &'a Constraint>,
    ) -> Result<(), SolverError> {
        self.bulk_edit(constraints, Self::add_constraint, Self::remove_constraint)
    }

    /// Remove a constraint from the solver.
    pub fn remove_constraint(&mut self, constraint: &Constraint) -> Result<(), SolverError> {
        let id = constraint.id();
        let record = self
            .constraints
            .shift_remove(&id)
            .ok_or(SolverError::UnknownConstraint(id))?;

        self.remove_constraint_effects(&record);

        let marker = record.tag.marker;
        if self.rows.remove(&marker).is_none() {
            // A marker that appears nowhere left no trace in the tableau.
            if let Some(leaving) = self.leaving_symbol_for_marker(marker) {
                let mut row = self
                    .rows
                    .remove(&leaving)
                    .ok_or(SolverError::Internal("leaving row vanished"))?;
                row.solve_for_symbols(leaving, marker);
                self.substitute(marker, &row);
            }
        }

        debug!(constraint = %id, "removed constraint");
        self.optimize(Objective::Main)
    }

    /// Remove several constraints, re-adding them if any removal fails.
    ///
    /// Like [`Solver::add_constraints`], the undo is best effort.
    pub fn remove_constraints<'a>(
        &mut self,
        constraints: impl IntoIterator<Item = &'a Constraint>,
    ) -> Result<(), SolverError> {
        self.bulk_edit(constraints, Self::remove_constraint, Self::add_constraint)
    }

    fn bulk_edit<'a>(
        &mut self,
        constraints: impl IntoIterator<Item = &'a Constraint>,
        apply: fn(&mut Self, &Constraint) -> Result<(), SolverError>,
        undo: fn(&mut Self, &Constraint) -> Result<(), SolverError>,
    ) -> Result<(), SolverError> {
        let mut applied = Vec::new();
        for constraint in constraints {
            if let Err(err) = apply(self, constraint) {
                for done in applied.into_iter().rev() {
                    if let Err(undo_err) = undo(self, done) {
                        warn!(constraint = %done.id(), error = %undo_err, "failed to undo batch edit");
                    }
                }
                return Err(err);
            }
            applied.push(constraint);
        }
        Ok(())
    }

    /// Register `var` as an edit variable at a soft priority.
    pub fn add_edit_variable(
        &mut self,
        var: Variable,
        priority: Priority,
    ) -> Result<(), SolverError> {
        if self.edits.contains_key(&var) {
            return Err(SolverError::DuplicateEditVariable(var));
        }
        if priority.0 < 0 || priority.is_required() {
            return Err(SolverError::BadEditPriority(priority));
        }

        let constraint = Constraint::new(Expression::from(Term::from(var)), Relation::EqualTo)
            .with_priority(priority);
        if let Err(err) = self.add_constraint(&constraint) {
            // The edit constraint may already be recorded if only the
            // optimization pass failed; nobody else holds it to remove later.
            if self.has_constraint(&constraint) {
                if let Err(undo_err) = self.remove_constraint(&constraint) {
                    warn!(variable = var.index(), error = %undo_err, "failed to drop edit constraint");
                }
            }
            return Err(err);
        }

        let tag = self
            .constraints
            .get(&constraint.id())
            .map(|record| record.tag)
            .ok_or(SolverError::Internal("edit constraint was not recorded"))?;
        self.edits.insert(
            var,
            EditInfo {
                tag,
                constraint,
                constant: 0.0,
            },
        );
        debug!(variable = var.index(), %priority, "added edit variable");
        Ok(())
    }

    /// Stop editing `var`, removing its edit constraint.
    pub fn remove_edit_variable(&mut self, var: Variable) -> Result<(), SolverError> {
        let info = self
            .edits
            .shift_remove(&var)
            .ok_or(SolverError::UnknownEditVariable(var))?;
        self.remove_constraint(&info.constraint)?;
        debug!(variable = var.index(), "removed edit variable");
        Ok(())
    }

    /// Check whether `var` is an edit variable.
    pub fn has_edit_variable(&self, var: Variable) -> bool {
        self.edits.contains_key(&var)
    }

    /// Suggest a value for an edit variable.
    ///
    /// Does nothing when `var` has no edit. Only the rows touched by the edit
    /// are adjusted; dual optimization then repairs any that went infeasible.
    pub fn suggest_value(&mut self, var: Variable, value: f64) -> Result<(), SolverError> {
        let Some(info) = self.edits.get_mut(&var) else {
            return Ok(());
        };
        let delta = value - info.constant;
        info.constant = value;
        let tag = info.tag;

        self.apply_edit_delta(tag, delta);
        self.dual_optimize()
    }

    fn apply_edit_delta(&mut self, tag: Tag, delta: f64) {
        if let Some(row) = self.rows.get_mut(&tag.marker) {
            if row.add(-delta) < 0.0 {
                self.infeasible_rows.push(tag.marker);
            }
            return;
        }

        if let Some(row) = self.rows.get_mut(&tag.other) {
            if row.add(delta) < 0.0 {
                self.infeasible_rows.push(tag.other);
            }
            return;
        }

        for (&symbol, row) in self.rows.iter_mut() {
            let coefficient = row.coefficient_for(tag.marker);
            if coefficient != 0.0 && row.add(delta * coefficient) < 0.0 && !symbol.is_external() {
                self.infeasible_rows.push(symbol);
            }
        }
    }

    /// Current value of a variable according to the tableau.
    ///
    /// Variables that are not basic, or unknown to the solver, read as zero.
    pub fn value(&self, var: Variable) -> f64 {
        self.var_symbols
            .get(&var)
            .and_then(|symbol| self.rows.get(symbol))
            .map_or(0.0, |row| row.constant)
    }

    /// Write the solved values into `space`.
    ///
    /// Returns an update for every param that carries a context.
    ///
    /// # Panics
    ///
    /// Panics if a variable given to this solver does not belong to `space`.
    pub fn flush_updates<C: Clone>(&self, space: &mut Space<C>) -> Vec<Update<C>> {
        let mut updates = Vec::new();
        for (&var, symbol) in &self.var_symbols {
            let value = self.rows.get(symbol).map_or(0.0, |row| row.constant);
            space.set_value(var, value);

            let context = space.owner(var).and_then(|param| space.context(param));
            if let Some(context) = context {
                updates.push(Update {
                    context: context.clone(),
                    value,
                });
            }
        }
        trace!(variables = self.var_symbols.len(), updates = updates.len(), "flushed");
        updates
    }

    fn new_symbol(&mut self, kind: SymbolKind) -> Symbol {
        self.symbol_counter += 1;
        Symbol::new(self.symbol_counter, kind)
    }

    fn symbol_for_variable(&mut self, var: Variable) -> Symbol {
        if let Some(&symbol) = self.var_symbols.get(&var) {
            return symbol;
        }
        let symbol = self.new_symbol(SymbolKind::External);
        self.var_symbols.insert(var, symbol);
        symbol
    }

    /// Encode a constraint as a row over the current non-basic symbols.
    fn create_row(&mut self, constraint: &Constraint, tag: &mut Tag) -> Row {
        let expression = constraint.expression();
        let mut row = Row::new(expression.constant());

        for term in expression.terms() {
            if near_zero(term.coefficient()) {
                continue;
            }

            let symbol = self.symbol_for_variable(term.variable());
            match self.rows.get(&symbol) {
                Some(basic) => row.insert_row(basic, term.coefficient()),
                None => row.insert_symbol(symbol, term.coefficient()),
            }
        }

        let priority = constraint.priority();
        match constraint.relation() {
            Relation::LessThanOrEqualTo | Relation::GreaterThanOrEqualTo => {
                let coefficient = if constraint.relation() == Relation::LessThanOrEqualTo {
                    1.0
                } else {
                    -1.0
                };

                let slack = self.new_symbol(SymbolKind::Slack);
                tag.marker = slack;
                row.insert_symbol(slack, coefficient);

                if !priority.is_required() {
                    let error = self.new_symbol(SymbolKind::Error);
                    tag.other = error;
                    row.insert_symbol(error, -coefficient);
                    self.objective.insert_symbol(error, priority.weight());
                }
            }
            Relation::EqualTo => {
                if priority.is_required() {
                    let dummy = self.new_symbol(SymbolKind::Dummy);
                    tag.marker = dummy;
                    row.insert_symbol(dummy, 1.0);
                } else {
                    let errplus = self.new_symbol(SymbolKind::Error);
                    let errminus = self.new_symbol(SymbolKind::Error);
                    tag.marker = errplus;
                    tag.other = errminus;
                    row.insert_symbol(errplus, -1.0);
                    row.insert_symbol(errminus, 1.0);
                    self.objective.insert_symbol(errplus, priority.weight());
                    self.objective.insert_symbol(errminus, priority.weight());
                }
            }
        }

        if row.constant < 0.0 {
            row.reverse_sign();
        }

        row
    }

    /// Choose the symbol to make basic for a new row.
    fn choose_subject(row: &Row, tag: &Tag) -> Option<Symbol> {
        if let Some(&symbol) = row.cells.keys().find(|symbol| symbol.is_external()) {
            return Some(symbol);
        }

        [tag.marker, tag.other]
            .into_iter()
            .find(|symbol| symbol.is_pivotable() && row.coefficient_for(*symbol) < 0.0)
    }

    /// Phase 1: insert `row` through an artificial variable.
    ///
    /// Returns whether the artificial variable could be driven to zero.
    fn add_with_artificial_variable(&mut self, row: Row) -> Result<bool, SolverError> {
        let art = self.new_symbol(SymbolKind::Slack);
        self.rows.insert(art, row.clone());
        self.artificial = Some(row);

        let optimized = self.optimize(Objective::Artificial);
        let success = self
            .artificial
            .take()
            .is_some_and(|objective| near_zero(objective.constant));
        optimized?;

        if let Some(mut row) = self.rows.remove(&art) {
            if row.cells.is_empty() {
                return Ok(success);
            }
            let Some(entering) = row.any_pivotable_symbol() else {
                return Ok(false);
            };
            row.solve_for_symbols(art, entering);
            self.substitute(entering, &row);
            self.rows.insert(entering, row);
        }

        for row in self.rows.values_mut() {
            row.remove(art);
        }
        self.objective.remove(art);

        Ok(success)
    }

    /// Substitute a symbol throughout the tableau.
    fn substitute(&mut self, symbol: Symbol, row: &Row) {
        for (&basic, r) in self.rows.iter_mut() {
            r.substitute(symbol, row);
            if !basic.is_external() && r.constant < 0.0 {
                self.infeasible_rows.push(basic);
            }
        }
        self.objective.substitute(symbol, row);
        if let Some(artificial) = self.artificial.as_mut() {
            artificial.substitute(symbol, row);
        }
    }

    /// Primal simplex on the chosen objective.
    fn optimize(&mut self, objective: Objective) -> Result<(), SolverError> {
        let limit = self.config.max_iterations;
        let mut pivots = 0;

        loop {
            let row = match objective {
                Objective::Main => &self.objective,
                Objective::Artificial => match &self.artificial {
                    Some(row) => row,
                    None => return Ok(()),
                },
            };
            let Some(entering) = Self::entering_symbol(row) else {
                if objective == Objective::Main {
                    // Primal pivots keep restricted rows feasible; queued
                    // entries are stale by now.
                    self.infeasible_rows.clear();
                }
                return Ok(());
            };
            if pivots == limit {
                return Err(SolverError::IterationLimit { limit });
            }
            pivots += 1;

            let leaving = self
                .leaving_symbol_for(entering)
                .ok_or(SolverError::Internal("objective is unbounded"))?;
            self.pivot(leaving, entering)?;
        }
    }

    /// Make `entering` basic in place of `leaving`.
    fn pivot(&mut self, leaving: Symbol, entering: Symbol) -> Result<(), SolverError> {
        let mut row = self
            .rows
            .remove(&leaving)
            .ok_or(SolverError::Internal("leaving row vanished"))?;
        row.solve_for_symbols(leaving, entering);
        self.substitute(entering, &row);
        self.rows.insert(entering, row);
        trace!(?entering, ?leaving, kind = ?entering.kind(), "pivot");
        Ok(())
    }

    /// First non-dummy symbol with a negative objective coefficient.
    fn entering_symbol(objective: &Row) -> Option<Symbol> {
        objective
            .cells
            .iter()
            .find(|(symbol, &coefficient)| !symbol.is_dummy() && coefficient < 0.0)
            .map(|(&symbol, _)| symbol)
    }

    /// Minimum ratio test over restricted rows.
    fn leaving_symbol_for(&self, entering: Symbol) -> Option<Symbol> {
        let mut ratio = f64::MAX;
        let mut leaving = None;

        for (&symbol, row) in &self.rows {
            if symbol.is_external() {
                continue;
            }

            let coefficient = row.coefficient_for(entering);
            if coefficient < 0.0 {
                let r = -row.constant / coefficient;
                if r < ratio {
                    ratio = r;
                    leaving = Some(symbol);
                }
            }
        }

        leaving
    }

    /// Pick the row to pivot on when removing a non-basic marker.
    ///
    /// Restricted rows with a negative coefficient come first, then those with
    /// a positive one, both by minimum ratio. External rows are the fallback.
    fn leaving_symbol_for_marker(&self, marker: Symbol) -> Option<Symbol> {
        let mut negative_ratio = f64::MAX;
        let mut positive_ratio = f64::MAX;
        let mut first = None;
        let mut second = None;
        let mut third = None;

        for (&symbol, row) in &self.rows {
            let coefficient = row.coefficient_for(marker);
            if coefficient == 0.0 {
                continue;
            }

            if symbol.is_external() {
                if third.is_none() {
                    third = Some(symbol);
                }
            } else if coefficient < 0.0 {
                let r = -row.constant / coefficient;
                if r < negative_ratio {
                    negative_ratio = r;
                    first = Some(symbol);
                }
            } else {
                let r = row.constant / coefficient;
                if r < positive_ratio {
                    positive_ratio = r;
                    second = Some(symbol);
                }
            }
        }

        first.or(second).or(third)
    }

    fn remove_constraint_effects(&mut self, record: &ConstraintRecord) {
        let weight = record.priority.weight();
        for symbol in [record.tag.marker, record.tag.other] {
            if symbol.is_error() {
                self.remove_marker_effects(symbol, weight);
            }
        }
    }

    fn remove_marker_effects(&mut self, marker: Symbol, weight: f64) {
        match self.rows.get(&marker) {
            Some(row) => self.objective.insert_row(row, -weight),
            None => self.objective.insert_symbol(marker, -weight),
        }
    }

    /// Dual simplex over the queued infeasible rows.
    fn dual_optimize(&mut self) -> Result<(), SolverError> {
        let limit = self.config.max_iterations;
        let mut pivots = 0;

        while let Some(leaving) = self.infeasible_rows.pop() {
            let entering = match self.rows.get(&leaving) {
                Some(row) if row.constant < 0.0 => self
                    .dual_entering_symbol(row)
                    .ok_or(SolverError::Internal("dual optimize failed"))?,
                _ => continue,
            };
            if pivots == limit {
                return Err(SolverError::IterationLimit { limit });
            }
            pivots += 1;
            self.pivot(leaving, entering)?;
        }

        Ok(())
    }

    /// Entering symbol for the dual pass: the positive cell minimizing the
    /// objective-to-row coefficient ratio.
    fn dual_entering_symbol(&self, row: &Row) -> Option<Symbol> {
        let mut ratio = f64::MAX;
        let mut entering = None;

        for (&symbol, &coefficient) in &row.cells {
            if coefficient > 0.0 && !symbol.is_dummy() {
                let r = self.objective.coefficient_for(symbol) / coefficient;
                if r < ratio {
                    ratio = r;
                    entering = Some(symbol);
                }
            }
        }

        entering
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            rows: self.rows.clone(),
            objective: self.objective.clone(),
            infeasible_rows: self.infeasible_rows.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.rows = snapshot.rows;
        self.objective = snapshot.objective;
        self.infeasible_rows = snapshot.infeasible_rows;
        self.artificial = None;
    }
}
