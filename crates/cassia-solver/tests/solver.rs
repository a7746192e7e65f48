//! End-to-end solver scenarios.

use cassia_core::{Expression, Priority, Relate, Space, Term};
use cassia_solver::{Solver, SolverConfig, SolverError, Update};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-8,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_required_equality() {
    let mut space: Space = Space::new();
    let x = space.new_variable(0.0);
    let mut solver = Solver::new();

    solver.add_constraint(&x.equals(10.0)).unwrap();
    solver.flush_updates(&mut space);
    assert_close(space.value(x), 10.0);
}

#[test]
fn test_conflicting_inequalities_rejected() {
    let mut space: Space = Space::new();
    let x = space.new_variable(0.0);
    let mut solver = Solver::new();

    let floor = x.greater_than_or_equal_to(10.0);
    let ceiling = x.less_than_or_equal_to(5.0);
    solver.add_constraint(&floor).unwrap();
    assert_eq!(
        solver.add_constraint(&ceiling),
        Err(SolverError::UnsatisfiableConstraint(ceiling.id()))
    );
    assert!(solver.has_constraint(&floor));
    assert!(!solver.has_constraint(&ceiling));

    solver.flush_updates(&mut space);
    assert_close(space.value(x), 10.0);

    // The solver stays usable after a rejection.
    let exact = x.equals(12.0).with_priority(Priority::STRONG);
    solver.add_constraint(&exact).unwrap();
    assert_close(solver.value(x), 12.0);
}

#[test]
fn test_duplicate_rejected() {
    let mut space: Space = Space::new();
    let x = space.new_variable(0.0);
    let y = space.new_variable(0.0);
    let mut solver = Solver::new();

    let c = (x + y).equals(20.0);
    solver.add_constraint(&c).unwrap();
    solver
        .add_constraint(&x.equals(5.0).with_priority(Priority::WEAK))
        .unwrap();
    let before = (solver.value(x), solver.value(y));

    assert_eq!(
        solver.add_constraint(&c),
        Err(SolverError::DuplicateConstraint(c.id()))
    );
    assert_eq!(
        solver.add_constraint(&c.clone()),
        Err(SolverError::DuplicateConstraint(c.id()))
    );
    assert_eq!((solver.value(x), solver.value(y)), before);
}

#[test]
fn test_midpoint() {
    let mut space: Space = Space::new();
    let left = space.new_named_variable("left", 0.0);
    let mid = space.new_named_variable("mid", 0.0);
    let right = space.new_named_variable("right", 0.0);
    let mut solver = Solver::new();

    solver
        .add_constraints(&[
            (right + left).equals(mid * 2.0),
            (right - left).greater_than_or_equal_to(100.0),
            left.greater_than_or_equal_to(0.0),
        ])
        .unwrap();
    solver.flush_updates(&mut space);

    assert_close(space.value(left), 0.0);
    assert_close(space.value(mid), 50.0);
    assert_close(space.value(right), 100.0);
}

#[test]
fn test_priority_arbitration() {
    let mut space: Space<&str> = Space::new();
    let p1 = space.new_param_with_context(0.0, "p1");
    let p2 = space.new_param_with_context(0.0, "p2");
    let p3 = space.new_param_with_context(0.0, "p3");
    let container = space.new_param_with_context(0.0, "container");
    let mut solver = Solver::new();

    solver
        .add_constraint(&p1.greater_than_or_equal_to(30.0).with_priority(Priority::STRONG))
        .unwrap();
    solver
        .add_constraint(&p1.equals(p3).with_priority(Priority::MEDIUM))
        .unwrap();
    solver.add_constraint(&p2.equals(p1 * 2.0)).unwrap();
    solver
        .add_constraint(&container.equals(p1 + p2 + p3))
        .unwrap();
    solver
        .add_edit_variable(container.variable(), Priority::STRONG)
        .unwrap();
    solver.suggest_value(container.variable(), 100.0).unwrap();

    let mut updates = solver.flush_updates(&mut space);
    updates.sort_by(|a, b| a.context.cmp(b.context));
    let values: Vec<(&str, f64)> = updates
        .iter()
        .map(|Update { context, value }| (*context, *value))
        .collect();
    assert_eq!(values.len(), 4);

    assert_close(space.value(p1), 30.0);
    assert_close(space.value(p2), 60.0);
    assert_close(space.value(p3), 10.0);
    assert_close(space.value(container), 100.0);
    assert_eq!(values[0].0, "container");
    assert_close(values[0].1, 100.0);
}

#[test]
fn test_removal_restores_previous_solution() {
    let mut space: Space = Space::new();
    let x = space.new_variable(0.0);
    let y = space.new_variable(0.0);
    let mut solver = Solver::new();

    solver
        .add_constraint(&x.equals(10.0).with_priority(Priority::STRONG))
        .unwrap();
    solver
        .add_constraint(&y.equals(30.0).with_priority(Priority::STRONG))
        .unwrap();

    let link = (y - x).less_than_or_equal_to(5.0);
    solver.add_constraint(&link).unwrap();
    assert!(solver.value(y) - solver.value(x) <= 5.0 + 1e-8);

    solver.remove_constraint(&link).unwrap();
    assert_close(solver.value(x), 10.0);
    assert_close(solver.value(y), 30.0);
}

#[test]
fn test_edit_keeps_required_constraints_exact() {
    let mut space: Space = Space::new();
    let left = space.new_variable(0.0);
    let width = space.new_variable(0.0);
    let right = space.new_variable(0.0);
    let mut solver = Solver::new();

    let span = right.equals(left + width);
    let fixed = left.equals(20.0);
    let min_width = width.greater_than_or_equal_to(10.0);
    solver.add_constraints(&[span.clone(), fixed.clone(), min_width.clone()]).unwrap();
    solver.add_edit_variable(width, Priority::STRONG).unwrap();

    for suggestion in [50.0, 5.0, 80.0, 10.5] {
        solver.suggest_value(width, suggestion).unwrap();
        solver.flush_updates(&mut space);

        assert_close(space.value(left), 20.0);
        assert_close(space.value(right), space.value(left) + space.value(width));
        assert_close(space.value(width), suggestion.max(10.0));
    }
    assert!(solver.has_constraint(&span));
    assert!(solver.has_constraint(&fixed));
    assert!(solver.has_constraint(&min_width));
}

#[test]
fn test_flush_is_idempotent() {
    let mut space: Space<u32> = Space::new();
    let a = space.new_param_with_context(0.0, 1);
    let b = space.new_param_with_context(0.0, 2);
    let free = space.new_variable(0.0);
    let mut solver = Solver::new();

    solver.add_constraint(&a.equals(3.0)).unwrap();
    solver.add_constraint(&b.equals(a + free)).unwrap();
    solver
        .add_constraint(&free.equals(4.0).with_priority(Priority::WEAK))
        .unwrap();

    let first = solver.flush_updates(&mut space);
    let snapshot: Vec<f64> = space.variables().map(|v| space.value(v)).collect();
    let second = solver.flush_updates(&mut space);
    let again: Vec<f64> = space.variables().map(|v| space.value(v)).collect();

    assert_eq!(first, second);
    assert_eq!(snapshot, again);
    assert_eq!(first.len(), 2);
    assert_close(space.value(b), 7.0);
}

#[test]
fn test_bulk_add_rolls_back() {
    let mut space: Space = Space::new();
    let x = space.new_variable(0.0);
    let y = space.new_variable(0.0);
    let mut solver = Solver::new();

    let ok_a = y.equals(x + 1.0);
    let ok_b = x.greater_than_or_equal_to(2.0);
    let bad = x.less_than_or_equal_to(1.0);
    let after = y.equals(100.0);

    let result = solver.add_constraints(&[ok_a.clone(), ok_b.clone(), bad.clone(), after.clone()]);
    assert_eq!(result, Err(SolverError::UnsatisfiableConstraint(bad.id())));
    for c in [&ok_a, &ok_b, &bad, &after] {
        assert!(!solver.has_constraint(c));
    }

    // Nothing from the failed batch lingers.
    solver.add_constraint(&x.equals(-5.0)).unwrap();
    assert_close(solver.value(x), -5.0);
}

#[test]
fn test_bulk_remove_rolls_back() {
    let mut space: Space = Space::new();
    let x = space.new_variable(0.0);
    let mut solver = Solver::new();

    let present = x.equals(8.0);
    let missing = x.equals(9.0);
    solver.add_constraint(&present).unwrap();

    assert_eq!(
        solver.remove_constraints([&present, &missing]),
        Err(SolverError::UnknownConstraint(missing.id()))
    );
    assert!(solver.has_constraint(&present));
    assert_close(solver.value(x), 8.0);

    solver.remove_constraints([&present]).unwrap();
    assert!(!solver.has_constraint(&present));
}

#[test]
fn test_edit_lifecycle() {
    let mut space: Space = Space::new();
    let x = space.new_variable(0.0);
    let mut solver = Solver::new();

    solver
        .add_constraint(&x.equals(40.0).with_priority(Priority::WEAK))
        .unwrap();
    solver.add_edit_variable(x, Priority::MEDIUM).unwrap();
    solver.suggest_value(x, 75.0).unwrap();
    assert_close(solver.value(x), 75.0);

    solver.remove_edit_variable(x).unwrap();
    assert_close(solver.value(x), 40.0);

    // Suggestions without an edit are ignored.
    solver.suggest_value(x, 1.0).unwrap();
    assert_close(solver.value(x), 40.0);

    solver.add_edit_variable(x, Priority::MEDIUM).unwrap();
    solver.suggest_value(x, -12.5).unwrap();
    assert_close(solver.value(x), -12.5);
}

#[test]
fn test_edit_chain() {
    let mut space: Space = Space::new();
    let a = space.new_param(0.0);
    let b = space.new_param(0.0);
    let c = space.new_param(0.0);
    let mut solver = Solver::new();

    solver.add_constraint(&b.equals(a + 10.0)).unwrap();
    solver.add_constraint(&c.equals(b * 2.0)).unwrap();
    solver.add_edit_variable(a.variable(), Priority::STRONG).unwrap();

    solver.suggest_value(a.variable(), 5.0).unwrap();
    solver.flush_updates(&mut space);
    assert_close(space.value(a), 5.0);
    assert_close(space.value(b), 15.0);
    assert_close(space.value(c), 30.0);

    solver.suggest_value(a.variable(), -10.0).unwrap();
    solver.flush_updates(&mut space);
    assert_close(space.value(b), 0.0);
    assert_close(space.value(c), 0.0);
}

#[test]
fn test_explicit_expression_constraint() {
    let mut space: Space = Space::new();
    let x = space.new_variable(0.0);
    let y = space.new_variable(0.0);
    let mut solver = Solver::new();

    // 2x + 3y - 12 == 0, x == 3
    let expr = Expression::new([Term::new(x, 2.0), Term::new(y, 3.0)], -12.0);
    solver
        .add_constraint(&cassia_core::Constraint::new(expr, cassia_core::Relation::EqualTo))
        .unwrap();
    solver.add_constraint(&x.equals(3.0)).unwrap();
    assert_close(solver.value(x), 3.0);
    assert_close(solver.value(y), 2.0);
}

#[test]
fn test_iteration_ceiling() {
    let mut space: Space = Space::new();
    let x = space.new_variable(0.0);

    let mut capped = Solver::with_config(SolverConfig::new().with_max_iterations(0));
    capped
        .add_constraint(&x.equals(10.0).with_priority(Priority::WEAK))
        .unwrap();
    assert_eq!(
        capped.add_constraint(&x.equals(20.0).with_priority(Priority::STRONG)),
        Err(SolverError::IterationLimit { limit: 0 })
    );

    let mut solver = Solver::new();
    assert_eq!(solver.config().max_iterations, SolverConfig::DEFAULT_MAX_ITERATIONS);
    solver
        .add_constraint(&x.equals(10.0).with_priority(Priority::WEAK))
        .unwrap();
    solver
        .add_constraint(&x.equals(20.0).with_priority(Priority::STRONG))
        .unwrap();
    assert_close(solver.value(x), 20.0);
}
