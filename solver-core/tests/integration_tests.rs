//! End-to-end tests for the simplex relaxation solver.

use std::time::Instant;

use solver_core::{
    solve, solve_with_bounds, ConstraintSense, CoreError, LinearExpr, LinearModel, ObjectiveSense,
    SolveStatus, SolverSettings, VarType,
};

fn expr(terms: &[(usize, f64)]) -> LinearExpr {
    terms.iter().copied().collect()
}

fn nonneg(model: &mut LinearModel) -> usize {
    model.add_variable(VarType::Continuous, 0.0, f64::INFINITY)
}

#[test]
fn test_simple_lp() {
    // min x1 + x2  s.t.  x1 + x2 = 1, x >= 0
    let mut m = LinearModel::new();
    let x1 = nonneg(&mut m);
    let x2 = nonneg(&mut m);
    m.add_constraint(expr(&[(x1, 1.0), (x2, 1.0)]), ConstraintSense::Eq, 1.0)
        .unwrap();
    m.set_objective(expr(&[(x1, 1.0), (x2, 1.0)]), ObjectiveSense::Minimize)
        .unwrap();

    let result = solve(&m, &SolverSettings::default()).expect("Solve failed");

    assert_eq!(result.status, SolveStatus::Optimal);
    assert!((result.obj_val - 1.0).abs() < 1e-9);
    assert!((result.x[0] + result.x[1] - 1.0).abs() < 1e-9);
    assert!(m.max_violation(&result.x) < 1e-9);
}

#[test]
fn test_lp_with_inequality_maximize() {
    // max 3x + 5y  s.t.  x <= 4, 2y <= 12, 3x + 2y <= 18
    let mut m = LinearModel::new();
    let x = nonneg(&mut m);
    let y = nonneg(&mut m);
    m.add_constraint(expr(&[(x, 1.0)]), ConstraintSense::Le, 4.0).unwrap();
    m.add_constraint(expr(&[(y, 2.0)]), ConstraintSense::Le, 12.0).unwrap();
    m.add_constraint(expr(&[(x, 3.0), (y, 2.0)]), ConstraintSense::Le, 18.0)
        .unwrap();
    m.set_objective(expr(&[(x, 3.0), (y, 5.0)]), ObjectiveSense::Maximize)
        .unwrap();

    let result = solve(&m, &SolverSettings::default()).unwrap();
    assert_eq!(result.status, SolveStatus::Optimal);
    assert!((result.obj_val - 36.0).abs() < 1e-9);
    assert!((result.x[x] - 2.0).abs() < 1e-9);
    assert!((result.x[y] - 6.0).abs() < 1e-9);
}

#[test]
fn test_greater_equal_rows_need_phase_one() {
    // min 2x + 3y  s.t.  x + y >= 4, x + 3y >= 6
    let mut m = LinearModel::new();
    let x = nonneg(&mut m);
    let y = nonneg(&mut m);
    m.add_constraint(expr(&[(x, 1.0), (y, 1.0)]), ConstraintSense::Ge, 4.0)
        .unwrap();
    m.add_constraint(expr(&[(x, 1.0), (y, 3.0)]), ConstraintSense::Ge, 6.0)
        .unwrap();
    m.set_objective(expr(&[(x, 2.0), (y, 3.0)]), ObjectiveSense::Minimize)
        .unwrap();

    let result = solve(&m, &SolverSettings::default()).unwrap();
    assert_eq!(result.status, SolveStatus::Optimal);
    // Vertex (3, 1)
    assert!((result.obj_val - 9.0).abs() < 1e-9);
    assert!(result.info.phase1_pivots > 0);
}

#[test]
fn test_infeasible_lp() {
    // x + y <= 1 and x + y >= 2
    let mut m = LinearModel::new();
    let x = nonneg(&mut m);
    let y = nonneg(&mut m);
    m.add_constraint(expr(&[(x, 1.0), (y, 1.0)]), ConstraintSense::Le, 1.0)
        .unwrap();
    m.add_constraint(expr(&[(x, 1.0), (y, 1.0)]), ConstraintSense::Ge, 2.0)
        .unwrap();

    let result = solve(&m, &SolverSettings::default()).unwrap();
    assert_eq!(result.status, SolveStatus::Infeasible);
    assert!(result.x.is_empty());
}

#[test]
fn test_unbounded_lp() {
    // max x + y  s.t.  x - y <= 1
    let mut m = LinearModel::new();
    let x = nonneg(&mut m);
    let y = nonneg(&mut m);
    m.add_constraint(expr(&[(x, 1.0), (y, -1.0)]), ConstraintSense::Le, 1.0)
        .unwrap();
    m.set_objective(expr(&[(x, 1.0), (y, 1.0)]), ObjectiveSense::Maximize)
        .unwrap();

    let result = solve(&m, &SolverSettings::default()).unwrap();
    assert_eq!(result.status, SolveStatus::Unbounded);
}

#[test]
fn test_bound_overrides_replace_model_bounds() {
    // max x + y  s.t.  x + y <= 1.5, binaries relaxed
    let mut m = LinearModel::new();
    let x = m.add_binary();
    let y = m.add_binary();
    m.add_constraint(expr(&[(x, 1.0), (y, 1.0)]), ConstraintSense::Le, 1.5)
        .unwrap();
    m.set_objective(expr(&[(x, 1.0), (y, 1.0)]), ObjectiveSense::Maximize)
        .unwrap();

    let settings = SolverSettings::default();
    let relaxed = solve(&m, &settings).unwrap();
    assert!((relaxed.obj_val - 1.5).abs() < 1e-9);

    // Fix y = 0
    let fixed = solve_with_bounds(&m, &[0.0, 0.0], &[1.0, 0.0], &settings).unwrap();
    assert_eq!(fixed.status, SolveStatus::Optimal);
    assert!((fixed.obj_val - 1.0).abs() < 1e-9);
    assert_eq!(fixed.x[y], 0.0);
}

/// Beale's example: cycles under the textbook largest-coefficient rule.
fn beale() -> LinearModel {
    let mut m = LinearModel::new();
    let x4 = nonneg(&mut m);
    let x5 = nonneg(&mut m);
    let x6 = m.add_variable(VarType::Continuous, 0.0, 1.0);
    let x7 = nonneg(&mut m);
    m.add_constraint(
        expr(&[(x4, 0.25), (x5, -8.0), (x6, -1.0), (x7, 9.0)]),
        ConstraintSense::Le,
        0.0,
    )
    .unwrap();
    m.add_constraint(
        expr(&[(x4, 0.5), (x5, -12.0), (x6, -0.5), (x7, 3.0)]),
        ConstraintSense::Le,
        0.0,
    )
    .unwrap();
    m.set_objective(
        expr(&[(x4, -0.75), (x5, 20.0), (x6, -0.5), (x7, 6.0)]),
        ObjectiveSense::Minimize,
    )
    .unwrap();
    m
}

#[test]
fn test_degenerate_lp_terminates() {
    let m = beale();
    for stall_factor in [1, 10] {
        let settings = SolverSettings {
            stall_factor,
            ..Default::default()
        };
        let result = solve(&m, &settings).unwrap();
        assert_eq!(result.status, SolveStatus::Optimal);
        assert!((result.obj_val + 1.25).abs() < 1e-9, "obj = {}", result.obj_val);
        if stall_factor == 1 {
            // Dantzig cycles on Beale's rows; only Bland's rule gets out
            assert!(result.info.bland_pivots > 0, "info = {:?}", result.info);
        }
    }
}

#[test]
fn test_solves_are_deterministic() {
    let m = beale();
    let settings = SolverSettings::default();
    let a = solve(&m, &settings).unwrap();
    let b = solve(&m, &settings).unwrap();
    assert_eq!(a.x, b.x);
    assert_eq!(a.info.pivots, b.info.pivots);
    assert_eq!(a.info.bland_pivots, b.info.bland_pivots);
}

#[test]
fn test_variable_bounds_add_no_rows() {
    // max 60 x0 + 100 x1 + 120 x2  s.t.  10 x0 + 20 x1 + 30 x2 <= 50, x in [0, 1]
    let mut m = LinearModel::new();
    let xs: Vec<usize> = (0..3).map(|_| m.add_binary()).collect();
    m.add_constraint(
        expr(&[(xs[0], 10.0), (xs[1], 20.0), (xs[2], 30.0)]),
        ConstraintSense::Le,
        50.0,
    )
    .unwrap();
    m.set_objective(
        expr(&[(xs[0], 60.0), (xs[1], 100.0), (xs[2], 120.0)]),
        ObjectiveSense::Maximize,
    )
    .unwrap();

    let result = solve(&m, &SolverSettings::default()).unwrap();
    assert_eq!(result.status, SolveStatus::Optimal);
    assert!((result.obj_val - 240.0).abs() < 1e-9);
    assert!((result.x[2] - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(result.info.rows, 1);
    assert!(result.info.bound_flips > 0);
    assert!(m.max_violation(&result.x) < 1e-9);
}

#[test]
fn test_expired_deadline() {
    let m = beale();
    let settings = SolverSettings {
        deadline: Some(Instant::now()),
        ..Default::default()
    };
    assert_eq!(solve(&m, &settings).unwrap_err(), CoreError::TimeLimit);
}
