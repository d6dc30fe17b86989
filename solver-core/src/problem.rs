//! Problem data structures and validation.
//!
//! This module defines the linear model handed to the LP and MILP layers:
//!
//! ```text
//! minimize / maximize   c^T x
//! subject to            a_i^T x  (<= | = | >=)  b_i
//!                       l <= x <= u
//!                       x_j integer for j in I
//! ```
//!
//! Constraints are stored as data (variable index + coefficient), never as
//! closures, so a model can be inspected, validated and re-solved under
//! different bounds without rebuilding it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{CoreError, CoreResult};
use crate::linalg::sparse::{self, SparseCsc};

/// Default tolerance used by [`LinearModel::is_feasible`].
pub const DEFAULT_FEAS_TOL: f64 = 1e-6;

/// Variable domain kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    /// Continuous variable
    Continuous,
    /// Non-negative integer variable
    Integer,
    /// Binary variable (0 or 1)
    Binary,
}

impl VarType {
    /// True for `Integer` and `Binary`.
    pub fn is_integral(self) -> bool {
        matches!(self, VarType::Integer | VarType::Binary)
    }
}

/// A decision variable owned by a [`LinearModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Stable index in the owning model.
    pub index: usize,
    /// Domain kind.
    pub var_type: VarType,
    /// Lower bound (may be -∞ for continuous variables).
    pub lower: f64,
    /// Upper bound (may be +∞).
    pub upper: f64,
    /// Last relaxed value written back by a solve, if any.
    pub value: Option<f64>,
}

/// Sparse linear expression `Σ coef_j * x_j`.
///
/// Keys are unique; adding a term for an existing variable accumulates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: BTreeMap<usize, f64>,
}

impl LinearExpr {
    /// Empty expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style term addition.
    pub fn with_term(mut self, var: usize, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    /// Add `coef * x_var` to the expression.
    pub fn add_term(&mut self, var: usize, coef: f64) {
        *self.terms.entry(var).or_insert(0.0) += coef;
    }

    /// Coefficient of a variable (0 if absent).
    pub fn coef(&self, var: usize) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.0)
    }

    /// Iterate `(var, coef)` in increasing variable order.
    pub fn terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.terms.iter().map(|(&v, &c)| (v, c))
    }

    /// Number of stored terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True if there are no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Largest referenced variable index.
    pub fn max_var(&self) -> Option<usize> {
        self.terms.keys().next_back().copied()
    }

    /// Evaluate against a dense assignment.
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        self.terms.iter().map(|(&v, &c)| c * x[v]).sum()
    }
}

impl FromIterator<(usize, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (usize, f64)>>(iter: I) -> Self {
        let mut expr = LinearExpr::new();
        for (var, coef) in iter {
            expr.add_term(var, coef);
        }
        expr
    }
}

/// Comparison sense of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    /// `a^T x <= b`
    Le,
    /// `a^T x = b`
    Eq,
    /// `a^T x >= b`
    Ge,
}

impl ConstraintSense {
    /// Sense obtained by multiplying the row by -1.
    pub fn flipped(self) -> Self {
        match self {
            ConstraintSense::Le => ConstraintSense::Ge,
            ConstraintSense::Eq => ConstraintSense::Eq,
            ConstraintSense::Ge => ConstraintSense::Le,
        }
    }
}

impl fmt::Display for ConstraintSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintSense::Le => write!(f, "<="),
            ConstraintSense::Eq => write!(f, "="),
            ConstraintSense::Ge => write!(f, ">="),
        }
    }
}

/// A linear constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Left-hand side.
    pub expr: LinearExpr,
    /// Comparison sense.
    pub sense: ConstraintSense,
    /// Right-hand side.
    pub rhs: f64,
    /// Optional name for debugging.
    pub name: Option<String>,
}

impl Constraint {
    /// Amount by which `x` violates the constraint (0 when satisfied).
    pub fn violation(&self, x: &[f64]) -> f64 {
        let lhs = self.expr.evaluate(x);
        match self.sense {
            ConstraintSense::Le => (lhs - self.rhs).max(0.0),
            ConstraintSense::Ge => (self.rhs - lhs).max(0.0),
            ConstraintSense::Eq => (lhs - self.rhs).abs(),
        }
    }

    /// Check the constraint within tolerance.
    pub fn is_satisfied(&self, x: &[f64], tol: f64) -> bool {
        self.violation(x) <= tol
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectiveSense {
    /// Minimize the objective.
    #[default]
    Minimize,
    /// Maximize the objective.
    Maximize,
}

impl ObjectiveSense {
    /// Multiplier that turns the objective into a minimization.
    pub fn sign(self) -> f64 {
        match self {
            ObjectiveSense::Minimize => 1.0,
            ObjectiveSense::Maximize => -1.0,
        }
    }

    /// True if `a` is strictly better than `b` by more than `tol`.
    pub fn is_better(self, a: f64, b: f64, tol: f64) -> bool {
        match self {
            ObjectiveSense::Minimize => a < b - tol,
            ObjectiveSense::Maximize => a > b + tol,
        }
    }

    /// Worst possible objective value (starting point for an incumbent).
    pub fn worst(self) -> f64 {
        match self {
            ObjectiveSense::Minimize => f64::INFINITY,
            ObjectiveSense::Maximize => f64::NEG_INFINITY,
        }
    }
}

/// Objective function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Objective {
    /// Linear expression to optimize.
    pub expr: LinearExpr,
    /// Direction.
    pub sense: ObjectiveSense,
}

/// Mixed-integer linear model.
///
/// Owns its variables, constraints and objective. Every expression stored in
/// the model references only variables registered through
/// [`LinearModel::add_variable`].
#[derive(Debug, Clone, Default)]
pub struct LinearModel {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Objective,
}

impl LinearModel {
    /// Create an empty model (minimize 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable and return its index.
    ///
    /// Binary variables are clamped to `[0, 1]` and integer variables to
    /// `[0, +∞)` intersected with the given bounds.
    pub fn add_variable(&mut self, var_type: VarType, lower: f64, upper: f64) -> usize {
        let (lower, upper) = match var_type {
            VarType::Binary => (lower.max(0.0), upper.min(1.0)),
            VarType::Integer => (lower.max(0.0), upper),
            VarType::Continuous => (lower, upper),
        };
        let index = self.variables.len();
        self.variables.push(Variable {
            index,
            var_type,
            lower,
            upper,
            value: None,
        });
        index
    }

    /// Shorthand for a `[0, 1]` binary variable.
    pub fn add_binary(&mut self) -> usize {
        self.add_variable(VarType::Binary, 0.0, 1.0)
    }

    /// Add a constraint and return its row index.
    pub fn add_constraint(
        &mut self,
        expr: LinearExpr,
        sense: ConstraintSense,
        rhs: f64,
    ) -> CoreResult<usize> {
        self.check_refs(&expr)?;
        self.constraints.push(Constraint {
            expr,
            sense,
            rhs,
            name: None,
        });
        Ok(self.constraints.len() - 1)
    }

    /// Add a named constraint.
    pub fn add_named_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        sense: ConstraintSense,
        rhs: f64,
    ) -> CoreResult<usize> {
        let row = self.add_constraint(expr, sense, rhs)?;
        self.constraints[row].name = Some(name.into());
        Ok(row)
    }

    /// Replace the objective.
    pub fn set_objective(&mut self, expr: LinearExpr, sense: ObjectiveSense) -> CoreResult<()> {
        self.check_refs(&expr)?;
        self.objective = Objective { expr, sense };
        Ok(())
    }

    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    /// Number of constraints.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Registered variables, in index order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Constraints, in insertion order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The objective.
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Objective direction.
    pub fn sense(&self) -> ObjectiveSense {
        self.objective.sense
    }

    /// Indices of integer and binary variables.
    pub fn integer_vars(&self) -> Vec<usize> {
        self.variables
            .iter()
            .filter(|v| v.var_type.is_integral())
            .map(|v| v.index)
            .collect()
    }

    /// Lower bounds of all variables.
    pub fn lower_bounds(&self) -> Vec<f64> {
        self.variables.iter().map(|v| v.lower).collect()
    }

    /// Upper bounds of all variables.
    pub fn upper_bounds(&self) -> Vec<f64> {
        self.variables.iter().map(|v| v.upper).collect()
    }

    /// Objective value of an assignment.
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        self.objective.expr.evaluate(x)
    }

    /// Feasibility check with the default tolerance (1e-6).
    pub fn is_feasible(&self, x: &[f64]) -> bool {
        self.is_feasible_with_tol(x, DEFAULT_FEAS_TOL)
    }

    /// Check constraints, bounds and integrality within `tol`.
    pub fn is_feasible_with_tol(&self, x: &[f64], tol: f64) -> bool {
        if x.len() != self.num_vars() {
            return false;
        }
        let domains_ok = self.variables.iter().all(|v| {
            let val = x[v.index];
            if val < v.lower - tol || val > v.upper + tol {
                return false;
            }
            !v.var_type.is_integral() || (val - val.round()).abs() <= tol
        });
        domains_ok && self.constraints.iter().all(|c| c.is_satisfied(x, tol))
    }

    /// Largest constraint violation of an assignment.
    pub fn max_violation(&self, x: &[f64]) -> f64 {
        self.constraints
            .iter()
            .map(|c| c.violation(x))
            .fold(0.0_f64, f64::max)
    }

    /// Write relaxed values back onto the variables.
    pub fn set_values(&mut self, x: &[f64]) -> CoreResult<()> {
        if x.len() != self.num_vars() {
            return Err(CoreError::DimensionMismatch {
                expected: self.num_vars(),
                got: x.len(),
            });
        }
        for (var, &val) in self.variables.iter_mut().zip(x) {
            var.value = Some(val);
        }
        Ok(())
    }

    /// Re-check every reference and bound in the model.
    pub fn validate(&self) -> CoreResult<()> {
        for var in &self.variables {
            if var.lower.is_nan() || var.upper.is_nan() {
                return Err(CoreError::InvalidBounds {
                    var: var.index,
                    lower: var.lower,
                    upper: var.upper,
                });
            }
        }
        for c in &self.constraints {
            self.check_refs(&c.expr)?;
        }
        self.check_refs(&self.objective.expr)
    }

    /// Constraint matrix (rows = constraints, cols = variables) in CSC format.
    pub fn constraint_matrix(&self) -> SparseCsc {
        let triplets = self
            .constraints
            .iter()
            .enumerate()
            .flat_map(|(row, c)| c.expr.terms().map(move |(col, coef)| (row, col, coef)));
        sparse::from_triplets(self.num_constraints(), self.num_vars(), triplets)
    }

    fn check_refs(&self, expr: &LinearExpr) -> CoreResult<()> {
        match expr.max_var() {
            Some(var) if var >= self.num_vars() => Err(CoreError::InvalidReference {
                var,
                num_vars: self.num_vars(),
            }),
            _ => Ok(()),
        }
    }
}

/// Simplex solver settings.
#[derive(Debug, Clone)]
pub struct SolverSettings {
    /// Hard cap on pivots per solve (both phases).
    pub max_pivots: usize,

    /// Switch to Bland's rule after `stall_factor * num_columns` consecutive
    /// pivots without objective improvement.
    pub stall_factor: usize,

    /// Phase-1 infeasibility threshold.
    pub tol_feas: f64,

    /// Smallest magnitude accepted as a pivot element.
    pub tol_pivot: f64,

    /// Reduced-cost optimality tolerance.
    pub tol_opt: f64,

    /// Enable verbose logging
    pub verbose: bool,

    /// Give up with [`CoreError::TimeLimit`] once this instant has passed.
    pub deadline: Option<Instant>,

    /// Give up with [`CoreError::Interrupted`] once this flag is raised.
    pub interrupt: Option<Arc<AtomicBool>>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_pivots: 100_000,
            stall_factor: 10,
            tol_feas: 1e-7,
            tol_pivot: 1e-9,
            tol_opt: 1e-9,
            verbose: false,
            deadline: None,
            interrupt: None,
        }
    }
}

impl SolverSettings {
    /// Fail if the deadline has passed or the interrupt flag is raised.
    pub fn check_budget(&self) -> CoreResult<()> {
        if self
            .interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return Err(CoreError::Interrupted);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(CoreError::TimeLimit);
        }
        Ok(())
    }
}

/// LP relaxation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Optimal vertex found
    Optimal,

    /// No point satisfies the constraints and bounds
    Infeasible,

    /// Objective can be improved without limit
    Unbounded,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "Optimal"),
            SolveStatus::Infeasible => write!(f, "Infeasible"),
            SolveStatus::Unbounded => write!(f, "Unbounded"),
        }
    }
}

/// Result of an LP relaxation solve.
#[derive(Debug, Clone)]
pub struct SolveResult {
    /// Solution status
    pub status: SolveStatus,

    /// Primal solution over the reals (empty unless optimal)
    pub x: Vec<f64>,

    /// Objective value in the model's own sense (NaN unless optimal)
    pub obj_val: f64,

    /// Pivot statistics
    pub info: SolveInfo,
}

impl SolveResult {
    /// Result without a primal point.
    pub fn without_point(status: SolveStatus, info: SolveInfo) -> Self {
        Self {
            status,
            x: Vec::new(),
            obj_val: f64::NAN,
            info,
        }
    }
}

/// Pivot statistics from a simplex run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolveInfo {
    /// Total pivots in both phases
    pub pivots: usize,

    /// Pivots spent in phase 1
    pub phase1_pivots: usize,

    /// Pivots taken under Bland's rule
    pub bland_pivots: usize,

    /// Nonbasic columns moved between their bounds without a pivot
    pub bound_flips: usize,

    /// Rows of the standard-form tableau
    pub rows: usize,

    /// Columns of the standard-form tableau (excluding rhs)
    pub cols: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_model() -> LinearModel {
        // max x0 + 2 x1  s.t.  x0 + x1 <= 3, x0 binary, x1 integer in [0, 2]
        let mut m = LinearModel::new();
        let x0 = m.add_binary();
        let x1 = m.add_variable(VarType::Integer, -5.0, 2.0);
        m.add_constraint(
            LinearExpr::new().with_term(x0, 1.0).with_term(x1, 1.0),
            ConstraintSense::Le,
            3.0,
        )
        .unwrap();
        m.set_objective(
            LinearExpr::new().with_term(x0, 1.0).with_term(x1, 2.0),
            ObjectiveSense::Maximize,
        )
        .unwrap();
        m
    }

    #[test]
    fn test_add_variable_clamps_domains() {
        let m = small_model();
        assert_eq!(m.num_vars(), 2);
        assert_eq!(m.variables()[0].lower, 0.0);
        assert_eq!(m.variables()[0].upper, 1.0);
        // Integer variables are non-negative
        assert_eq!(m.variables()[1].lower, 0.0);
        assert_eq!(m.variables()[1].upper, 2.0);
        assert_eq!(m.integer_vars(), vec![0, 1]);
    }

    #[test]
    fn test_invalid_reference() {
        let mut m = small_model();
        let err = m
            .add_constraint(LinearExpr::new().with_term(7, 1.0), ConstraintSense::Eq, 1.0)
            .unwrap_err();
        assert_eq!(err, CoreError::InvalidReference { var: 7, num_vars: 2 });
        assert_eq!(m.num_constraints(), 1);

        let err = m
            .set_objective(LinearExpr::new().with_term(2, 1.0), ObjectiveSense::Minimize)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidReference { var: 2, .. }));
    }

    #[test]
    fn test_expression_accumulates() {
        let e = LinearExpr::new().with_term(1, 2.0).with_term(1, 3.0).with_term(0, 1.0);
        assert_eq!(e.len(), 2);
        assert_eq!(e.coef(1), 5.0);
        assert_eq!(e.evaluate(&[2.0, 1.0]), 7.0);
        assert_eq!(e.max_var(), Some(1));
    }

    #[test]
    fn test_evaluate_and_feasibility() {
        let m = small_model();
        assert_eq!(m.evaluate(&[1.0, 2.0]), 5.0);
        assert!(m.is_feasible(&[1.0, 2.0]));
        // Bound violation
        assert!(!m.is_feasible(&[1.0, 3.0]));
        // Integrality violation
        assert!(!m.is_feasible(&[0.5, 2.0]));
        // Within tolerance
        assert!(m.is_feasible(&[1.0 + 1e-8, 2.0]));
        // Looser tolerance accepts a small violation
        assert!(m.is_feasible_with_tol(&[1.0, 2.01], 0.05));
        // Wrong length
        assert!(!m.is_feasible(&[1.0]));
    }

    #[test]
    fn test_constraint_violation() {
        let c = Constraint {
            expr: LinearExpr::new().with_term(0, 1.0),
            sense: ConstraintSense::Ge,
            rhs: 2.0,
            name: None,
        };
        assert_eq!(c.violation(&[1.5]), 0.5);
        assert_eq!(c.violation(&[3.0]), 0.0);
    }

    #[test]
    fn test_constraint_matrix() {
        let m = small_model();
        let a = m.constraint_matrix();
        assert_eq!(a.rows(), 1);
        assert_eq!(a.cols(), 2);
        assert_eq!(a.nnz(), 2);
    }

    #[test]
    fn test_set_values() {
        let mut m = small_model();
        m.set_values(&[1.0, 0.5]).unwrap();
        assert_eq!(m.variables()[1].value, Some(0.5));
        assert!(m.set_values(&[1.0]).is_err());
    }

    #[test]
    fn test_sense_helpers() {
        assert!(ObjectiveSense::Minimize.is_better(1.0, 2.0, 1e-9));
        assert!(ObjectiveSense::Maximize.is_better(2.0, 1.0, 1e-9));
        assert!(!ObjectiveSense::Maximize.is_better(1.0, 1.0, 1e-9));
        assert_eq!(ConstraintSense::Le.flipped(), ConstraintSense::Ge);
    }
}
