//! MIP problem representation.

use solver_core::{LinearModel, VarType};

use crate::error::MipResult;

/// Mixed-integer problem wrapper.
///
/// Extracts and organizes integrality information from a `LinearModel`.
/// All bound and objective comparisons in the search are done in
/// minimization form: `internal = sense_sign * native`.
#[derive(Debug, Clone)]
pub struct MipProblem {
    /// Original linear model (shared read-only by every search node).
    pub model: LinearModel,

    /// Indices of integer variables (includes binary).
    pub integer_vars: Vec<usize>,

    /// Indices of binary variables (subset of integer_vars).
    pub binary_vars: Vec<usize>,

    /// Root lower bounds for all variables.
    pub var_lb: Vec<f64>,

    /// Root upper bounds for all variables.
    pub var_ub: Vec<f64>,

    /// +1 for minimization, -1 for maximization.
    pub sense_sign: f64,

    /// Every feasible objective value is an integer.
    pub objective_integral: bool,
}

impl MipProblem {
    /// Create a MipProblem from a LinearModel.
    ///
    /// Re-validates every reference in the model.
    pub fn new(model: LinearModel) -> MipResult<Self> {
        model.validate()?;

        let mut integer_vars = Vec::new();
        let mut binary_vars = Vec::new();
        for var in model.variables() {
            match var.var_type {
                VarType::Integer => integer_vars.push(var.index),
                VarType::Binary => {
                    integer_vars.push(var.index);
                    binary_vars.push(var.index);
                }
                VarType::Continuous => {}
            }
        }

        let objective_integral = model.objective().expr.terms().all(|(j, c)| {
            c == c.round() && model.variables()[j].var_type.is_integral()
        });

        Ok(Self {
            var_lb: model.lower_bounds(),
            var_ub: model.upper_bounds(),
            sense_sign: model.sense().sign(),
            objective_integral,
            integer_vars,
            binary_vars,
            model,
        })
    }

    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.model.num_vars()
    }

    /// Number of constraints.
    pub fn num_constraints(&self) -> usize {
        self.model.num_constraints()
    }

    /// Number of integer variables (including binary).
    pub fn num_integers(&self) -> usize {
        self.integer_vars.len()
    }

    /// Check if a solution is integer-feasible within tolerance.
    pub fn is_integer_feasible(&self, x: &[f64], tol: f64) -> bool {
        self.integer_vars
            .iter()
            .all(|&i| (x[i] - x[i].round()).abs() <= tol)
    }

    /// Get the fractionality of a variable (distance to nearest integer).
    pub fn fractionality(&self, val: f64) -> f64 {
        let frac = val.fract().abs();
        frac.min(1.0 - frac)
    }

    /// Round integer variables to nearest integer.
    pub fn round_integers(&self, x: &mut [f64]) {
        for &i in &self.integer_vars {
            x[i] = x[i].round();
        }
    }

    /// Get fractional integer variables and their values.
    ///
    /// Returns (var_index, current_value, fractionality) for each fractional
    /// variable, in increasing index order.
    pub fn get_fractional_vars(&self, x: &[f64], tol: f64) -> Vec<(usize, f64, f64)> {
        self.integer_vars
            .iter()
            .filter_map(|&i| {
                let frac = self.fractionality(x[i]);
                (frac > tol).then_some((i, x[i], frac))
            })
            .collect()
    }

    /// Objective of an assignment in minimization form.
    pub fn internal_objective(&self, x: &[f64]) -> f64 {
        self.sense_sign * self.model.evaluate(x)
    }

    /// Convert a minimization-form value back to the model's sense.
    pub fn native_objective(&self, internal: f64) -> f64 {
        self.sense_sign * internal
    }

    /// Turn a relaxation value (native sense) into a dual bound usable for pruning.
    ///
    /// With an integral objective the bound rounds up to the next integer.
    pub fn dual_bound(&self, relaxation_obj: f64, tol: f64) -> f64 {
        let bound = self.sense_sign * relaxation_obj;
        if self.objective_integral && bound.is_finite() {
            (bound - tol).ceil()
        } else {
            bound
        }
    }

    /// Bounds after applying a sequence of `(var, lb, ub)` overrides.
    pub fn bounds_with<I>(&self, overrides: I) -> (Vec<f64>, Vec<f64>)
    where
        I: IntoIterator<Item = (usize, f64, f64)>,
    {
        let mut lb = self.var_lb.clone();
        let mut ub = self.var_ub.clone();
        for (var, lo, hi) in overrides {
            lb[var] = lo;
            ub[var] = hi;
        }
        (lb, ub)
    }

    /// Check if a point satisfies variable bounds.
    pub fn satisfies_bounds(&self, x: &[f64], tol: f64) -> bool {
        (0..self.num_vars()).all(|i| x[i] >= self.var_lb[i] - tol && x[i] <= self.var_ub[i] + tol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solver_core::{ConstraintSense, LinearExpr, ObjectiveSense};

    fn simple_milp() -> LinearModel {
        // max 3 x0 + 2 x1  s.t.  x0 + x1 >= 1, x0 binary, x1 continuous in [0, 4]
        let mut m = LinearModel::new();
        let x0 = m.add_binary();
        let x1 = m.add_variable(VarType::Continuous, 0.0, 4.0);
        m.add_constraint(
            LinearExpr::new().with_term(x0, 1.0).with_term(x1, 1.0),
            ConstraintSense::Ge,
            1.0,
        )
        .unwrap();
        m.set_objective(
            LinearExpr::new().with_term(x0, 3.0).with_term(x1, 2.0),
            ObjectiveSense::Maximize,
        )
        .unwrap();
        m
    }

    #[test]
    fn test_mip_problem_creation() {
        let mip = MipProblem::new(simple_milp()).unwrap();

        assert_eq!(mip.num_vars(), 2);
        assert_eq!(mip.num_integers(), 1);
        assert_eq!(mip.integer_vars, vec![0]);
        assert_eq!(mip.binary_vars, vec![0]);
        assert_eq!(mip.sense_sign, -1.0);
        // Continuous variable in the objective
        assert!(!mip.objective_integral);

        // Binary var should have [0, 1] bounds
        assert_eq!(mip.var_lb[0], 0.0);
        assert_eq!(mip.var_ub[0], 1.0);
    }

    #[test]
    fn test_integer_feasibility() {
        let mip = MipProblem::new(simple_milp()).unwrap();

        assert!(mip.is_integer_feasible(&[1.0, 0.5], 1e-6));
        assert!(!mip.is_integer_feasible(&[0.5, 0.5], 1e-6));
        assert!(mip.is_integer_feasible(&[0.9999999, 0.5], 1e-6));
    }

    #[test]
    fn test_fractionality() {
        let mip = MipProblem::new(simple_milp()).unwrap();

        assert!((mip.fractionality(0.5) - 0.5).abs() < 1e-10);
        assert!((mip.fractionality(0.3) - 0.3).abs() < 1e-10);
        assert!((mip.fractionality(0.7) - 0.3).abs() < 1e-10);
        assert!(mip.fractionality(1.0) < 1e-10);
        assert!(mip.fractionality(2.0) < 1e-10);
    }

    #[test]
    fn test_objective_conversions() {
        let mip = MipProblem::new(simple_milp()).unwrap();
        assert_eq!(mip.internal_objective(&[1.0, 2.0]), -7.0);
        assert_eq!(mip.native_objective(-7.0), 7.0);
        // No rounding for a continuous objective
        assert_eq!(mip.dual_bound(7.5, 1e-6), -7.5);
    }

    #[test]
    fn test_integral_objective_rounds_bound() {
        let mut m = LinearModel::new();
        let x0 = m.add_binary();
        let x1 = m.add_binary();
        m.set_objective(
            LinearExpr::new().with_term(x0, 1.0).with_term(x1, 1.0),
            ObjectiveSense::Minimize,
        )
        .unwrap();
        let mip = MipProblem::new(m).unwrap();
        assert!(mip.objective_integral);
        assert_eq!(mip.dual_bound(1.2, 1e-6), 2.0);
        assert_eq!(mip.dual_bound(1.0000001, 1e-6), 1.0);
    }

    #[test]
    fn test_bounds_with_overrides() {
        let mip = MipProblem::new(simple_milp()).unwrap();
        let (lb, ub) = mip.bounds_with([(0, 1.0, 1.0), (1, 0.0, 2.0)]);
        assert_eq!(lb, vec![1.0, 0.0]);
        assert_eq!(ub, vec![1.0, 2.0]);
        assert!(mip.satisfies_bounds(&[1.0, 4.0], 1e-9));
    }
}
