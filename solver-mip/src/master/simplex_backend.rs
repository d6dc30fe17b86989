//! Relaxation backend using the solver-core simplex.

use solver_core::{solve_with_bounds, CoreError, LinearModel, SolveStatus, SolverSettings};

use super::{MasterResult, MasterStatus, RelaxationBackend, SolveBudget};
use crate::error::MipResult;

/// Relaxation backend using the solver-core two-phase simplex.
#[derive(Debug, Clone, Default)]
pub struct SimplexBackend {
    settings: SolverSettings,
}

impl SimplexBackend {
    /// Create a new simplex backend.
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// Simplex settings in use.
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }
}

impl RelaxationBackend for SimplexBackend {
    fn solve(
        &self,
        model: &LinearModel,
        lower: &[f64],
        upper: &[f64],
        budget: &SolveBudget,
    ) -> MipResult<MasterResult> {
        let deadline = match (budget.deadline, self.settings.deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let settings = SolverSettings {
            deadline,
            interrupt: budget
                .interrupt
                .clone()
                .or_else(|| self.settings.interrupt.clone()),
            ..self.settings.clone()
        };

        let result = match solve_with_bounds(model, lower, upper, &settings) {
            Ok(result) => result,
            Err(CoreError::IterationLimit(cap)) => {
                log::warn!("simplex gave up after {} pivots", cap);
                return Ok(MasterResult::without_point(MasterStatus::IterationLimit));
            }
            Err(CoreError::TimeLimit) => {
                return Ok(MasterResult::without_point(MasterStatus::TimeLimit));
            }
            Err(CoreError::Interrupted) => {
                return Ok(MasterResult::without_point(MasterStatus::Interrupted));
            }
            Err(err) => return Err(err.into()),
        };

        let status = match result.status {
            SolveStatus::Optimal => MasterStatus::Optimal,
            SolveStatus::Infeasible => MasterStatus::Infeasible,
            SolveStatus::Unbounded => MasterStatus::Unbounded,
        };

        if self.settings.verbose {
            log::debug!(
                "simplex: {} in {} pivots ({} in phase 1, {} under Bland, {} bound flips), {}x{} tableau",
                result.status,
                result.info.pivots,
                result.info.phase1_pivots,
                result.info.bland_pivots,
                result.info.bound_flips,
                result.info.rows,
                result.info.cols,
            );
        }

        Ok(MasterResult {
            status,
            x: result.x,
            obj_val: result.obj_val,
            iterations: result.info.pivots,
        })
    }

    fn name(&self) -> &'static str {
        "simplex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solver_core::{ConstraintSense, LinearExpr, ObjectiveSense, VarType};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Instant;

    fn knapsack_relaxation() -> LinearModel {
        // max 60 x0 + 100 x1 + 120 x2  s.t.  10 x0 + 20 x1 + 30 x2 <= 50
        let mut m = LinearModel::new();
        let xs: Vec<usize> = (0..3).map(|_| m.add_binary()).collect();
        m.add_constraint(
            LinearExpr::new()
                .with_term(xs[0], 10.0)
                .with_term(xs[1], 20.0)
                .with_term(xs[2], 30.0),
            ConstraintSense::Le,
            50.0,
        )
        .unwrap();
        m.set_objective(
            LinearExpr::new()
                .with_term(xs[0], 60.0)
                .with_term(xs[1], 100.0)
                .with_term(xs[2], 120.0),
            ObjectiveSense::Maximize,
        )
        .unwrap();
        m
    }

    #[test]
    fn test_fractional_relaxation() {
        let m = knapsack_relaxation();
        let backend = SimplexBackend::default();
        let res = backend
            .solve(&m, &m.lower_bounds(), &m.upper_bounds(), &SolveBudget::default())
            .unwrap();

        assert_eq!(res.status, MasterStatus::Optimal);
        // Greedy by ratio: x0 = x1 = 1, x2 = 2/3 -> 240
        assert!((res.obj_val - 240.0).abs() < 1e-6);
        assert!((res.x[2] - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_bound_overrides() {
        let m = knapsack_relaxation();
        let backend = SimplexBackend::default();
        // Fix x2 = 1 and x1 = 1: weight 50, value 220
        let res = backend
            .solve(&m, &[0.0, 1.0, 1.0], &[1.0, 1.0, 1.0], &SolveBudget::default())
            .unwrap();
        assert_eq!(res.status, MasterStatus::Optimal);
        assert!((res.obj_val - 220.0).abs() < 1e-6);

        // x0 = x1 = x2 = 1 exceeds capacity
        let res = backend
            .solve(&m, &[1.0; 3], &[1.0; 3], &SolveBudget::default())
            .unwrap();
        assert_eq!(res.status, MasterStatus::Infeasible);
    }

    #[test]
    fn test_unbounded_relaxation() {
        let mut m = LinearModel::new();
        let x = m.add_variable(VarType::Integer, 0.0, f64::INFINITY);
        m.set_objective(LinearExpr::new().with_term(x, 1.0), ObjectiveSense::Maximize)
            .unwrap();
        let res = SimplexBackend::default()
            .solve(&m, &m.lower_bounds(), &m.upper_bounds(), &SolveBudget::default())
            .unwrap();
        assert_eq!(res.status, MasterStatus::Unbounded);
    }

    #[test]
    fn test_limits_are_statuses() {
        let m = knapsack_relaxation();
        let (lo, hi) = (m.lower_bounds(), m.upper_bounds());

        let capped = SimplexBackend::new(SolverSettings {
            max_pivots: 0,
            ..Default::default()
        });
        let res = capped.solve(&m, &lo, &hi, &SolveBudget::default()).unwrap();
        assert_eq!(res.status, MasterStatus::IterationLimit);
        assert!(res.x.is_empty());

        let expired = SolveBudget {
            deadline: Some(Instant::now()),
            interrupt: None,
        };
        let res = SimplexBackend::default().solve(&m, &lo, &hi, &expired).unwrap();
        assert_eq!(res.status, MasterStatus::TimeLimit);

        let raised = SolveBudget {
            deadline: None,
            interrupt: Some(Arc::new(AtomicBool::new(true))),
        };
        let res = SimplexBackend::default().solve(&m, &lo, &hi, &raised).unwrap();
        assert_eq!(res.status, MasterStatus::Interrupted);
        assert!(res.status.is_unresolved());
    }
}
