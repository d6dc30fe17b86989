//! Branching variable selection.

use super::BoundChange;
use crate::model::MipProblem;
use crate::settings::BranchingRule;

/// Fractionality differences below this count as ties.
const TIE_TOL: f64 = 1e-12;

/// A branching decision.
#[derive(Debug, Clone)]
pub struct BranchDecision {
    /// Variable to branch on.
    pub var: usize,

    /// Current (fractional) value.
    pub value: f64,

    /// Bound change for "down" branch (x <= floor(value)).
    pub down_branch: BoundChange,

    /// Bound change for "up" branch (x >= ceil(value)).
    pub up_branch: BoundChange,

    /// Score of this decision (for logging/debugging).
    pub score: f64,
}

/// Branching variable selector.
#[derive(Debug, Clone, Copy)]
pub struct BranchingSelector {
    /// Branching rule to use.
    rule: BranchingRule,
}

impl BranchingSelector {
    /// Create a new branching selector.
    pub fn new(rule: BranchingRule) -> Self {
        Self { rule }
    }

    /// Select a branching variable.
    ///
    /// `lower`/`upper` are the node's current bounds. Returns None if the
    /// solution is integer-feasible.
    pub fn select(
        &self,
        x: &[f64],
        prob: &MipProblem,
        lower: &[f64],
        upper: &[f64],
        tol: f64,
    ) -> Option<BranchDecision> {
        // Find fractional integer variables, in index order
        let fractional = prob.get_fractional_vars(x, tol);

        let (var, value, frac) = match self.rule {
            BranchingRule::MostFractional => most_fractional(&fractional)?,
            BranchingRule::FirstFractional => fractional.first().copied()?,
        };

        Some(make_decision(var, value, frac, lower, upper))
    }

    /// Select the integer variable farthest from integrality, even inside
    /// the tolerance. Used when a rounded candidate fails validation.
    ///
    /// Fixed variables are skipped, and the split is placed at the nearest
    /// integer so both children strictly shrink the domain. Returns None if
    /// every unfixed integer variable is exactly integral.
    pub fn select_least_integral(
        &self,
        x: &[f64],
        prob: &MipProblem,
        lower: &[f64],
        upper: &[f64],
    ) -> Option<BranchDecision> {
        let open: Vec<(usize, f64, f64)> = prob
            .get_fractional_vars(x, 0.0)
            .into_iter()
            .filter(|&(j, _, _)| lower[j] < upper[j])
            .collect();
        let (var, value, frac) = most_fractional(&open)?;

        let (lb, ub) = (lower[var], upper[var]);
        let nearest = value.round().clamp(lb, ub);
        let split = if nearest > lb { nearest - 1.0 } else { nearest };
        Some(BranchDecision {
            var,
            value,
            down_branch: BoundChange {
                var,
                old_lb: lb,
                old_ub: ub,
                new_lb: lb,
                new_ub: split,
            },
            up_branch: BoundChange {
                var,
                old_lb: lb,
                old_ub: ub,
                new_lb: split + 1.0,
                new_ub: ub,
            },
            score: frac,
        })
    }
}

/// Fractionality closest to 0.5; lowest index wins ties.
fn most_fractional(fractional: &[(usize, f64, f64)]) -> Option<(usize, f64, f64)> {
    let mut best: Option<(usize, f64, f64)> = None;
    for &cand in fractional {
        match best {
            Some((_, _, f)) if cand.2 <= f + TIE_TOL => {}
            _ => best = Some(cand),
        }
    }
    best
}

/// Create a branch decision for a variable.
fn make_decision(var: usize, value: f64, score: f64, lower: &[f64], upper: &[f64]) -> BranchDecision {
    let old_lb = lower[var];
    let old_ub = upper[var];

    BranchDecision {
        var,
        value,
        down_branch: BoundChange::down_branch(var, old_lb, old_ub, value),
        up_branch: BoundChange::up_branch(var, old_lb, old_ub, value),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solver_core::{ConstraintSense, LinearExpr, LinearModel, VarType};

    fn simple_mip() -> MipProblem {
        // x0 + x1 + x2 <= 2, x0 and x1 binary, x2 continuous
        let mut m = LinearModel::new();
        let x0 = m.add_binary();
        let x1 = m.add_binary();
        let x2 = m.add_variable(VarType::Continuous, 0.0, f64::INFINITY);
        m.add_constraint(
            LinearExpr::new()
                .with_term(x0, 1.0)
                .with_term(x1, 1.0)
                .with_term(x2, 1.0),
            ConstraintSense::Le,
            2.0,
        )
        .unwrap();
        MipProblem::new(m).unwrap()
    }

    fn select(rule: BranchingRule, x: &[f64]) -> Option<BranchDecision> {
        let prob = simple_mip();
        let (lb, ub) = (prob.var_lb.clone(), prob.var_ub.clone());
        BranchingSelector::new(rule).select(x, &prob, &lb, &ub, 1e-6)
    }

    #[test]
    fn test_most_fractional_tie_takes_lowest_index() {
        // Fractionalities 0.3 and 0.3 (up to rounding): x0 wins
        let d = select(BranchingRule::MostFractional, &[0.3, 0.7, 1.5]).unwrap();
        assert_eq!(d.var, 0);

        let d = select(BranchingRule::MostFractional, &[0.7, 0.3, 0.5]).unwrap();
        assert_eq!(d.var, 0);
    }

    #[test]
    fn test_most_fractional_prefers_half() {
        let d = select(BranchingRule::MostFractional, &[0.9, 0.45, 0.0]).unwrap();
        assert_eq!(d.var, 1);
    }

    #[test]
    fn test_first_fractional() {
        let d = select(BranchingRule::FirstFractional, &[1.0, 0.9, 0.5]).unwrap();
        assert_eq!(d.var, 1);
    }

    #[test]
    fn test_integer_feasible() {
        // Continuous x2 is ignored
        assert!(select(BranchingRule::MostFractional, &[1.0, 0.0, 1.3]).is_none());
    }

    #[test]
    fn test_branch_decision() {
        let d = select(BranchingRule::MostFractional, &[0.5, 0.0, 1.0]).unwrap();

        assert_eq!(d.var, 0);
        assert_eq!(d.value, 0.5);

        // Down branch: x0 <= 0
        assert_eq!(d.down_branch.new_ub, 0.0);

        // Up branch: x0 >= 1
        assert_eq!(d.up_branch.new_lb, 1.0);
    }

    #[test]
    fn test_least_integral_inside_tolerance() {
        let prob = simple_mip();
        let (lb, ub) = (prob.var_lb.clone(), prob.var_ub.clone());
        let selector = BranchingSelector::new(BranchingRule::MostFractional);
        let x = [1.0, 0.9999995, 0.0];

        assert!(selector.select(&x, &prob, &lb, &ub, 1e-6).is_none());
        let d = selector.select_least_integral(&x, &prob, &lb, &ub).unwrap();
        assert_eq!(d.var, 1);
        assert_eq!(d.down_branch.new_ub, 0.0);
        assert_eq!(d.up_branch.new_lb, 1.0);

        assert!(selector
            .select_least_integral(&[1.0, 0.0, 0.3], &prob, &lb, &ub)
            .is_none());
    }

    #[test]
    fn test_least_integral_above_upper_bound() {
        let prob = simple_mip();
        let (mut lb, ub) = (prob.var_lb.clone(), prob.var_ub.clone());
        let selector = BranchingSelector::new(BranchingRule::MostFractional);

        // Binary slightly above 1: both sides must move a bound
        let d = selector
            .select_least_integral(&[1.0, 1.0000005, 0.0], &prob, &lb, &ub)
            .unwrap();
        assert_eq!(d.var, 1);
        assert_eq!((d.down_branch.new_lb, d.down_branch.new_ub), (0.0, 0.0));
        assert_eq!((d.up_branch.new_lb, d.up_branch.new_ub), (1.0, 1.0));

        // Once fixed, the variable is no longer a candidate
        lb[1] = 1.0;
        assert!(selector
            .select_least_integral(&[1.0, 1.0000005, 0.0], &prob, &lb, &ub)
            .is_none());
        let d = selector
            .select_least_integral(&[1e-7, 1.0000005, 0.0], &prob, &lb, &ub)
            .unwrap();
        assert_eq!(d.var, 0);
        assert_eq!(d.down_branch.new_ub, 0.0);
        assert_eq!(d.up_branch.new_lb, 1.0);
    }
}
