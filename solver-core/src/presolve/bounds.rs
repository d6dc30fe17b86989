//! Activity-based bound tightening.

use crate::problem::{ConstraintSense, LinearExpr, LinearModel};

/// Outcome of activity-based bound tightening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundTightening {
    /// Bounds are consistent.
    Tightened {
        /// Individual bound updates.
        changed: usize,
        /// Propagation passes run.
        passes: usize,
    },
    /// Some row cannot be satisfied, or some domain became empty.
    Infeasible {
        /// Offending row (`None` for an empty initial domain).
        row: Option<usize>,
    },
}

impl BoundTightening {
    /// True if propagation proved the bounds infeasible.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, BoundTightening::Infeasible { .. })
    }
}

/// Minimum improvement for a bound change to count.
const MIN_CHANGE: f64 = 1e-7;

/// Tighten `lower`/`upper` in place by propagating every row's activity bounds.
///
/// For a row `Σ a_j x_j <= b`, each variable is bounded by what remains of
/// `b` once all other terms sit at their minimum activity. `>=` rows are
/// handled as `Σ -a_j x_j <= -b`, and `=` rows as both. Integer bounds are
/// rounded inward. Passes repeat until nothing changes or `max_passes` is hit.
pub fn tighten_bounds(
    model: &LinearModel,
    lower: &mut [f64],
    upper: &mut [f64],
    tol: f64,
    max_passes: usize,
) -> BoundTightening {
    let integral: Vec<bool> = model
        .variables()
        .iter()
        .map(|v| v.var_type.is_integral())
        .collect();

    for j in 0..lower.len() {
        if integral[j] {
            round_inward(&mut lower[j], &mut upper[j], tol);
        }
        if lower[j] > upper[j] + tol {
            return BoundTightening::Infeasible { row: None };
        }
    }

    let mut changed = 0;
    for pass in 1..=max_passes {
        let mut pass_changed = 0;
        for (row, c) in model.constraints().iter().enumerate() {
            let sides: &[f64] = match c.sense {
                ConstraintSense::Le => &[1.0],
                ConstraintSense::Ge => &[-1.0],
                ConstraintSense::Eq => &[1.0, -1.0],
            };
            for &s in sides {
                match propagate_le(&c.expr, s, s * c.rhs, lower, upper, &integral, tol) {
                    Some(n) => pass_changed += n,
                    None => return BoundTightening::Infeasible { row: Some(row) },
                }
            }
        }
        changed += pass_changed;
        if pass_changed == 0 {
            return BoundTightening::Tightened { changed, passes: pass };
        }
    }
    BoundTightening::Tightened {
        changed,
        passes: max_passes,
    }
}

/// Propagate `Σ s*a_j x_j <= rhs`. Returns the number of changes, or `None`
/// if the row is infeasible.
fn propagate_le(
    expr: &LinearExpr,
    s: f64,
    rhs: f64,
    lower: &mut [f64],
    upper: &mut [f64],
    integral: &[bool],
    tol: f64,
) -> Option<usize> {
    let mut min_act = 0.0;
    let mut inf_count = 0usize;
    for (j, a) in expr.terms() {
        let a = s * a;
        let term = if a > 0.0 { a * lower[j] } else { a * upper[j] };
        if term.is_finite() {
            min_act += term;
        } else if a != 0.0 {
            inf_count += 1;
        }
    }

    if inf_count == 0 && min_act > rhs + tol * (1.0 + rhs.abs()) {
        return None;
    }
    if inf_count > 1 {
        return Some(0);
    }

    let mut changed = 0;
    for (j, a) in expr.terms() {
        let a = s * a;
        if a == 0.0 {
            continue;
        }
        let own = if a > 0.0 { a * lower[j] } else { a * upper[j] };
        let residual = if own.is_finite() {
            if inf_count > 0 {
                continue;
            }
            min_act - own
        } else {
            // The only unbounded term; everything else is finite.
            min_act
        };
        let slack = (rhs - residual) / a;
        if a > 0.0 {
            let mut new_ub = slack;
            if integral[j] {
                new_ub = (new_ub + tol).floor();
            }
            if new_ub < upper[j] - MIN_CHANGE {
                upper[j] = new_ub;
                changed += 1;
            }
        } else {
            let mut new_lb = slack;
            if integral[j] {
                new_lb = (new_lb - tol).ceil();
            }
            if new_lb > lower[j] + MIN_CHANGE {
                lower[j] = new_lb;
                changed += 1;
            }
        }
        if lower[j] > upper[j] + tol {
            return None;
        }
    }
    Some(changed)
}

fn round_inward(lower: &mut f64, upper: &mut f64, tol: f64) {
    if lower.is_finite() {
        *lower = (*lower - tol).ceil();
    }
    if upper.is_finite() {
        *upper = (*upper + tol).floor();
    }
}
