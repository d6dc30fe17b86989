//! Two-phase primal simplex for LP relaxations.
//!
//! The model is brought into standard form
//!
//! ```text
//! minimize    c^T x'
//! subject to  A' x' (+ slack | - surplus) (+ artificial) = b',  b' >= 0
//!             0 <= x' <= u
//! ```
//!
//! by shifting each variable onto its lower bound (or mirroring it onto a
//! finite upper bound, or splitting a free variable) and negating rows with
//! a negative right-hand side. A variable with both bounds finite keeps its
//! width `hi - lo` as a column bound handled by the ratio test, so binaries
//! add no rows. Fixed variables are substituted out entirely, which keeps
//! the tableau small deep in a branch-and-bound tree.
//!
//! Integrality is ignored: this is the relaxation oracle.

mod tableau;

pub use tableau::PivotRule;

use tableau::{PhaseOutcome, Tableau};

use crate::error::{CoreError, CoreResult};
use crate::linalg::sparse;
use crate::problem::{
    ConstraintSense, LinearModel, SolveInfo, SolveResult, SolveStatus, SolverSettings,
};

/// Bounds closer than this are treated as a fixed variable.
const FIXED_TOL: f64 = 1e-12;

/// How an original variable is expressed through standard-form columns.
#[derive(Debug, Clone, Copy)]
enum ColumnMap {
    /// Substituted by a constant.
    Fixed(f64),
    /// `x = offset + x'`
    Shifted { col: usize, offset: f64 },
    /// `x = offset - x'`
    Mirrored { col: usize, offset: f64 },
    /// `x = x+ - x-`
    Split { pos: usize, neg: usize },
}

impl ColumnMap {
    fn value(&self, v: &[f64]) -> f64 {
        match *self {
            ColumnMap::Fixed(val) => val,
            ColumnMap::Shifted { col, offset } => offset + v[col],
            ColumnMap::Mirrored { col, offset } => offset - v[col],
            ColumnMap::Split { pos, neg } => v[pos] - v[neg],
        }
    }
}

/// A standard-form row before slack/artificial columns are attached.
struct Row {
    entries: Vec<(usize, f64)>,
    sense: ConstraintSense,
    rhs: f64,
}

/// Solve the LP relaxation of `model` under its own variable bounds.
pub fn solve(model: &LinearModel, settings: &SolverSettings) -> CoreResult<SolveResult> {
    solve_with_bounds(model, &model.lower_bounds(), &model.upper_bounds(), settings)
}

/// Solve the LP relaxation of `model` with the bounds replaced by `lower`/`upper`.
///
/// Identical inputs always produce identical pivot sequences.
pub fn solve_with_bounds(
    model: &LinearModel,
    lower: &[f64],
    upper: &[f64],
    settings: &SolverSettings,
) -> CoreResult<SolveResult> {
    let n = model.num_vars();
    for len in [lower.len(), upper.len()] {
        if len != n {
            return Err(CoreError::DimensionMismatch { expected: n, got: len });
        }
    }

    let mut info = SolveInfo::default();

    // Column maps for every original variable.
    let mut columns = Vec::with_capacity(n);
    let mut rows: Vec<Row> = Vec::new();
    let mut widths: Vec<(usize, f64)> = Vec::new();
    let mut ncols = 0usize;
    for j in 0..n {
        let (lo, hi) = (lower[j], upper[j]);
        if lo.is_nan() || hi.is_nan() {
            return Err(CoreError::InvalidBounds { var: j, lower: lo, upper: hi });
        }
        if lo > hi + FIXED_TOL || lo == f64::INFINITY || hi == f64::NEG_INFINITY {
            return Ok(SolveResult::without_point(SolveStatus::Infeasible, info));
        }
        let map = if lo.is_finite() && hi.is_finite() && hi - lo <= FIXED_TOL {
            ColumnMap::Fixed(lo)
        } else if lo.is_finite() {
            let col = ncols;
            ncols += 1;
            if hi.is_finite() {
                widths.push((col, hi - lo));
            }
            ColumnMap::Shifted { col, offset: lo }
        } else if hi.is_finite() {
            let col = ncols;
            ncols += 1;
            ColumnMap::Mirrored { col, offset: hi }
        } else {
            let pos = ncols;
            ncols += 2;
            ColumnMap::Split { pos, neg: pos + 1 }
        };
        columns.push(map);
    }
    let num_structural = ncols;

    // Scatter the constraint matrix column by column.
    let a = model.constraint_matrix();
    let mut entries: Vec<Vec<(usize, f64)>> = vec![Vec::new(); model.num_constraints()];
    let mut rhs: Vec<f64> = model.constraints().iter().map(|c| c.rhs).collect();
    for (j, col_view) in a.outer_iterator().enumerate() {
        for (i, &v) in col_view.iter() {
            match columns[j] {
                ColumnMap::Fixed(val) => rhs[i] -= v * val,
                ColumnMap::Shifted { col, offset } => {
                    entries[i].push((col, v));
                    rhs[i] -= v * offset;
                }
                ColumnMap::Mirrored { col, offset } => {
                    entries[i].push((col, -v));
                    rhs[i] -= v * offset;
                }
                ColumnMap::Split { pos, neg } => {
                    entries[i].push((pos, v));
                    entries[i].push((neg, -v));
                }
            }
        }
    }

    for ((row_entries, b), c) in entries.into_iter().zip(rhs).zip(model.constraints()) {
        let row_entries: Vec<(usize, f64)> =
            row_entries.into_iter().filter(|&(_, v)| v != 0.0).collect();
        if row_entries.is_empty() {
            // Every variable in the row is fixed: the row is a constant check.
            let violated = match c.sense {
                ConstraintSense::Le => b < -settings.tol_feas,
                ConstraintSense::Ge => b > settings.tol_feas,
                ConstraintSense::Eq => b.abs() > settings.tol_feas,
            };
            if violated {
                return Ok(SolveResult::without_point(SolveStatus::Infeasible, info));
            }
            continue;
        }
        rows.push(Row {
            entries: row_entries,
            sense: c.sense,
            rhs: b,
        });
    }

    // Normalize to b >= 0 and count auxiliary columns.
    let mut num_slack = 0;
    let mut num_art = 0;
    for row in rows.iter_mut() {
        if row.rhs < 0.0 {
            row.rhs = -row.rhs;
            row.sense = row.sense.flipped();
            for e in row.entries.iter_mut() {
                e.1 = -e.1;
            }
        }
        match row.sense {
            ConstraintSense::Le => num_slack += 1,
            ConstraintSense::Ge => {
                num_slack += 1;
                num_art += 1;
            }
            ConstraintSense::Eq => num_art += 1,
        }
    }

    let art_start = num_structural + num_slack;
    let total_cols = art_start + num_art;
    let m = rows.len();
    info.rows = m;
    info.cols = total_cols;

    settings.check_budget()?;
    let mut tab = Tableau::new(m, total_cols);
    for &(col, width) in &widths {
        tab.set_upper(col, width);
    }
    let mut next_slack = num_structural;
    let mut next_art = art_start;
    for (r, row) in rows.iter().enumerate() {
        for &(col, v) in &row.entries {
            tab.set(r, col, tab.get(r, col) + v);
        }
        tab.set_rhs(r, row.rhs);
        match row.sense {
            ConstraintSense::Le => {
                tab.set(r, next_slack, 1.0);
                tab.set_basic(r, next_slack);
                next_slack += 1;
            }
            ConstraintSense::Ge => {
                tab.set(r, next_slack, -1.0);
                tab.set(r, next_art, 1.0);
                tab.set_basic(r, next_art);
                next_slack += 1;
                next_art += 1;
            }
            ConstraintSense::Eq => {
                tab.set(r, next_art, 1.0);
                tab.set_basic(r, next_art);
                next_art += 1;
            }
        }
    }

    // Phase 1: minimize the sum of artificials.
    if num_art > 0 {
        let mut cost = vec![0.0; total_cols];
        cost[art_start..].fill(1.0);
        tab.set_cost(&cost);
        tab.run(total_cols, settings, &mut info)?;
        info.phase1_pivots = info.pivots;

        let scale = 1.0 + rows.iter().map(|r| r.rhs.abs()).fold(0.0, f64::max);
        if tab.objective() > settings.tol_feas * scale {
            log_result(settings, SolveStatus::Infeasible, &info);
            return Ok(SolveResult::without_point(SolveStatus::Infeasible, info));
        }

        // Drive zero-valued artificials out of the basis.
        for r in 0..m {
            if tab.basic(r) < art_start {
                continue;
            }
            if let Some(col) = (0..art_start).find(|&j| tab.get(r, j).abs() > settings.tol_pivot) {
                tab.pivot(r, col);
                info.pivots += 1;
            }
        }
        // Artificials left in the basis sit on redundant rows and must stay at zero.
        for col in art_start..total_cols {
            tab.set_upper(col, 0.0);
        }
    }

    // Phase 2: the real objective, artificials barred from entering.
    let sign = model.sense().sign();
    let mut cost = vec![0.0; total_cols];
    for (j, c) in model.objective().expr.terms() {
        let c = sign * c;
        match columns[j] {
            ColumnMap::Fixed(_) => {}
            ColumnMap::Shifted { col, .. } => cost[col] += c,
            ColumnMap::Mirrored { col, .. } => cost[col] -= c,
            ColumnMap::Split { pos, neg } => {
                cost[pos] += c;
                cost[neg] -= c;
            }
        }
    }
    tab.set_cost(&cost);
    if tab.run(art_start, settings, &mut info)? == PhaseOutcome::Unbounded {
        log_result(settings, SolveStatus::Unbounded, &info);
        return Ok(SolveResult::without_point(SolveStatus::Unbounded, info));
    }

    let v = tab.primal();
    let x: Vec<f64> = columns.iter().map(|map| map.value(&v)).collect();

    let activities = sparse::row_activities(&a, &x);
    let max_residual = model
        .constraints()
        .iter()
        .zip(&activities)
        .map(|(c, &act)| match c.sense {
            ConstraintSense::Le => (act - c.rhs).max(0.0),
            ConstraintSense::Ge => (c.rhs - act).max(0.0),
            ConstraintSense::Eq => (act - c.rhs).abs(),
        })
        .fold(0.0_f64, f64::max);
    if max_residual > 1e-6 {
        log::warn!("simplex solution violates a row by {:.3e}", max_residual);
    }

    log_result(settings, SolveStatus::Optimal, &info);
    Ok(SolveResult {
        status: SolveStatus::Optimal,
        obj_val: model.evaluate(&x),
        x,
        info,
    })
}

fn log_result(settings: &SolverSettings, status: SolveStatus, info: &SolveInfo) {
    if settings.verbose {
        log::info!(
            "simplex {}x{}: {} after {} pivots ({} phase 1, {} Bland, {} bound flips)",
            info.rows,
            info.cols,
            status,
            info.pivots,
            info.phase1_pivots,
            info.bland_pivots,
            info.bound_flips
        );
    }
}
