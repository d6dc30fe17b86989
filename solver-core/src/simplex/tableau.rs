//! Dense bounded-variable simplex tableau with Dantzig pricing and
//! Bland's fallback.
//!
//! Every column lives in `[0, upper]`. A nonbasic column sitting at its
//! upper bound is stored complemented (`x = upper - x''`), so nonbasic
//! columns are always zero in the tableau and the right-hand side holds
//! the basic values.

use nalgebra::DMatrix;

use crate::error::{CoreError, CoreResult};
use crate::problem::{SolveInfo, SolverSettings};

/// Column pricing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotRule {
    /// Most negative reduced cost, lowest index on ties.
    Dantzig,
    /// Lowest-index improving column (anti-cycling).
    Bland,
}

/// Outcome of one simplex phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PhaseOutcome {
    Optimal,
    Unbounded,
}

/// What the ratio test decided for an entering column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// The entering column reaches its own upper bound first.
    Flip,
    /// A basic column leaves, at its lower or upper bound.
    Pivot { row: usize, at_upper: bool },
    Unbounded,
}

/// Values below this magnitude are flushed to zero after a pivot.
const DROP_TOL: f64 = 1e-12;

/// Tableau `[A | b]` with a reduced-cost row.
///
/// Every row has exactly one basic column; `obj[ncols]` holds minus the
/// current objective value.
pub(crate) struct Tableau {
    t: DMatrix<f64>,
    obj: Vec<f64>,
    basis: Vec<usize>,
    upper: Vec<f64>,
    flipped: Vec<bool>,
    ncols: usize,
}

impl Tableau {
    pub fn new(rows: usize, ncols: usize) -> Self {
        Self {
            t: DMatrix::zeros(rows, ncols + 1),
            obj: vec![0.0; ncols + 1],
            basis: vec![0; rows],
            upper: vec![f64::INFINITY; ncols],
            flipped: vec![false; ncols],
            ncols,
        }
    }

    pub fn rows(&self) -> usize {
        self.basis.len()
    }

    pub fn set(&mut self, row: usize, col: usize, val: f64) {
        self.t[(row, col)] = val;
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.t[(row, col)]
    }

    pub fn set_rhs(&mut self, row: usize, val: f64) {
        self.t[(row, self.ncols)] = val;
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.t[(row, self.ncols)]
    }

    pub fn set_basic(&mut self, row: usize, col: usize) {
        self.basis[row] = col;
    }

    pub fn basic(&self, row: usize) -> usize {
        self.basis[row]
    }

    /// Upper bound of a column; columns start unbounded above.
    pub fn set_upper(&mut self, col: usize, upper: f64) {
        self.upper[col] = upper;
    }

    /// Current objective value (minimization form).
    pub fn objective(&self) -> f64 {
        -self.obj[self.ncols]
    }

    /// Price out the basis for a new cost vector over the original columns.
    pub fn set_cost(&mut self, cost: &[f64]) {
        debug_assert_eq!(cost.len(), self.ncols);
        self.obj[self.ncols] = 0.0;
        for (j, &c) in cost.iter().enumerate() {
            if self.flipped[j] {
                self.obj[j] = -c;
                self.obj[self.ncols] -= c * self.upper[j];
            } else {
                self.obj[j] = c;
            }
        }
        for r in 0..self.rows() {
            let cb = self.obj[self.basis[r]];
            if cb == 0.0 {
                continue;
            }
            for j in 0..=self.ncols {
                self.obj[j] -= cb * self.t[(r, j)];
            }
        }
    }

    /// Pivot on `(row, col)`.
    pub fn pivot(&mut self, row: usize, col: usize) {
        let inv = 1.0 / self.t[(row, col)];
        {
            let mut pivot_row = self.t.row_mut(row);
            pivot_row *= inv;
        }
        self.t[(row, col)] = 1.0;
        let pivot_row: Vec<f64> = self.t.row(row).iter().copied().collect();

        for r in 0..self.rows() {
            if r == row {
                continue;
            }
            let f = self.t[(r, col)];
            if f == 0.0 {
                continue;
            }
            for (j, &pv) in pivot_row.iter().enumerate() {
                if pv == 0.0 {
                    continue;
                }
                let v = self.t[(r, j)] - f * pv;
                self.t[(r, j)] = if v.abs() < DROP_TOL { 0.0 } else { v };
            }
            self.t[(r, col)] = 0.0;
        }

        let f = self.obj[col];
        if f != 0.0 {
            for (j, &pv) in pivot_row.iter().enumerate() {
                self.obj[j] -= f * pv;
            }
            self.obj[col] = 0.0;
        }

        self.basis[row] = col;
    }

    /// Move a nonbasic column to its other bound.
    fn flip_nonbasic(&mut self, col: usize) {
        let u = self.upper[col];
        for r in 0..self.rows() {
            let a = self.t[(r, col)];
            if a != 0.0 {
                self.t[(r, self.ncols)] -= a * u;
                self.t[(r, col)] = -a;
            }
        }
        let d = self.obj[col];
        self.obj[self.ncols] -= d * u;
        self.obj[col] = -d;
        self.flipped[col] = !self.flipped[col];
    }

    /// Complement the basic column of `row`, keeping it basic.
    fn flip_basic(&mut self, row: usize) {
        let col = self.basis[row];
        let u = self.upper[col];
        for j in 0..self.ncols {
            if j != col {
                self.t[(row, j)] = -self.t[(row, j)];
            }
        }
        self.t[(row, self.ncols)] = u - self.t[(row, self.ncols)];
        self.flipped[col] = !self.flipped[col];
    }

    /// Entering column among `0..limit`.
    fn entering(&self, limit: usize, rule: PivotRule, tol: f64) -> Option<usize> {
        match rule {
            PivotRule::Bland => (0..limit).find(|&j| self.obj[j] < -tol),
            PivotRule::Dantzig => {
                let mut best: Option<(usize, f64)> = None;
                for j in 0..limit {
                    let d = self.obj[j];
                    if d < -tol && best.map_or(true, |(_, bd)| d < bd) {
                        best = Some((j, d));
                    }
                }
                best.map(|(j, _)| j)
            }
        }
    }

    /// Bounded ratio test for an entering column.
    ///
    /// A basic column may block by falling to zero or by rising to its
    /// upper bound; ties go to the lowest basic index. The entering
    /// column's own bound wins ties against both.
    fn ratio_test(&self, col: usize, tol_pivot: f64) -> Step {
        let mut best: Option<(usize, bool, f64)> = None;
        for r in 0..self.rows() {
            let a = self.t[(r, col)];
            let (ratio, at_upper) = if a > tol_pivot {
                (self.rhs(r).max(0.0) / a, false)
            } else if a < -tol_pivot && self.upper[self.basis[r]].is_finite() {
                let room = self.upper[self.basis[r]] - self.rhs(r);
                (room.max(0.0) / -a, true)
            } else {
                continue;
            };
            best = match best {
                None => Some((r, at_upper, ratio)),
                Some((br, bu, bratio)) => {
                    let tie = (ratio - bratio).abs() <= DROP_TOL * (1.0 + bratio.abs());
                    if (!tie && ratio < bratio) || (tie && self.basis[r] < self.basis[br]) {
                        Some((r, at_upper, ratio))
                    } else {
                        Some((br, bu, bratio))
                    }
                }
            };
        }

        let own = self.upper[col];
        match best {
            Some((_, _, ratio)) if own <= ratio => Step::Flip,
            Some((row, at_upper, _)) => Step::Pivot { row, at_upper },
            None if own.is_finite() => Step::Flip,
            None => Step::Unbounded,
        }
    }

    /// Leaving row for an entering column, if the ratio test pivots.
    #[cfg(test)]
    fn leaving(&self, col: usize, tol_pivot: f64) -> Option<usize> {
        match self.ratio_test(col, tol_pivot) {
            Step::Pivot { row, .. } => Some(row),
            _ => None,
        }
    }

    /// Run simplex iterations until optimal or unbounded.
    ///
    /// Only columns below `limit` may enter the basis. The settings'
    /// deadline and interrupt flag are polled before every iteration.
    pub fn run(
        &mut self,
        limit: usize,
        settings: &SolverSettings,
        info: &mut SolveInfo,
    ) -> CoreResult<PhaseOutcome> {
        let stall_limit = settings.stall_factor.max(1) * self.ncols.max(1);
        let mut rule = PivotRule::Dantzig;
        let mut stall = 0usize;
        let mut best_obj = self.objective();

        loop {
            settings.check_budget()?;
            let Some(col) = self.entering(limit, rule, settings.tol_opt) else {
                return Ok(PhaseOutcome::Optimal);
            };
            match self.ratio_test(col, settings.tol_pivot) {
                Step::Unbounded => return Ok(PhaseOutcome::Unbounded),
                _ if info.pivots + info.bound_flips >= settings.max_pivots => {
                    return Err(CoreError::IterationLimit(settings.max_pivots));
                }
                Step::Flip => {
                    self.flip_nonbasic(col);
                    info.bound_flips += 1;
                }
                Step::Pivot { row, at_upper } => {
                    if at_upper {
                        self.flip_basic(row);
                    }
                    self.pivot(row, col);
                    info.pivots += 1;
                    if rule == PivotRule::Bland {
                        info.bland_pivots += 1;
                    }
                }
            }

            let obj = self.objective();
            if obj < best_obj - DROP_TOL * (1.0 + best_obj.abs()) {
                best_obj = obj;
                stall = 0;
            } else {
                stall += 1;
                if rule == PivotRule::Dantzig && stall >= stall_limit {
                    log::debug!(
                        "simplex stalled for {} pivots at obj={:.6e}, switching to Bland's rule",
                        stall,
                        obj
                    );
                    rule = PivotRule::Bland;
                }
            }
        }
    }

    /// Values of all columns at the current basic solution.
    pub fn primal(&self) -> Vec<f64> {
        let mut v = vec![0.0; self.ncols];
        for (r, &col) in self.basis.iter().enumerate() {
            v[col] = self.rhs(r).max(0.0);
        }
        for (j, value) in v.iter_mut().enumerate() {
            if self.flipped[j] {
                *value = self.upper[j] - *value;
            }
            *value = value.clamp(0.0, self.upper[j]);
        }
        v
    }
}
