//! MIP solution types.

use std::sync::{Mutex, MutexGuard};

/// Status of the MIP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipStatus {
    /// Search exhausted with an incumbent: optimal.
    Optimal,

    /// Search exhausted without an incumbent.
    Infeasible,

    /// Node limit reached, best solution returned.
    NodeLimit,

    /// Time limit reached, best solution returned.
    TimeLimit,

    /// Gap limit reached (solution within gap_tol of optimal).
    GapLimit,

    /// External interrupt flag was raised.
    Interrupted,

    /// A node relaxation exceeded its pivot cap, best solution returned.
    IterationLimit,
}

impl MipStatus {
    /// Returns true if optimality was proven.
    pub fn is_optimal(&self) -> bool {
        matches!(self, MipStatus::Optimal | MipStatus::GapLimit)
    }

    /// Returns true if the search stopped on a budget or interrupt.
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            MipStatus::NodeLimit
                | MipStatus::TimeLimit
                | MipStatus::Interrupted
                | MipStatus::IterationLimit
        )
    }
}

/// Complete MIP solution with diagnostics.
///
/// Objective values and bounds are reported in the model's own sense.
#[derive(Debug, Clone)]
pub struct MipSolution {
    /// Solve status.
    pub status: MipStatus,

    /// Best integral assignment (empty if none was found).
    pub x: Vec<f64>,

    /// Objective value of best solution (primal bound, NaN if none).
    pub obj_val: f64,

    /// Best dual bound over the open nodes.
    pub bound: f64,

    /// Relative optimality gap: |obj_val - bound| / |obj_val|.
    pub gap: f64,

    /// Number of B&B nodes explored.
    pub nodes_explored: u64,

    /// Nodes discarded by bound.
    pub nodes_pruned: u64,

    /// Nodes whose relaxation (or propagation) proved infeasible.
    pub nodes_infeasible: u64,

    /// Total solve time in milliseconds.
    pub solve_time_ms: u64,

    /// Number of times incumbent was updated.
    pub incumbent_updates: u64,

    /// Objective value after each incumbent improvement, in order.
    pub incumbent_trace: Vec<f64>,
}

impl Default for MipSolution {
    fn default() -> Self {
        Self {
            status: MipStatus::Infeasible,
            x: Vec::new(),
            obj_val: f64::NAN,
            bound: f64::NAN,
            gap: f64::INFINITY,
            nodes_explored: 0,
            nodes_pruned: 0,
            nodes_infeasible: 0,
            solve_time_ms: 0,
            incumbent_updates: 0,
            incumbent_trace: Vec::new(),
        }
    }
}

impl MipSolution {
    /// Create a solution indicating infeasibility.
    pub fn infeasible() -> Self {
        Self {
            status: MipStatus::Infeasible,
            ..Default::default()
        }
    }

    /// True if an integral assignment is available.
    pub fn has_solution(&self) -> bool {
        self.obj_val.is_finite()
    }

    /// True if the assignment is proven optimal.
    pub fn proven_optimal(&self) -> bool {
        self.has_solution() && self.status.is_optimal()
    }

    /// Compute relative gap.
    pub fn compute_gap(primal: f64, dual: f64) -> f64 {
        if !primal.is_finite() || !dual.is_finite() {
            return f64::INFINITY;
        }
        let denom = primal.abs().max(1e-10);
        (primal - dual).abs() / denom
    }
}

/// Tracks the best known feasible solution (incumbent).
///
/// Values are in minimization form; the caller converts back to the
/// model's sense when reporting.
#[derive(Debug, Clone)]
pub struct IncumbentTracker {
    /// Current best solution (if any).
    pub solution: Option<Vec<f64>>,

    /// Objective value of incumbent (primal bound).
    /// Initialized to +inf.
    pub obj_val: f64,

    /// Number of times incumbent was updated.
    pub update_count: u64,

    /// Objective after each accepted update.
    pub trace: Vec<f64>,
}

impl Default for IncumbentTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl IncumbentTracker {
    /// Create a new incumbent tracker.
    pub fn new() -> Self {
        Self {
            solution: None,
            obj_val: f64::INFINITY,
            update_count: 0,
            trace: Vec::new(),
        }
    }

    /// Check if we have an incumbent.
    pub fn has_incumbent(&self) -> bool {
        self.solution.is_some()
    }

    /// Try to update incumbent with a new solution.
    ///
    /// Returns true if the incumbent was improved.
    pub fn update(&mut self, x: &[f64], obj: f64) -> bool {
        // Accept only strict improvements
        if obj < self.obj_val - 1e-9 {
            self.solution = Some(x.to_vec());
            self.obj_val = obj;
            self.update_count += 1;
            self.trace.push(obj);
            true
        } else {
            false
        }
    }

    /// Compute relative gap to a dual bound.
    pub fn gap(&self, dual_bound: f64) -> f64 {
        MipSolution::compute_gap(self.obj_val, dual_bound)
    }
}

/// Incumbent shared between branch-and-bound workers.
///
/// Value and assignment always change together under one lock.
#[derive(Debug, Default)]
pub struct SharedIncumbent {
    inner: Mutex<IncumbentTracker>,
}

impl SharedIncumbent {
    /// Wrap a tracker.
    pub fn new(tracker: IncumbentTracker) -> Self {
        Self {
            inner: Mutex::new(tracker),
        }
    }

    /// Lock the tracker. A poisoned lock still yields the data: the tracker
    /// is only mutated through `update`, which cannot leave it half-written.
    pub fn lock(&self) -> MutexGuard<'_, IncumbentTracker> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current incumbent objective (+inf if none).
    pub fn obj_val(&self) -> f64 {
        self.lock().obj_val
    }

    /// Try to improve the incumbent.
    pub fn update(&self, x: &[f64], obj: f64) -> bool {
        self.lock().update(x, obj)
    }

    /// Unwrap the tracker.
    pub fn into_inner(self) -> IncumbentTracker {
        self.inner.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}
