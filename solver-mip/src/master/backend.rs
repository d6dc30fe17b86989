//! Relaxation backend trait and types.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use solver_core::LinearModel;

use crate::error::MipResult;

/// Status of a master (LP relaxation) solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterStatus {
    /// Optimal solution found.
    Optimal,

    /// Master LP is infeasible (node can be pruned).
    Infeasible,

    /// Master is unbounded (shouldn't happen with proper bounds).
    Unbounded,

    /// The solve hit its iteration cap before settling.
    IterationLimit,

    /// The budget deadline passed mid-solve.
    TimeLimit,

    /// The budget interrupt flag was raised mid-solve.
    Interrupted,
}

impl MasterStatus {
    /// True if the solve stopped without deciding the relaxation.
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            MasterStatus::IterationLimit | MasterStatus::TimeLimit | MasterStatus::Interrupted
        )
    }
}

/// Time and cancellation limits for one relaxation solve.
#[derive(Debug, Clone, Default)]
pub struct SolveBudget {
    /// Stop once this instant has passed.
    pub deadline: Option<Instant>,

    /// Stop once this flag is raised.
    pub interrupt: Option<Arc<AtomicBool>>,
}

/// Result from solving the master problem.
#[derive(Debug, Clone)]
pub struct MasterResult {
    /// Solve status.
    pub status: MasterStatus,

    /// Primal solution x (empty unless optimal).
    pub x: Vec<f64>,

    /// Objective value in the model's own sense.
    pub obj_val: f64,

    /// Pivots spent on this solve.
    pub iterations: usize,
}

impl MasterResult {
    /// Create a result carrying only a status.
    pub fn without_point(status: MasterStatus) -> Self {
        Self {
            status,
            x: Vec::new(),
            obj_val: f64::NAN,
            iterations: 0,
        }
    }
}

/// Oracle for the LP relaxation of a node.
///
/// The base model is shared read-only; every call supplies the node's
/// bounds, so one backend serves all workers concurrently.
pub trait RelaxationBackend: Send + Sync {
    /// Solve the relaxation of `model` with bounds replaced by `lower`/`upper`,
    /// ignoring integrality.
    ///
    /// Running out of `budget` or of the backend's own iteration cap is
    /// reported through the status, not as an error.
    fn solve(
        &self,
        model: &LinearModel,
        lower: &[f64],
        upper: &[f64],
        budget: &SolveBudget,
    ) -> MipResult<MasterResult>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
