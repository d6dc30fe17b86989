//! Search node representation.

use crate::model::MipProblem;

/// Status of a search node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// Node was created but its relaxation has not been solved.
    Pending,

    /// Relaxation solved; waiting in the queue.
    Relaxed,

    /// Node was pruned (bound >= incumbent).
    Pruned,

    /// Node LP relaxation (or bound propagation) is infeasible.
    Infeasible,

    /// Node produced an integer-feasible solution.
    IntegerFeasible,

    /// Node was branched (children created).
    Branched,
}

/// A bound change from branching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundChange {
    /// Variable index.
    pub var: usize,

    /// Previous lower bound.
    pub old_lb: f64,

    /// Previous upper bound.
    pub old_ub: f64,

    /// New lower bound.
    pub new_lb: f64,

    /// New upper bound.
    pub new_ub: f64,
}

impl BoundChange {
    /// Create a "down" branch: x <= floor(value).
    pub fn down_branch(var: usize, old_lb: f64, old_ub: f64, value: f64) -> Self {
        Self {
            var,
            old_lb,
            old_ub,
            new_lb: old_lb,
            new_ub: value.floor().min(old_ub),
        }
    }

    /// Create an "up" branch: x >= ceil(value).
    pub fn up_branch(var: usize, old_lb: f64, old_ub: f64, value: f64) -> Self {
        Self {
            var,
            old_lb,
            old_ub,
            new_lb: value.ceil().max(old_lb),
            new_ub: old_ub,
        }
    }

    /// Check if the bound change creates an empty domain.
    pub fn is_infeasible(&self) -> bool {
        self.new_lb > self.new_ub + 1e-9
    }
}

/// A node in the B&B search tree.
///
/// A node never copies the model: it only carries the bound changes made
/// on the path from the root, layered over the problem's root bounds.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Unique node identifier.
    pub id: u64,

    /// Parent node ID (None for root).
    pub parent_id: Option<u64>,

    /// Depth in the tree (0 for root).
    pub depth: usize,

    /// Bound changes accumulated from the root to this node, in order.
    pub bound_changes: Vec<BoundChange>,

    /// Dual bound at this node in minimization form.
    /// Lower bound on optimal objective in this subtree.
    pub dual_bound: f64,

    /// Relaxed point (empty until the node is relaxed).
    pub relaxation: Vec<f64>,

    /// Node processing status.
    pub status: NodeStatus,
}

impl SearchNode {
    /// Create the root node.
    pub fn root() -> Self {
        Self {
            id: 0,
            parent_id: None,
            depth: 0,
            bound_changes: Vec::new(),
            dual_bound: f64::NEG_INFINITY,
            relaxation: Vec::new(),
            status: NodeStatus::Pending,
        }
    }

    /// Create a child node from a bound change.
    ///
    /// The child inherits every change on the parent's path.
    pub fn child(&self, id: u64, bound_change: BoundChange) -> Self {
        let mut bound_changes = Vec::with_capacity(self.bound_changes.len() + 1);
        bound_changes.extend_from_slice(&self.bound_changes);
        bound_changes.push(bound_change);

        Self {
            id,
            parent_id: Some(self.id),
            depth: self.depth + 1,
            bound_changes,
            dual_bound: self.dual_bound, // Inherit parent's bound until relaxed
            relaxation: Vec::new(),
            status: NodeStatus::Pending,
        }
    }

    /// Variable bounds at this node (before propagation).
    pub fn bounds(&self, prob: &MipProblem) -> (Vec<f64>, Vec<f64>) {
        prob.bounds_with(
            self.bound_changes
                .iter()
                .map(|bc| (bc.var, bc.new_lb, bc.new_ub)),
        )
    }

    /// Check if this node can be pruned by an incumbent.
    ///
    /// A node can be pruned if its dual bound >= incumbent objective - tol.
    pub fn can_prune(&self, incumbent_obj: f64, tol: f64) -> bool {
        self.dual_bound >= incumbent_obj - tol
    }
}
