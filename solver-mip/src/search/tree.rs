//! Branch-and-bound tree controller.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use solver_core::presolve::tighten_bounds;

use super::{BranchDecision, BranchingSelector, NodeQueue, NodeStatus, SearchNode};
use crate::error::{MipError, MipResult};
use crate::master::{MasterStatus, RelaxationBackend, SolveBudget};
use crate::model::{IncumbentTracker, MipProblem, MipSolution, MipStatus, SharedIncumbent};
use crate::settings::MipSettings;

/// Propagation passes per node.
const MAX_PROPAGATION_PASSES: usize = 20;

/// Outcome of a node relaxation.
#[derive(Debug)]
enum Relaxation {
    Infeasible,
    Unbounded,
    Solved { bound: f64, x: Vec<f64> },
    /// The solve ran out of budget before deciding the node.
    Stopped(MipStatus),
}

/// What expanding one node produced.
#[derive(Debug, Default)]
struct Expansion {
    /// Relaxed children still worth exploring (ids unassigned).
    children: Vec<SearchNode>,
    /// Children discarded by bound right after relaxation.
    pruned: u64,
    /// Children (or the node itself) proven infeasible.
    infeasible: u64,
    /// The incumbent improved.
    improved: bool,
    /// A relaxation ran out of budget; the search stops with this status.
    stopped: Option<MipStatus>,
    /// Node to put back in the queue because its children were not settled.
    unfinished: Option<SearchNode>,
}

/// Branch-and-bound tree controller.
///
/// Manages the node queue, incumbent, and termination. Generic over the
/// relaxation oracle; the problem is shared read-only by every node.
pub struct BranchAndBound<'a, B: RelaxationBackend> {
    /// Problem being solved.
    prob: &'a MipProblem,

    /// LP relaxation oracle.
    backend: &'a B,

    /// Node queue.
    queue: NodeQueue,

    /// Branching variable selector.
    branching: BranchingSelector,

    /// Incumbent solution, shared with workers.
    incumbent: SharedIncumbent,

    /// Next node ID to assign.
    next_node_id: u64,

    /// Total nodes explored.
    nodes_explored: u64,

    /// Nodes pruned.
    nodes_pruned: u64,

    /// Nodes proven infeasible.
    nodes_infeasible: u64,

    /// Node count at which the next progress line is due.
    next_log: u64,

    /// Start time.
    start_time: Instant,

    /// Deadline and interrupt handed to every relaxation solve.
    budget: SolveBudget,

    /// Settings.
    settings: MipSettings,
}

impl<'a, B: RelaxationBackend> BranchAndBound<'a, B> {
    /// Create a new B&B controller.
    pub fn new(prob: &'a MipProblem, backend: &'a B, settings: MipSettings) -> Self {
        Self {
            prob,
            backend,
            queue: NodeQueue::new(settings.node_selection),
            branching: BranchingSelector::new(settings.branching_rule),
            incumbent: SharedIncumbent::new(IncumbentTracker::new()),
            next_node_id: 1, // 0 reserved for root
            nodes_explored: 0,
            nodes_pruned: 0,
            nodes_infeasible: 0,
            next_log: 0,
            start_time: Instant::now(),
            budget: SolveBudget::default(),
            settings,
        }
    }

    /// Offer a known integral assignment as the starting incumbent.
    ///
    /// The point is validated against every row, bound and integrality
    /// requirement; returns false if it is rejected or not an improvement.
    pub fn set_incumbent(&mut self, x: &[f64]) -> bool {
        let model = &self.prob.model;
        if x.len() != model.num_vars() {
            log::warn!(
                "Warm start rejected: {} values for {} variables",
                x.len(),
                model.num_vars()
            );
            return false;
        }
        if !model.is_feasible_with_tol(x, self.settings.feas_tol) {
            log::warn!(
                "Warm start rejected: max violation {:.3e}",
                model.max_violation(x)
            );
            return false;
        }
        let obj = self.prob.internal_objective(x);
        let improved = self.incumbent.update(x, obj);
        if improved && self.settings.verbose {
            log::info!(
                "Warm start incumbent: obj={:.6e}",
                self.prob.native_objective(obj)
            );
        }
        improved
    }

    /// Run the search to completion or until a limit is hit.
    ///
    /// Fails with [`MipError::Unbounded`] if the root relaxation is unbounded.
    pub fn solve(mut self) -> MipResult<MipSolution> {
        self.start_time = Instant::now();
        self.budget = SolveBudget {
            deadline: self
                .settings
                .time_limit_ms
                .map(|ms| self.start_time + Duration::from_millis(ms)),
            interrupt: self.settings.interrupt.clone(),
        };

        if self.settings.verbose {
            log::info!(
                "Branch-and-bound: {} vars ({} integer, {} binary), {} rows, backend={}, threads={}",
                self.prob.num_vars(),
                self.prob.num_integers(),
                self.prob.binary_vars.len(),
                self.prob.num_constraints(),
                self.backend.name(),
                self.settings.threads,
            );
        }

        let mut root = SearchNode::root();
        match self.relax(&root)? {
            Relaxation::Infeasible => {
                self.nodes_infeasible += 1;
                return Ok(self.finalize(MipStatus::Infeasible));
            }
            Relaxation::Unbounded => return Err(MipError::Unbounded),
            Relaxation::Stopped(status) => {
                // Root stays open so the reported bound is unknown
                self.queue.push(root);
                return Ok(self.finalize(status));
            }
            Relaxation::Solved { bound, x } => {
                root.dual_bound = bound;
                root.relaxation = x;
                root.status = NodeStatus::Relaxed;
            }
        }
        if self.settings.verbose {
            log::info!(
                "Root relaxation: bound={:.6e}",
                self.prob.native_objective(root.dual_bound)
            );
        }
        self.enqueue(root);

        let pool = if self.settings.threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.settings.threads)
                    .build()
                    .map_err(|e| MipError::InternalError(e.to_string()))?,
            )
        } else {
            None
        };

        let status = loop {
            if let Some(status) = self.check_termination() {
                break status;
            }

            let batch = self.next_batch();
            if batch.is_empty() {
                continue;
            }
            self.nodes_explored += batch.len() as u64;

            let expansions: Vec<MipResult<Expansion>> = match &pool {
                Some(pool) => {
                    let this = &self;
                    pool.install(|| {
                        batch
                            .into_par_iter()
                            .map(|node| this.expand(node))
                            .collect()
                    })
                }
                None => batch.into_iter().map(|node| self.expand(node)).collect(),
            };

            let mut improved = false;
            let mut stop = None;
            for expansion in expansions {
                let expansion = expansion?;
                if let Some(status) = expansion.stopped {
                    stop.get_or_insert(status);
                }
                if let Some(node) = expansion.unfinished {
                    self.nodes_explored -= 1;
                    self.queue.push(node);
                }
                improved |= expansion.improved;
                self.nodes_pruned += expansion.pruned;
                self.nodes_infeasible += expansion.infeasible;
                for child in expansion.children {
                    self.enqueue(child);
                }
            }

            if improved {
                let obj = self.incumbent.obj_val();
                let pruned = self.queue.prune_by_bound(obj, self.settings.gap_abs_tol);
                self.nodes_pruned += pruned as u64;
                if self.settings.verbose {
                    log::info!(
                        "New incumbent: obj={:.6e}, pruned {} nodes",
                        self.prob.native_objective(obj),
                        pruned
                    );
                }
            }

            if let Some(status) = stop {
                break status;
            }
            self.log_progress();
        };

        let verbose = self.settings.verbose;
        let solution = self.finalize(status);
        if verbose {
            log::info!(
                "Finished: {:?} obj={:.6e} bound={:.6e} nodes={} time={}ms",
                solution.status,
                solution.obj_val,
                solution.bound,
                solution.nodes_explored,
                solution.solve_time_ms,
            );
        }
        Ok(solution)
    }

    /// Pop up to `threads` nodes, dropping those the incumbent dominates.
    fn next_batch(&mut self) -> Vec<SearchNode> {
        let remaining = self.settings.max_nodes.saturating_sub(self.nodes_explored);
        let width = (self.settings.threads.max(1) as u64).min(remaining) as usize;
        let incumbent = self.incumbent.obj_val();

        let mut batch = Vec::with_capacity(width);
        while batch.len() < width {
            let Some(mut node) = self.queue.pop() else {
                break;
            };
            if node.can_prune(incumbent, self.settings.gap_abs_tol) {
                node.status = NodeStatus::Pruned;
                self.nodes_pruned += 1;
                log::debug!("Node {} pruned (bound {:.6e})", node.id, node.dual_bound);
                continue;
            }
            batch.push(node);
        }
        batch
    }

    /// Assign an id and queue a relaxed node.
    fn enqueue(&mut self, mut node: SearchNode) {
        if node.parent_id.is_some() {
            node.id = self.next_node_id;
            self.next_node_id += 1;
        }
        self.queue.push(node);
    }

    /// Process one relaxed node: accept it as an incumbent or branch on it.
    fn expand(&self, mut node: SearchNode) -> MipResult<Expansion> {
        let mut expansion = Expansion::default();
        let (lower, upper) = node.bounds(self.prob);
        let tol = self.settings.int_feas_tol;

        let decision = match self
            .branching
            .select(&node.relaxation, self.prob, &lower, &upper, tol)
        {
            Some(decision) => decision,
            None => {
                let mut candidate = node.relaxation.clone();
                self.prob.round_integers(&mut candidate);
                if self
                    .prob
                    .model
                    .is_feasible_with_tol(&candidate, self.settings.feas_tol)
                {
                    node.status = NodeStatus::IntegerFeasible;
                    let obj = self.prob.internal_objective(&candidate);
                    expansion.improved = self.incumbent.update(&candidate, obj);
                    log::debug!(
                        "Node {} integer feasible: obj={:.6e} improved={}",
                        node.id,
                        self.prob.native_objective(obj),
                        expansion.improved
                    );
                    return Ok(expansion);
                }

                log::warn!(
                    "Node {}: rounded relaxation violates the model by {:.3e}, branching instead",
                    node.id,
                    self.prob.model.max_violation(&candidate)
                );
                match self
                    .branching
                    .select_least_integral(&node.relaxation, self.prob, &lower, &upper)
                {
                    Some(decision) => decision,
                    None => {
                        node.status = NodeStatus::Infeasible;
                        expansion.infeasible += 1;
                        return Ok(expansion);
                    }
                }
            }
        };

        node.status = NodeStatus::Branched;
        log::debug!(
            "Node {} (depth {}): branch on x{} = {:.6}",
            node.id,
            node.depth,
            decision.var,
            decision.value
        );
        self.branch(&node, decision, &mut expansion)?;
        if let Some(status) = expansion.stopped {
            node.status = NodeStatus::Relaxed;
            return Ok(Expansion {
                stopped: Some(status),
                unfinished: Some(node),
                ..Expansion::default()
            });
        }
        Ok(expansion)
    }

    /// Create and relax both children of a branching decision.
    fn branch(
        &self,
        parent: &SearchNode,
        decision: BranchDecision,
        expansion: &mut Expansion,
    ) -> MipResult<()> {
        for change in [decision.down_branch, decision.up_branch] {
            if change.is_infeasible() {
                expansion.infeasible += 1;
                continue;
            }
            let mut child = parent.child(0, change);
            match self.relax(&child)? {
                Relaxation::Infeasible => {
                    child.status = NodeStatus::Infeasible;
                    expansion.infeasible += 1;
                }
                Relaxation::Unbounded => {
                    return Err(MipError::InternalError(format!(
                        "relaxation below node {} is unbounded",
                        parent.id
                    )));
                }
                Relaxation::Stopped(status) => {
                    log::debug!("Node {}: child relaxation stopped ({:?})", parent.id, status);
                    expansion.stopped = Some(status);
                    return Ok(());
                }
                Relaxation::Solved { bound, x } => {
                    child.dual_bound = bound;
                    child.relaxation = x;
                    if child.can_prune(self.incumbent.obj_val(), self.settings.gap_abs_tol) {
                        child.status = NodeStatus::Pruned;
                        expansion.pruned += 1;
                    } else {
                        child.status = NodeStatus::Relaxed;
                        expansion.children.push(child);
                    }
                }
            }
        }
        Ok(())
    }

    /// Tighten the node's bounds and solve its relaxation.
    fn relax(&self, node: &SearchNode) -> MipResult<Relaxation> {
        let (mut lower, mut upper) = node.bounds(self.prob);

        if self.settings.bound_tightening {
            let outcome = tighten_bounds(
                &self.prob.model,
                &mut lower,
                &mut upper,
                self.settings.feas_tol,
                MAX_PROPAGATION_PASSES,
            );
            if outcome.is_infeasible() {
                return Ok(Relaxation::Infeasible);
            }
            // Propagation accepts domains crossed by up to feas_tol
            for (lo, hi) in lower.iter_mut().zip(upper.iter()) {
                *lo = lo.min(*hi);
            }
        }

        let result = self
            .backend
            .solve(&self.prob.model, &lower, &upper, &self.budget)?;
        Ok(match result.status {
            MasterStatus::Optimal => Relaxation::Solved {
                bound: self.prob.dual_bound(result.obj_val, self.settings.feas_tol),
                x: result.x,
            },
            MasterStatus::Infeasible => Relaxation::Infeasible,
            MasterStatus::Unbounded => Relaxation::Unbounded,
            MasterStatus::IterationLimit => Relaxation::Stopped(MipStatus::IterationLimit),
            MasterStatus::TimeLimit => Relaxation::Stopped(MipStatus::TimeLimit),
            MasterStatus::Interrupted => Relaxation::Stopped(MipStatus::Interrupted),
        })
    }

    /// Get the best dual bound (minimization form).
    pub fn best_bound(&self) -> f64 {
        let incumbent = self.incumbent.obj_val();
        if self.queue.is_empty() {
            incumbent
        } else {
            self.queue.best_bound().min(incumbent)
        }
    }

    /// Get the current optimality gap.
    pub fn gap(&self) -> f64 {
        let bound = self.best_bound();
        self.incumbent.lock().gap(bound)
    }

    /// Get elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Check if time limit is exceeded.
    pub fn time_limit_exceeded(&self) -> bool {
        self.settings
            .time_limit_ms
            .is_some_and(|limit| self.elapsed_ms() >= limit)
    }

    fn interrupted(&self) -> bool {
        self.settings
            .interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Check termination conditions.
    ///
    /// Returns Some(status) if we should terminate, None otherwise.
    fn check_termination(&self) -> Option<MipStatus> {
        let has_incumbent = self.incumbent.lock().has_incumbent();

        // Queue empty: search is complete
        if self.queue.is_empty() {
            return Some(if has_incumbent {
                MipStatus::Optimal
            } else {
                MipStatus::Infeasible
            });
        }

        if self.interrupted() {
            return Some(MipStatus::Interrupted);
        }

        if self.time_limit_exceeded() {
            return Some(MipStatus::TimeLimit);
        }

        if self.nodes_explored >= self.settings.max_nodes {
            return Some(MipStatus::NodeLimit);
        }

        // Gap closed. Node bounds are already rounded on integral objectives,
        // so there the bound has to meet the incumbent.
        if has_incumbent && self.gap() <= self.settings.gap_tol {
            let slack = self.incumbent.obj_val() - self.best_bound();
            if !self.prob.objective_integral || slack <= self.settings.gap_abs_tol {
                return Some(MipStatus::GapLimit);
            }
        }

        None
    }

    /// Finalize the solve and return the solution in the model's sense.
    fn finalize(self, status: MipStatus) -> MipSolution {
        let bound = self.best_bound();
        let solve_time_ms = self.elapsed_ms();
        let prob = self.prob;
        let tracker = self.incumbent.into_inner();
        let gap = tracker.gap(bound);

        MipSolution {
            status,
            obj_val: if tracker.has_incumbent() {
                prob.native_objective(tracker.obj_val)
            } else {
                f64::NAN
            },
            x: tracker.solution.unwrap_or_default(),
            bound: prob.native_objective(bound),
            gap,
            nodes_explored: self.nodes_explored,
            nodes_pruned: self.nodes_pruned,
            nodes_infeasible: self.nodes_infeasible,
            solve_time_ms,
            incumbent_updates: tracker.update_count,
            incumbent_trace: tracker
                .trace
                .iter()
                .map(|&v| prob.native_objective(v))
                .collect(),
        }
    }

    /// Log progress (if verbose).
    fn log_progress(&mut self) {
        if !self.settings.verbose || self.nodes_explored < self.next_log {
            return;
        }
        self.next_log = self.nodes_explored + self.settings.log_freq.max(1);

        log::info!(
            "Nodes: {} ({} open) | Bound: {:.6e} | Incumbent: {:.6e} | Gap: {:.2}% | Time: {:.1}s",
            self.nodes_explored,
            self.queue.len(),
            self.prob.native_objective(self.best_bound()),
            self.prob.native_objective(self.incumbent.obj_val()),
            self.gap() * 100.0,
            self.elapsed_ms() as f64 / 1000.0,
        );
    }
}
