//! Configuration settings for the MIP solver.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use solver_core::SolverSettings;

/// Branching variable selection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchingRule {
    /// Select variable with fractional part closest to 0.5 (lowest index on ties).
    #[default]
    MostFractional,

    /// Select the lowest-index fractional variable.
    FirstFractional,
}

/// Node selection strategy for the B&B tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeSelection {
    /// Deepest node first; among siblings the better relaxation bound first.
    #[default]
    DepthFirst,

    /// Always select node with best dual bound.
    BestBound,
}

/// MIP solver settings.
#[derive(Debug, Clone)]
pub struct MipSettings {
    // === Termination criteria ===
    /// Maximum number of nodes to explore.
    pub max_nodes: u64,

    /// Time limit in milliseconds (None = unlimited).
    pub time_limit_ms: Option<u64>,

    /// Relative optimality gap tolerance.
    /// Stop when (incumbent - bound) / |incumbent| <= gap_tol.
    pub gap_tol: f64,

    /// Absolute optimality gap tolerance, also used when pruning.
    pub gap_abs_tol: f64,

    /// Integer feasibility tolerance.
    /// A variable is considered integer if |x - round(x)| <= int_feas_tol.
    pub int_feas_tol: f64,

    /// Tolerance for re-validating a rounded candidate against every row.
    pub feas_tol: f64,

    /// External cancellation flag, polled between node expansions.
    pub interrupt: Option<Arc<AtomicBool>>,

    // === Search strategy ===
    /// Branching variable selection rule.
    pub branching_rule: BranchingRule,

    /// Node selection strategy.
    pub node_selection: NodeSelection,

    /// Run activity-based bound tightening before each relaxation.
    pub bound_tightening: bool,

    /// Worker threads; 1 runs the sequential engine.
    pub threads: usize,

    // === Solver settings ===
    /// Settings for the LP relaxation solver.
    pub lp_settings: SolverSettings,

    // === Output ===
    /// Print progress information.
    pub verbose: bool,

    /// Log frequency (print every N nodes).
    pub log_freq: u64,
}

impl Default for MipSettings {
    fn default() -> Self {
        Self {
            // Termination
            max_nodes: 1_000_000,
            time_limit_ms: None,
            gap_tol: 1e-6,
            gap_abs_tol: 1e-6,
            int_feas_tol: 1e-6,
            feas_tol: 1e-6,
            interrupt: None,

            // Search
            branching_rule: BranchingRule::default(),
            node_selection: NodeSelection::default(),
            bound_tightening: true,
            threads: 1,

            // Solver
            lp_settings: SolverSettings::default(),

            // Output
            verbose: false,
            log_freq: 100,
        }
    }
}

impl MipSettings {
    /// Create settings with verbose output enabled.
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            log_freq: 1,
            ..Self::default()
        }
    }

    /// Set time limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_ms = Some((seconds * 1000.0) as u64);
        self
    }

    /// Set maximum nodes.
    pub fn with_max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = nodes;
        self
    }

    /// Set optimality gap tolerance.
    pub fn with_gap_tol(mut self, tol: f64) -> Self {
        self.gap_tol = tol;
        self
    }

    /// Set the number of worker threads (at least 1).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Attach an external cancellation flag.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }
}
