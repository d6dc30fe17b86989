//! Error types for the MIP solver.

use solver_core::CoreError;
use thiserror::Error;

/// Errors that can occur during MIP solving.
#[derive(Error, Debug)]
pub enum MipError {
    /// A constraint or objective references an unregistered variable.
    /// Always a model-builder bug; never retried.
    #[error("Invalid reference: variable {var} but model has {num_vars} variables")]
    InvalidReference {
        /// Offending variable index.
        var: usize,
        /// Number of registered variables.
        num_vars: usize,
    },

    /// No integral solution exists for this parameterization.
    #[error("Problem is infeasible")]
    Infeasible,

    /// The root relaxation is unbounded (a modeling defect for bounded encodings).
    #[error("Relaxation is unbounded")]
    Unbounded,

    /// The search stopped before any integral candidate was found.
    #[error("No feasible solution found before the search stopped")]
    NoFeasibleSolution,

    /// A problem instance failed validation.
    #[error("Invalid instance: {0}")]
    InvalidInstance(String),

    /// Relaxation solve failed
    #[error("Master solve failed: {0}")]
    MasterSolveError(String),

    /// Internal solver error
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Solver-core error
    #[error("Solver core error: {0}")]
    Core(CoreError),
}

impl From<CoreError> for MipError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidReference { var, num_vars } => {
                MipError::InvalidReference { var, num_vars }
            }
            CoreError::IterationLimit(_) => MipError::MasterSolveError(err.to_string()),
            other => MipError::Core(other),
        }
    }
}

/// Result type for MIP operations.
pub type MipResult<T> = Result<T, MipError>;
