//! Error types for model building and LP solving.

use thiserror::Error;

/// Errors raised by the linear model and the simplex solver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A constraint or objective names a variable the model never registered.
    #[error("Invalid reference: variable {var} but model has {num_vars} variables")]
    InvalidReference {
        /// Offending variable index.
        var: usize,
        /// Number of variables registered in the model.
        num_vars: usize,
    },

    /// A variable bound is NaN or otherwise unusable.
    #[error("Invalid bounds on variable {var}: [{lower}, {upper}]")]
    InvalidBounds {
        /// Variable index.
        var: usize,
        /// Lower bound.
        lower: f64,
        /// Upper bound.
        upper: f64,
    },

    /// Bound vectors do not match the number of variables.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// The simplex hit its hard pivot cap.
    #[error("Simplex pivot limit of {0} reached")]
    IterationLimit(usize),

    /// The deadline in the solver settings passed mid-solve.
    #[error("Simplex deadline reached")]
    TimeLimit,

    /// The interrupt flag in the solver settings was raised mid-solve.
    #[error("Simplex interrupted")]
    Interrupted,
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
