//! Minix core: linear models and their LP relaxations.
//!
//! This crate holds the solver-independent pieces of the MILP stack:
//!
//! - **Linear model** ([`LinearModel`]): variables with a domain kind and
//!   bounds, linear constraints stored as data, one objective.
//! - **LP relaxation** ([`simplex`]): a deterministic two-phase primal
//!   simplex that ignores integrality and reports `Optimal`, `Infeasible`
//!   or `Unbounded`.
//! - **Bound tightening** ([`presolve`]): activity-based propagation used
//!   before each relaxation solve.
//!
//! # Example
//!
//! ```
//! use solver_core::{solve, ConstraintSense, LinearExpr, LinearModel, ObjectiveSense,
//!                   SolveStatus, SolverSettings, VarType};
//!
//! // max x0 + x1  s.t.  x0 + 2 x1 <= 4,  3 x0 + x1 <= 6
//! let mut model = LinearModel::new();
//! let x0 = model.add_variable(VarType::Continuous, 0.0, f64::INFINITY);
//! let x1 = model.add_variable(VarType::Continuous, 0.0, f64::INFINITY);
//! model.add_constraint(
//!     LinearExpr::new().with_term(x0, 1.0).with_term(x1, 2.0),
//!     ConstraintSense::Le,
//!     4.0,
//! )?;
//! model.add_constraint(
//!     LinearExpr::new().with_term(x0, 3.0).with_term(x1, 1.0),
//!     ConstraintSense::Le,
//!     6.0,
//! )?;
//! model.set_objective(
//!     LinearExpr::new().with_term(x0, 1.0).with_term(x1, 1.0),
//!     ObjectiveSense::Maximize,
//! )?;
//!
//! let result = solve(&model, &SolverSettings::default())?;
//! assert_eq!(result.status, SolveStatus::Optimal);
//! assert!((result.obj_val - 2.8).abs() < 1e-9);
//! # Ok::<(), solver_core::CoreError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod linalg;
pub mod presolve;
pub mod problem;
pub mod simplex;

// Re-export main types
pub use error::{CoreError, CoreResult};
pub use problem::{
    Constraint, ConstraintSense, LinearExpr, LinearModel, Objective, ObjectiveSense, SolveInfo,
    SolveResult, SolveStatus, SolverSettings, VarType, Variable, DEFAULT_FEAS_TOL,
};
pub use simplex::{solve, solve_with_bounds};
