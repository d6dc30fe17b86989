//! Presolve.
//!
//! Only activity-based bound tightening: the MILP layer runs it on every
//! branch-and-bound node before the relaxation solve.

pub mod bounds;

pub use bounds::{tighten_bounds, BoundTightening};
