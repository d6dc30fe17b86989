//! Master problem (LP relaxation) management.

mod backend;
mod simplex_backend;

pub use backend::{MasterResult, MasterStatus, RelaxationBackend, SolveBudget};
pub use simplex_backend::SimplexBackend;
