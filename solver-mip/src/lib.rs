//! Mixed-integer layer for the minix solver.
//!
//! Branch-and-bound over LP relaxations from [`solver_core`], plus encoders
//! that turn graph coloring and 0/1 knapsack instances into binary programs
//! and read the answers back.
//!
//! # Example
//!
//! ```
//! use solver_mip::{solve_knapsack, KnapsackInstance, MipSettings};
//!
//! let instance = KnapsackInstance::new(50, [(60, 10), (100, 20), (120, 30)]);
//! let packing = solve_knapsack(&instance, &MipSettings::default())?;
//! assert_eq!(packing.to_string(), "220 1\n0 1 1");
//! # Ok::<(), solver_mip::MipError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encode;
pub mod error;
pub mod extract;
pub mod master;
pub mod model;
pub mod search;
pub mod settings;
mod solve;

pub use encode::{
    encode_coloring, encode_knapsack, greedy_coloring, greedy_knapsack, knapsack_dp,
    ColoringEncoding, ColoringInstance, ColoringOptions, Item, KnapsackEncoding,
    KnapsackInstance, PaletteSize, SymmetryBreaking,
};
pub use error::{MipError, MipResult};
pub use extract::{extract_coloring, extract_knapsack, ColoringSolution, KnapsackSolution};
pub use master::{RelaxationBackend, SimplexBackend};
pub use model::{MipProblem, MipSolution, MipStatus};
pub use search::BranchAndBound;
pub use settings::{BranchingRule, MipSettings, NodeSelection};
pub use solve::{solve_coloring, solve_knapsack, solve_mip, solve_mip_with_start};
