//! Linear algebra layer.
//!
//! Sparse constraint-matrix assembly and products.

pub mod sparse;
