//! Encoders from combinatorial instances to binary linear models.

mod coloring;
mod knapsack;

pub use coloring::{
    encode_coloring, greedy_coloring, ColoringEncoding, ColoringInstance, ColoringOptions,
    PaletteSize, SymmetryBreaking,
};
pub use knapsack::{encode_knapsack, greedy_knapsack, knapsack_dp, Item, KnapsackEncoding, KnapsackInstance};
