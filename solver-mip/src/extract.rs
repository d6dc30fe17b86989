//! Reading combinatorial answers back out of MIP solutions.
//!
//! Both answer types print as two lines: `<objective> <proven flag>` and
//! the space-separated solution vector in input order.

use std::collections::BTreeSet;
use std::fmt;

use crate::encode::{ColoringEncoding, KnapsackEncoding};
use crate::error::{MipError, MipResult};
use crate::model::MipSolution;

/// Binary values at or above this read as 1.
const ONE_THRESHOLD: f64 = 0.5;

/// A node coloring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColoringSolution {
    /// Color of each node.
    pub colors: Vec<usize>,

    /// Number of distinct colors in `colors`.
    pub num_colors: usize,

    /// The color count is proven minimal.
    pub proven_optimal: bool,
}

impl ColoringSolution {
    /// Wrap a color vector, counting its distinct colors.
    pub fn from_colors(colors: Vec<usize>, proven_optimal: bool) -> Self {
        let num_colors = colors.iter().collect::<BTreeSet<_>>().len();
        Self {
            colors,
            num_colors,
            proven_optimal,
        }
    }
}

impl fmt::Display for ColoringSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.num_colors, u8::from(self.proven_optimal))?;
        write_vector(f, self.colors.iter())
    }
}

/// A knapsack packing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnapsackSolution {
    /// Whether each item is packed.
    pub take: Vec<bool>,

    /// Total value of the packed items.
    pub value: u64,

    /// Total weight of the packed items.
    pub weight: u64,

    /// The value is proven maximal.
    pub proven_optimal: bool,
}

impl fmt::Display for KnapsackSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.value, u8::from(self.proven_optimal))?;
        write_vector(f, self.take.iter().map(|&t| u8::from(t)))
    }
}

fn write_vector<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    values: impl Iterator<Item = T>,
) -> fmt::Result {
    for (i, v) in values.enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{v}")?;
    }
    Ok(())
}

/// Color per node from the best assignment.
///
/// The objective is recounted from the colors actually assigned.
pub fn extract_coloring(
    encoding: &ColoringEncoding,
    solution: &MipSolution,
) -> MipResult<ColoringSolution> {
    if !solution.has_solution() {
        return Err(MipError::NoFeasibleSolution);
    }
    check_len(solution, encoding.model.num_vars())?;

    let colors = encoding
        .x
        .iter()
        .enumerate()
        .map(|(node, row)| {
            row.iter()
                .position(|&var| solution.x[var] >= ONE_THRESHOLD)
                .ok_or_else(|| MipError::InternalError(format!("node {node} has no color")))
        })
        .collect::<MipResult<Vec<usize>>>()?;

    Ok(ColoringSolution::from_colors(
        colors,
        solution.proven_optimal(),
    ))
}

/// Take vector and totals from the best assignment.
pub fn extract_knapsack(
    encoding: &KnapsackEncoding,
    solution: &MipSolution,
) -> MipResult<KnapsackSolution> {
    if !solution.has_solution() {
        return Err(MipError::NoFeasibleSolution);
    }
    check_len(solution, encoding.model.num_vars())?;

    let take: Vec<bool> = encoding
        .take
        .iter()
        .map(|&var| solution.x[var] >= ONE_THRESHOLD)
        .collect();
    let (value, weight) = encoding.instance.totals(&take);
    if weight > encoding.instance.capacity {
        return Err(MipError::InternalError(format!(
            "packing weighs {weight}, capacity is {}",
            encoding.instance.capacity
        )));
    }

    Ok(KnapsackSolution {
        take,
        value,
        weight,
        proven_optimal: solution.proven_optimal(),
    })
}

fn check_len(solution: &MipSolution, num_vars: usize) -> MipResult<()> {
    if solution.x.len() != num_vars {
        return Err(MipError::InternalError(format!(
            "solution has {} values for {num_vars} variables",
            solution.x.len()
        )));
    }
    Ok(())
}
