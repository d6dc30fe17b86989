//! Graph coloring as a binary program.
//!
//! For a palette of `k` colors the model has one binary `x[n,c]` per node
//! and color and one binary `used[c]` per color:
//!
//! ```text
//! minimize    Σ_c used[c]
//! subject to  Σ_c x[n,c] = 1                 for every node n
//!             x[u,c] + x[v,c] <= used[c]     for every edge (u, v) and color c
//!             x[n,c] <= used[c]              for every isolated node n and color c
//! ```
//!
//! plus the rows of the chosen [`SymmetryBreaking`] policy.

use std::collections::BTreeSet;

use solver_core::{ConstraintSense, LinearExpr, LinearModel, ObjectiveSense};

use crate::error::{MipError, MipResult};

/// An undirected simple graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColoringInstance {
    /// Number of nodes, labelled `0..node_count`.
    pub node_count: usize,

    /// Edges as `(u, v)` with `u < v`, sorted and without duplicates.
    pub edges: Vec<(usize, usize)>,
}

impl ColoringInstance {
    /// Build and validate an instance.
    ///
    /// Endpoints must be below `node_count` and self-loops are rejected.
    /// Duplicate edges (in either orientation) are merged.
    pub fn new<I>(node_count: usize, edges: I) -> MipResult<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut unique = BTreeSet::new();
        for (u, v) in edges {
            if u >= node_count || v >= node_count {
                return Err(MipError::InvalidInstance(format!(
                    "edge ({u}, {v}) references a node outside 0..{node_count}"
                )));
            }
            if u == v {
                return Err(MipError::InvalidInstance(format!("self-loop on node {u}")));
            }
            unique.insert((u.min(v), u.max(v)));
        }
        Ok(Self {
            node_count,
            edges: unique.into_iter().collect(),
        })
    }

    /// Degree of every node.
    pub fn degrees(&self) -> Vec<usize> {
        let mut deg = vec![0; self.node_count];
        for &(u, v) in &self.edges {
            deg[u] += 1;
            deg[v] += 1;
        }
        deg
    }

    /// Neighbor lists, each sorted.
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.node_count];
        for &(u, v) in &self.edges {
            adj[u].push(v);
            adj[v].push(u);
        }
        for list in &mut adj {
            list.sort_unstable();
        }
        adj
    }

    /// True if `colors` gives every node a color and no edge a repeated one.
    pub fn is_valid_coloring(&self, colors: &[usize]) -> bool {
        colors.len() == self.node_count && self.edges.iter().all(|&(u, v)| colors[u] != colors[v])
    }
}

/// Symmetry-breaking rows added to the coloring model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymmetryBreaking {
    /// Plain model.
    None,

    /// Colors are opened in order: `used[c] <= used[c-1]`, and a color is
    /// only marked used if some node takes it: `used[c] <= Σ_n x[n,c]`.
    ColorOrdering,

    /// `ColorOrdering` plus `x[0,0] = 1`.
    #[default]
    ColorOrderingAnchor,
}

/// How many colors the model offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteSize {
    /// Exactly `k` colors; an infeasible palette is an error.
    Fixed(usize),

    /// Start at `max(1, ceil(n / 4))` and add one color whenever the
    /// palette proves infeasible, up to `n`.
    #[default]
    Heuristic,
}

impl PaletteSize {
    /// First palette to try and the largest one allowed, for `n` nodes.
    pub fn range(self, node_count: usize) -> (usize, usize) {
        match self {
            PaletteSize::Fixed(k) => (k, k),
            PaletteSize::Heuristic => {
                let max = node_count.max(1);
                (node_count.div_ceil(4).clamp(1, max), max)
            }
        }
    }
}

/// Options for [`crate::solve_coloring`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColoringOptions {
    /// Symmetry-breaking policy.
    pub symmetry: SymmetryBreaking,

    /// Palette sizing.
    pub palette: PaletteSize,

    /// Seed the search with a largest-degree-first greedy coloring.
    pub greedy_warm_start: bool,
}

impl Default for ColoringOptions {
    fn default() -> Self {
        Self {
            symmetry: SymmetryBreaking::default(),
            palette: PaletteSize::default(),
            greedy_warm_start: true,
        }
    }
}

/// A coloring model plus the variable layout needed to read it back.
#[derive(Debug, Clone)]
pub struct ColoringEncoding {
    /// The binary program.
    pub model: LinearModel,

    /// Number of nodes.
    pub node_count: usize,

    /// Number of colors offered.
    pub palette: usize,

    /// `x[n][c]`: node `n` takes color `c`.
    pub x: Vec<Vec<usize>>,

    /// `used[c]`: color `c` is used by some node.
    pub used: Vec<usize>,
}

impl ColoringEncoding {
    /// Model assignment for a coloring, or None if it does not fit the
    /// palette. Colors must be canonical (see [`greedy_coloring`]) for the
    /// point to satisfy the ordering rows.
    pub fn assignment(&self, colors: &[usize]) -> Option<Vec<f64>> {
        if colors.len() != self.node_count || colors.iter().any(|&c| c >= self.palette) {
            return None;
        }
        let mut values = vec![0.0; self.model.num_vars()];
        for (n, &c) in colors.iter().enumerate() {
            values[self.x[n][c]] = 1.0;
            values[self.used[c]] = 1.0;
        }
        Some(values)
    }
}

/// Build the coloring model for a palette of `palette` colors.
pub fn encode_coloring(
    instance: &ColoringInstance,
    palette: usize,
    symmetry: SymmetryBreaking,
) -> MipResult<ColoringEncoding> {
    let n = instance.node_count;
    if palette == 0 && n > 0 {
        return Err(MipError::InvalidInstance(
            "palette must offer at least one color".to_string(),
        ));
    }

    let mut model = LinearModel::new();
    let x: Vec<Vec<usize>> = (0..n)
        .map(|_| (0..palette).map(|_| model.add_binary()).collect())
        .collect();
    let used: Vec<usize> = (0..palette).map(|_| model.add_binary()).collect();

    // One color per node
    for (node, row) in x.iter().enumerate() {
        let expr: LinearExpr = row.iter().map(|&v| (v, 1.0)).collect();
        model.add_named_constraint(format!("assign_{node}"), expr, ConstraintSense::Eq, 1.0)?;
    }

    // Endpoints differ, and a color taken by an endpoint is marked used
    for &(u, v) in &instance.edges {
        for c in 0..palette {
            let expr = LinearExpr::new()
                .with_term(x[u][c], 1.0)
                .with_term(x[v][c], 1.0)
                .with_term(used[c], -1.0);
            model.add_constraint(expr, ConstraintSense::Le, 0.0)?;
        }
    }

    // Isolated nodes have no edge row to link them to used[c]
    for (node, &deg) in instance.degrees().iter().enumerate() {
        if deg > 0 {
            continue;
        }
        for c in 0..palette {
            let expr = LinearExpr::new()
                .with_term(x[node][c], 1.0)
                .with_term(used[c], -1.0);
            model.add_constraint(expr, ConstraintSense::Le, 0.0)?;
        }
    }

    if symmetry != SymmetryBreaking::None {
        for c in 1..palette {
            let expr = LinearExpr::new()
                .with_term(used[c], 1.0)
                .with_term(used[c - 1], -1.0);
            model.add_named_constraint(format!("order_{c}"), expr, ConstraintSense::Le, 0.0)?;
        }
        for c in 0..palette {
            let mut expr = LinearExpr::new().with_term(used[c], 1.0);
            for row in &x {
                expr.add_term(row[c], -1.0);
            }
            model.add_constraint(expr, ConstraintSense::Le, 0.0)?;
        }
    }

    if symmetry == SymmetryBreaking::ColorOrderingAnchor && n > 0 {
        model.add_named_constraint(
            "anchor",
            LinearExpr::new().with_term(x[0][0], 1.0),
            ConstraintSense::Eq,
            1.0,
        )?;
    }

    model.set_objective(used.iter().map(|&u| (u, 1.0)).collect(), ObjectiveSense::Minimize)?;

    Ok(ColoringEncoding {
        model,
        node_count: n,
        palette,
        x,
        used,
    })
}

/// Largest-degree-first greedy coloring.
///
/// Nodes are visited by decreasing degree (lowest index on ties) and take
/// the smallest color no colored neighbor has. Colors are then relabelled
/// by first appearance in node order, so node 0 has color 0 and the colors
/// in use are exactly `0..k`.
pub fn greedy_coloring(instance: &ColoringInstance) -> Vec<usize> {
    let n = instance.node_count;
    let adj = instance.adjacency();
    let degrees = instance.degrees();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| degrees[b].cmp(&degrees[a]).then(a.cmp(&b)));

    let mut colors: Vec<Option<usize>> = vec![None; n];
    let mut taken = Vec::new();
    for &node in &order {
        taken.clear();
        taken.extend(adj[node].iter().filter_map(|&nb| colors[nb]));
        taken.sort_unstable();
        taken.dedup();
        let color = taken
            .iter()
            .enumerate()
            .find(|&(i, &c)| i != c)
            .map_or(taken.len(), |(i, _)| i);
        colors[node] = Some(color);
    }

    // Relabel by first appearance
    let mut relabel: Vec<Option<usize>> = vec![None; n];
    let mut next = 0;
    colors
        .into_iter()
        .map(|c| {
            let c = c.unwrap_or(0);
            *relabel[c].get_or_insert_with(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}
