//! Small end-to-end runs of the coloring and knapsack solvers.
//!
//! Run with: cargo run --release -p solver-mip --example simple_bench

use solver_core::{solve, SolverSettings};
use solver_mip::{
    encode_knapsack, solve_coloring, solve_knapsack, solve_mip, ColoringInstance,
    ColoringOptions, KnapsackInstance, MipError, MipSettings, SymmetryBreaking,
};
use std::time::Instant;

fn main() -> Result<(), MipError> {
    println!("=== Simple MIP Solver Test ===\n");

    // Test 1: Small knapsack, LP relaxation then MIP
    test_small_knapsack()?;

    // Test 2: Coloring under each symmetry policy
    test_petersen_coloring()?;

    Ok(())
}

/// max 60x0 + 100x1 + 120x2
/// s.t. 10x0 + 20x1 + 30x2 <= 50
///      x binary
fn test_small_knapsack() -> Result<(), MipError> {
    println!("--- Test 1: Small Knapsack ---");
    let instance = KnapsackInstance::new(50, [(60, 10), (100, 20), (120, 30)]);
    let encoding = encode_knapsack(&instance)?;

    println!("Testing LP relaxation with solver-core...");
    let lp = solve(&encoding.model, &SolverSettings::default())?;
    println!("LP Status: {}", lp.status);
    println!("LP Obj: {:.6}", lp.obj_val);
    println!("LP x: {:?}", lp.x);

    println!("\nNow testing MIP solver...");
    let settings = MipSettings {
        max_nodes: 1000,
        ..MipSettings::verbose()
    };

    let start = Instant::now();
    let sol = solve_mip(&encoding.model, &settings)?;
    println!("Status: {:?}", sol.status);
    if sol.has_solution() {
        println!("Objective: {:.6}", sol.obj_val);
        println!("Solution: {:?}", sol.x);
        println!("Bound: {:.6}", sol.bound);
        println!("Gap: {:.4}%", sol.gap * 100.0);
    }
    println!(
        "Nodes: {} (pruned {}, infeasible {})",
        sol.nodes_explored, sol.nodes_pruned, sol.nodes_infeasible
    );
    println!("Time: {:.3}s\n", start.elapsed().as_secs_f64());

    println!("{}\n", solve_knapsack(&instance, &MipSettings::default())?);
    Ok(())
}

fn test_petersen_coloring() -> Result<(), MipError> {
    println!("--- Test 2: Petersen Graph Coloring ---");
    let mut edges = Vec::new();
    for i in 0..5 {
        edges.push((i, (i + 1) % 5));
        edges.push((5 + i, 5 + (i + 2) % 5));
        edges.push((i, 5 + i));
    }
    let instance = ColoringInstance::new(10, edges)?;

    for symmetry in [
        SymmetryBreaking::None,
        SymmetryBreaking::ColorOrdering,
        SymmetryBreaking::ColorOrderingAnchor,
    ] {
        let options = ColoringOptions {
            symmetry,
            ..ColoringOptions::default()
        };
        let start = Instant::now();
        let sol = solve_coloring(&instance, &options, &MipSettings::default().with_time_limit(10.0))?;
        println!("{symmetry:?} ({:.3}s):", start.elapsed().as_secs_f64());
        println!("{sol}\n");
    }
    Ok(())
}
