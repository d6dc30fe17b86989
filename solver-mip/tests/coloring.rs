//! Integration tests for minimum graph coloring.

use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use solver_mip::{
    solve_coloring, ColoringInstance, ColoringOptions, ColoringSolution, MipError, MipSettings,
    NodeSelection, PaletteSize, SymmetryBreaking,
};

fn random_graph(seed: u64, nodes: usize, density: f64) -> ColoringInstance {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut edges = Vec::new();
    for u in 0..nodes {
        for v in (u + 1)..nodes {
            if rng.gen_bool(density) {
                edges.push((u, v));
            }
        }
    }
    ColoringInstance::new(nodes, edges).unwrap()
}

fn assert_valid(instance: &ColoringInstance, sol: &ColoringSolution) {
    assert_eq!(sol.colors.len(), instance.node_count, "one color per node");
    for &(u, v) in &instance.edges {
        assert_ne!(sol.colors[u], sol.colors[v], "edge ({u}, {v}) is monochromatic");
    }
    let distinct: BTreeSet<usize> = sol.colors.iter().copied().collect();
    assert_eq!(distinct.len(), sol.num_colors, "objective counts distinct colors");
}

#[test]
fn test_four_cycle_output() {
    let inst = ColoringInstance::new(4, [(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
    let sol = solve_coloring(&inst, &ColoringOptions::default(), &MipSettings::default()).unwrap();

    assert_valid(&inst, &sol);
    let text = sol.to_string();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("2 1"));
    assert_eq!(lines.next().map(|l| l.split(' ').count()), Some(4));
}

#[test]
fn test_odd_cycle_needs_three() {
    let inst = ColoringInstance::new(5, (0..5).map(|i| (i, (i + 1) % 5))).unwrap();
    let sol = solve_coloring(&inst, &ColoringOptions::default(), &MipSettings::default()).unwrap();
    assert_valid(&inst, &sol);
    assert_eq!(sol.num_colors, 3);
    assert!(sol.proven_optimal);
}

#[test]
fn test_petersen_graph() {
    // Outer 5-cycle, inner pentagram, spokes: chromatic number 3
    let mut edges = Vec::new();
    for i in 0..5 {
        edges.push((i, (i + 1) % 5));
        edges.push((5 + i, 5 + (i + 2) % 5));
        edges.push((i, 5 + i));
    }
    let inst = ColoringInstance::new(10, edges).unwrap();
    let sol = solve_coloring(&inst, &ColoringOptions::default(), &MipSettings::default()).unwrap();
    assert_valid(&inst, &sol);
    assert_eq!(sol.num_colors, 3);
    assert!(sol.proven_optimal);
}

#[test]
fn test_symmetry_policies_agree() {
    let policies = [
        SymmetryBreaking::None,
        SymmetryBreaking::ColorOrdering,
        SymmetryBreaking::ColorOrderingAnchor,
    ];
    for seed in 0..4 {
        let inst = random_graph(seed, 7, 0.45);
        let counts: Vec<usize> = policies
            .iter()
            .map(|&symmetry| {
                let options = ColoringOptions {
                    symmetry,
                    ..ColoringOptions::default()
                };
                let sol = solve_coloring(&inst, &options, &MipSettings::default()).unwrap();
                assert_valid(&inst, &sol);
                assert!(sol.proven_optimal);
                sol.num_colors
            })
            .collect();
        assert!(
            counts.windows(2).all(|w| w[0] == w[1]),
            "seed {seed}: policies disagree: {counts:?}"
        );
    }
}

#[test]
fn test_without_warm_start_and_best_bound() {
    let inst = random_graph(11, 8, 0.4);
    let options = ColoringOptions {
        greedy_warm_start: false,
        ..ColoringOptions::default()
    };
    let settings = MipSettings {
        node_selection: NodeSelection::BestBound,
        ..MipSettings::default()
    };
    let with_start =
        solve_coloring(&inst, &ColoringOptions::default(), &MipSettings::default()).unwrap();
    let without = solve_coloring(&inst, &options, &settings).unwrap();

    assert_valid(&inst, &without);
    assert_eq!(with_start.num_colors, without.num_colors);
}

#[test]
fn test_isolated_nodes_share_a_color() {
    let inst = ColoringInstance::new(5, [(0, 1)]).unwrap();
    let sol = solve_coloring(&inst, &ColoringOptions::default(), &MipSettings::default()).unwrap();
    assert_valid(&inst, &sol);
    assert_eq!(sol.num_colors, 2);
}

#[test]
fn test_node_limited_solve_is_valid() {
    // Dense enough that the first palette is too small to prove anything in 5 nodes
    let inst = random_graph(7, 12, 0.7);
    let settings = MipSettings::default().with_max_nodes(5);
    let sol = solve_coloring(&inst, &ColoringOptions::default(), &settings).unwrap();

    assert_valid(&inst, &sol);
    assert!(!sol.proven_optimal);
    assert!(sol.to_string().lines().next().unwrap().ends_with(" 0"));
}

#[test]
fn test_time_limited_solve_is_valid() {
    let inst = random_graph(3, 18, 0.5);
    let settings = MipSettings::default().with_time_limit(0.01);
    let sol = solve_coloring(&inst, &ColoringOptions::default(), &settings).unwrap();

    assert_valid(&inst, &sol);
    assert!(!sol.proven_optimal);
}

#[test]
fn test_time_limit_holds_on_larger_graph() {
    let inst = random_graph(40, 40, 0.5);
    let settings = MipSettings::default().with_time_limit(0.5);
    let start = Instant::now();
    let sol = solve_coloring(&inst, &ColoringOptions::default(), &settings).unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    assert_valid(&inst, &sol);
    assert!(!sol.proven_optimal);
    assert!(sol.to_string().lines().next().unwrap().ends_with(" 0"));
}

#[test]
fn test_interrupted_solve_falls_back_to_greedy() {
    let inst = random_graph(5, 12, 0.3);
    let flag = Arc::new(AtomicBool::new(true));
    let settings = MipSettings::default().with_interrupt(flag);
    let sol = solve_coloring(&inst, &ColoringOptions::default(), &settings).unwrap();

    assert_valid(&inst, &sol);
    assert!(!sol.proven_optimal);
}

#[test]
fn test_parallel_matches_sequential() {
    for seed in 20..23 {
        let inst = random_graph(seed, 8, 0.5);
        let seq =
            solve_coloring(&inst, &ColoringOptions::default(), &MipSettings::default()).unwrap();
        let par = solve_coloring(
            &inst,
            &ColoringOptions::default(),
            &MipSettings::default().with_threads(4),
        )
        .unwrap();

        assert_valid(&inst, &par);
        assert!(par.proven_optimal);
        assert_eq!(seq.num_colors, par.num_colors);
    }
}

#[test]
fn test_invalid_edges_rejected() {
    assert!(matches!(
        ColoringInstance::new(2, [(0, 2)]),
        Err(MipError::InvalidInstance(_))
    ));
    assert!(matches!(
        ColoringInstance::new(2, [(1, 1)]),
        Err(MipError::InvalidInstance(_))
    ));
}

#[test]
fn test_fixed_palette() {
    let inst = ColoringInstance::new(4, [(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
    let options = ColoringOptions {
        palette: PaletteSize::Fixed(3),
        ..ColoringOptions::default()
    };
    let sol = solve_coloring(&inst, &options, &MipSettings::default()).unwrap();
    assert_eq!(sol.num_colors, 2);
    assert!(sol.proven_optimal);
}
