//! Top-level entry points.

use std::time::{Duration, Instant};

use solver_core::LinearModel;

use crate::encode::{
    encode_coloring, encode_knapsack, greedy_coloring, greedy_knapsack, ColoringInstance,
    ColoringOptions, KnapsackInstance, PaletteSize,
};
use crate::error::{MipError, MipResult};
use crate::extract::{extract_coloring, extract_knapsack, ColoringSolution, KnapsackSolution};
use crate::master::SimplexBackend;
use crate::model::{MipProblem, MipSolution, MipStatus};
use crate::search::BranchAndBound;
use crate::settings::MipSettings;

/// Solve a mixed-integer linear program with the simplex relaxation backend.
pub fn solve_mip(model: &LinearModel, settings: &MipSettings) -> MipResult<MipSolution> {
    solve_mip_with_start(model, None, settings)
}

/// Solve a MILP, optionally seeding the incumbent with a known assignment.
///
/// A start point that violates the model is logged and ignored.
pub fn solve_mip_with_start(
    model: &LinearModel,
    start: Option<&[f64]>,
    settings: &MipSettings,
) -> MipResult<MipSolution> {
    let prob = MipProblem::new(model.clone())?;
    let backend = SimplexBackend::new(settings.lp_settings.clone());
    let mut tree = BranchAndBound::new(&prob, &backend, settings.clone());
    if let Some(x) = start {
        tree.set_incumbent(x);
    }
    tree.solve()
}

/// Minimum coloring of a graph.
///
/// The time limit in `settings` covers every palette attempt together. If
/// the budget runs out before the model produces a coloring, the greedy
/// coloring is returned (flagged not proven optimal) when available.
pub fn solve_coloring(
    instance: &ColoringInstance,
    options: &ColoringOptions,
    settings: &MipSettings,
) -> MipResult<ColoringSolution> {
    if instance.node_count == 0 {
        return Ok(ColoringSolution::from_colors(Vec::new(), true));
    }

    let start = Instant::now();
    let deadline = settings
        .time_limit_ms
        .map(|ms| start + Duration::from_millis(ms));
    let greedy = options.greedy_warm_start.then(|| greedy_coloring(instance));
    let fallback = |greedy: Option<Vec<usize>>| {
        greedy
            .map(|colors| ColoringSolution::from_colors(colors, false))
            .ok_or(MipError::NoFeasibleSolution)
    };

    let (mut palette, max_palette) = options.palette.range(instance.node_count);
    loop {
        let encoding = encode_coloring(instance, palette, options.symmetry)?;
        let start_point = greedy
            .as_deref()
            .and_then(|colors| encoding.assignment(colors));

        let mut attempt = settings.clone();
        if let Some(deadline) = deadline {
            let left = deadline.saturating_duration_since(Instant::now());
            attempt.time_limit_ms = Some(left.as_millis() as u64);
        }
        if settings.verbose {
            log::info!(
                "Coloring {} nodes / {} edges with a palette of {} colors",
                instance.node_count,
                instance.edges.len(),
                palette
            );
        }

        let solution = solve_mip_with_start(&encoding.model, start_point.as_deref(), &attempt)?;

        match solution.status {
            MipStatus::Infeasible if palette < max_palette => {
                if deadline.is_some_and(|d| Instant::now() >= d) && greedy.is_some() {
                    return fallback(greedy);
                }
                log::warn!(
                    "No coloring with {} colors, growing the palette to {}",
                    palette,
                    palette + 1
                );
                palette += 1;
            }
            MipStatus::Infeasible => {
                if options.palette == PaletteSize::Fixed(palette) {
                    return Err(MipError::Infeasible);
                }
                return Err(MipError::InternalError(format!(
                    "no coloring with {palette} colors"
                )));
            }
            status if status.is_limit() && !solution.has_solution() => {
                return fallback(greedy);
            }
            _ => return extract_coloring(&encoding, &solution),
        }
    }
}

/// Maximum-value 0/1 knapsack packing.
pub fn solve_knapsack(
    instance: &KnapsackInstance,
    settings: &MipSettings,
) -> MipResult<KnapsackSolution> {
    let encoding = encode_knapsack(instance)?;
    let start_point = encoding.assignment(&greedy_knapsack(instance));
    let solution = solve_mip_with_start(&encoding.model, Some(&start_point), settings)?;
    extract_knapsack(&encoding, &solution)
}
