//! 0/1 knapsack as a binary program.

use std::cmp::Ordering;

use solver_core::{ConstraintSense, LinearModel, ObjectiveSense};

use crate::error::{MipError, MipResult};
use crate::extract::KnapsackSolution;

/// One knapsack item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    /// Value gained when taken.
    pub value: u64,
    /// Capacity consumed when taken.
    pub weight: u64,
}

/// A 0/1 knapsack instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnapsackInstance {
    /// Total weight allowed.
    pub capacity: u64,
    /// Items in input order.
    pub items: Vec<Item>,
}

impl KnapsackInstance {
    /// Build an instance from `(value, weight)` pairs.
    pub fn new<I>(capacity: u64, items: I) -> Self
    where
        I: IntoIterator<Item = (u64, u64)>,
    {
        Self {
            capacity,
            items: items
                .into_iter()
                .map(|(value, weight)| Item { value, weight })
                .collect(),
        }
    }

    /// Total value and weight of a take vector.
    pub fn totals(&self, take: &[bool]) -> (u64, u64) {
        self.items
            .iter()
            .zip(take)
            .filter(|(_, &t)| t)
            .fold((0, 0), |(v, w), (item, _)| (v + item.value, w + item.weight))
    }
}

/// A knapsack model plus its `take` variables.
#[derive(Debug, Clone)]
pub struct KnapsackEncoding {
    /// The binary program.
    pub model: LinearModel,

    /// `take[i]`: item `i` is packed.
    pub take: Vec<usize>,

    /// The encoded instance.
    pub instance: KnapsackInstance,
}

impl KnapsackEncoding {
    /// Model assignment for a take vector.
    pub fn assignment(&self, take: &[bool]) -> Vec<f64> {
        let mut values = vec![0.0; self.model.num_vars()];
        for (&var, &t) in self.take.iter().zip(take) {
            values[var] = if t { 1.0 } else { 0.0 };
        }
        values
    }
}

/// maximize Σ value[i]·take[i]  s.t.  Σ weight[i]·take[i] <= capacity.
pub fn encode_knapsack(instance: &KnapsackInstance) -> MipResult<KnapsackEncoding> {
    let mut model = LinearModel::new();
    let take: Vec<usize> = instance.items.iter().map(|_| model.add_binary()).collect();

    model.add_named_constraint(
        "capacity",
        take.iter()
            .zip(&instance.items)
            .map(|(&t, item)| (t, item.weight as f64))
            .collect(),
        ConstraintSense::Le,
        instance.capacity as f64,
    )?;
    model.set_objective(
        take.iter()
            .zip(&instance.items)
            .map(|(&t, item)| (t, item.value as f64))
            .collect(),
        ObjectiveSense::Maximize,
    )?;

    Ok(KnapsackEncoding {
        model,
        take,
        instance: instance.clone(),
    })
}

/// Greedy packing by value density; zero-weight items always go in.
pub fn greedy_knapsack(instance: &KnapsackInstance) -> Vec<bool> {
    // Weightless items with value first, weighted items by density, then
    // items with neither; density has no meaning for the last group.
    let group = |item: Item| match (item.weight, item.value) {
        (0, 0) => 2,
        (0, _) => 0,
        _ => 1,
    };
    let mut order: Vec<usize> = (0..instance.items.len()).collect();
    order.sort_by(|&a, &b| {
        let (ia, ib) = (instance.items[a], instance.items[b]);
        group(ia).cmp(&group(ib)).then_with(|| {
            if group(ia) != 1 {
                return Ordering::Equal;
            }
            // a/b > c/d  <=>  a*d > c*b, compared exactly in u128
            let lhs = ia.value as u128 * ib.weight as u128;
            let rhs = ib.value as u128 * ia.weight as u128;
            rhs.cmp(&lhs)
        })
        .then(a.cmp(&b))
    });

    let mut take = vec![false; instance.items.len()];
    let mut room = instance.capacity;
    for i in order {
        let item = instance.items[i];
        if item.weight <= room {
            room -= item.weight;
            take[i] = true;
        }
    }
    take
}

/// Exact dynamic program over used capacity.
///
/// Runs in `O(items × capacity)` time and memory, so it is meant for
/// small capacities; fails with `InvalidInstance` above `1 << 24`.
pub fn knapsack_dp(instance: &KnapsackInstance) -> MipResult<KnapsackSolution> {
    const MAX_DP_CAPACITY: u64 = 1 << 24;
    if instance.capacity > MAX_DP_CAPACITY {
        return Err(MipError::InvalidInstance(format!(
            "capacity {} is too large for the dynamic program",
            instance.capacity
        )));
    }

    let cap = instance.capacity as usize;
    let n = instance.items.len();
    // best[i][w]: best value from the first i items within weight w
    let mut best = vec![vec![0u64; cap + 1]; n + 1];
    for (i, item) in instance.items.iter().enumerate() {
        let wi = item.weight;
        for w in 0..=cap {
            let skip = best[i][w];
            best[i + 1][w] = if wi <= w as u64 {
                skip.max(best[i][w - wi as usize] + item.value)
            } else {
                skip
            };
        }
    }

    let mut take = vec![false; n];
    let mut w = cap;
    for i in (0..n).rev() {
        if best[i + 1][w] != best[i][w] {
            take[i] = true;
            w -= instance.items[i].weight as usize;
        }
    }

    let (value, weight) = instance.totals(&take);
    Ok(KnapsackSolution {
        take,
        value,
        weight,
        proven_optimal: true,
    })
}
