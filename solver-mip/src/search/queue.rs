//! Node priority queue for B&B tree exploration.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::SearchNode;
use crate::settings::NodeSelection;

/// Entry in the node queue. Greater entries are selected first.
struct QueuedNode {
    node: SearchNode,
    strategy: NodeSelection,
}

impl QueuedNode {
    /// Deeper first, then better bound, then older node.
    fn cmp_depth_first(&self, other: &Self) -> Ordering {
        self.node
            .depth
            .cmp(&other.node.depth)
            .then_with(|| other.node.dual_bound.total_cmp(&self.node.dual_bound))
            .then_with(|| other.node.id.cmp(&self.node.id))
    }

    /// Better bound first, then deeper, then older node.
    fn cmp_best_bound(&self, other: &Self) -> Ordering {
        other
            .node
            .dual_bound
            .total_cmp(&self.node.dual_bound)
            .then_with(|| self.node.depth.cmp(&other.node.depth))
            .then_with(|| other.node.id.cmp(&self.node.id))
    }
}

impl PartialEq for QueuedNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedNode {}

impl PartialOrd for QueuedNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedNode {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.strategy {
            NodeSelection::DepthFirst => self.cmp_depth_first(other),
            NodeSelection::BestBound => self.cmp_best_bound(other),
        }
    }
}

/// Priority queue for B&B nodes.
pub struct NodeQueue {
    /// Node selection strategy.
    strategy: NodeSelection,

    /// Priority queue (max-heap by selection order).
    heap: BinaryHeap<QueuedNode>,

    /// Count of nodes added.
    nodes_added: u64,

    /// Count of nodes popped.
    nodes_popped: u64,
}

impl NodeQueue {
    /// Create a new node queue with the given strategy.
    pub fn new(strategy: NodeSelection) -> Self {
        Self {
            strategy,
            heap: BinaryHeap::new(),
            nodes_added: 0,
            nodes_popped: 0,
        }
    }

    /// Add a node to the queue.
    pub fn push(&mut self, node: SearchNode) {
        self.heap.push(QueuedNode {
            node,
            strategy: self.strategy,
        });
        self.nodes_added += 1;
    }

    /// Get the next node to process.
    pub fn pop(&mut self) -> Option<SearchNode> {
        let queued = self.heap.pop()?;
        self.nodes_popped += 1;
        Some(queued.node)
    }

    /// Peek at the next node without removing it.
    pub fn peek(&self) -> Option<&SearchNode> {
        self.heap.peek().map(|q| &q.node)
    }

    /// Get the best (lowest) dual bound across all nodes (+inf if empty).
    pub fn best_bound(&self) -> f64 {
        self.heap
            .iter()
            .map(|q| q.node.dual_bound)
            .fold(f64::INFINITY, f64::min)
    }

    /// Prune nodes that are dominated by the incumbent.
    ///
    /// Returns the number of pruned nodes.
    pub fn prune_by_bound(&mut self, incumbent_obj: f64, tol: f64) -> usize {
        let before = self.heap.len();
        self.heap.retain(|q| !q.node.can_prune(incumbent_obj, tol));
        before - self.heap.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Get the number of nodes in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Get the total number of nodes added.
    pub fn total_added(&self) -> u64 {
        self.nodes_added
    }

    /// Get the total number of nodes popped.
    pub fn total_popped(&self) -> u64 {
        self.nodes_popped
    }
}
