use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use super::Point;

/// A point augmented with the heuristic estimate used for queue ordering and
/// the cost of the edge from its predecessor.
///
/// Equality and hashing only look at the coordinate, so a node is "already
/// visited" no matter what its cost fields were when it was inserted.
#[derive(Debug, Clone, Copy)]
pub struct SearchNode {
    pub position: Point,
    pub estimate: f64,
    pub edge_cost: f64,
}

impl SearchNode {
    pub fn new(position: Point, edge_cost: f64) -> Self {
        SearchNode {
            position,
            estimate: 0.0,
            edge_cost,
        }
    }
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl Eq for SearchNode {}

impl Hash for SearchNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.position.hash(state);
    }
}

// Open list entry for the weighted searches.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OpenEntry {
    pub(crate) node: SearchNode,
    // Accumulated cost from the start. Predecessors never change once
    // assigned, so this equals the sum of edge costs along the chain.
    pub(crate) g_cost: f64,
    pub(crate) seq: usize,
}

impl OpenEntry {
    pub(crate) fn f_cost(&self) -> f64 {
        self.node.estimate + self.g_cost
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_cost()
            .total_cmp(&other.f_cost())
            // Equal keys pop in insertion order.
            .then_with(|| self.seq.cmp(&other.seq))
    }
}
