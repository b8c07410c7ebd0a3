//! Branch-and-price tree nodes (§3, `BPCNode` in the source).
//!
//! A node owns its auxiliary graph and column pool outright; children are
//! built by deep-copying both and applying a branching decision's mutations
//! to the copy, never the parent (§4.7, §8 copy-isolation).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::aux_graph::AuxiliaryGraph;
use crate::column::ColumnId;
use crate::pool::ColumnPool;

pub type NodeId = u64;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

fn next_node_id() -> NodeId {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A node of the branch-and-price search tree.
#[derive(Debug)]
pub struct BpNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub aux_graph: AuxiliaryGraph,
    pub pool: ColumnPool,
    /// LP objective at this node: a lower bound on any integer solution in
    /// its subtree. `-inf` at the root until column generation first runs.
    pub objective: f64,
    pub solution: HashMap<ColumnId, f64>,
}

impl BpNode {
    pub fn root(aux_graph: AuxiliaryGraph, pool: ColumnPool) -> Self {
        BpNode {
            id: next_node_id(),
            parent: None,
            aux_graph,
            pool,
            objective: f64::NEG_INFINITY,
            solution: HashMap::new(),
        }
    }

    /// A child inherits the parent's objective provisionally as its own
    /// lower bound (§4.7 step 7); column generation overwrites it once run.
    pub fn child(parent: &BpNode, aux_graph: AuxiliaryGraph, pool: ColumnPool) -> Self {
        BpNode {
            id: next_node_id(),
            parent: Some(parent.id),
            aux_graph,
            pool,
            objective: parent.objective,
            solution: parent.solution.clone(),
        }
    }

    #[cfg(any(test, feature = "test-util"))]
    pub fn reset_id_counter_for_tests() {
        NEXT_NODE_ID.store(1, Ordering::Relaxed);
    }
}

/// Ordering key for the controller's best-first priority queue: nodes with
/// the smallest LP objective are processed first (§4.7). Ties are broken
/// arbitrarily by the heap, matching the source's Python `heapq` behavior,
/// which only compares `objective_value` (§5 — tests must not rely on tie
/// order).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeKey(pub f64);

impl Eq for NodeKey {}

impl PartialOrd for NodeKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // total_cmp never panics on NaN, unlike partial_cmp's Option; the LP
        // objective should never legitimately be NaN, but a BinaryHeap must
        // never be handed an Ordering it can't compute.
        self.0.total_cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_key_orders_by_objective_ascending() {
        let mut keys = vec![NodeKey(3.0), NodeKey(1.0), NodeKey(2.0)];
        keys.sort();
        assert_eq!(keys, vec![NodeKey(1.0), NodeKey(2.0), NodeKey(3.0)]);
    }
}
