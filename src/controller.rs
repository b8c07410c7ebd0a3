//! The branch-and-price controller: priority tree search, bounding, and
//! best-integer tracking (§4.7, `BranchAndPrice` in the source).

use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::aux_graph::AuxiliaryGraph;
use crate::branching;
use crate::cg;
use crate::column::Column;
use crate::error::{SolveError, SolveResult};
use crate::graph::Graph;
use crate::node::{BpNode, NodeId, NodeKey};
use crate::pool::ColumnPool;
use crate::solver::master::HighsMaster;
use crate::solver::pricing::CbcPricing;

const EPSILON: f64 = 1e-6;

/// Terminal status of a solve (§6, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    NoSolution,
}

/// One color class in the reported solution: the independent set of
/// representatives sharing a color, and the LP weight the master assigned
/// it (1.0 for an integral accepted solution).
#[derive(Debug, Clone)]
pub struct SolutionColumn {
    pub vertices: Vec<usize>,
    pub value: f64,
}

/// Everything the CLI needs to report a solve (§7's "structured result
/// object").
#[derive(Debug, Clone)]
pub struct SolverOutput {
    pub status: SolveStatus,
    pub objective: f64,
    pub lower_bound: f64,
    pub solution: Vec<SolutionColumn>,
    pub stats: Stats,
}

#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub nodes_processed: u64,
    pub nodes_created: u64,
    pub nodes_pruned: u64,
    pub cg_iterations: u64,
    pub total_solve_time: Duration,
}

impl Stats {
    pub fn gap(&self, best_integer: f64, lower_bound: f64) -> f64 {
        if best_integer.is_infinite() {
            return f64::INFINITY;
        }
        (best_integer - lower_bound) / best_integer.abs().max(1e-6)
    }
}

pub struct BranchAndPrice {
    graph: Arc<Graph>,
    time_limit: Duration,
    queue: BinaryHeap<std::cmp::Reverse<(NodeKey, NodeId)>>,
    nodes: HashMap<NodeId, BpNode>,
    best_integer_objective: f64,
    best_solution: Option<Vec<SolutionColumn>>,
    global_lower_bound: f64,
    stats: Stats,
}

impl BranchAndPrice {
    pub fn new(graph: Arc<Graph>, time_limit: Duration) -> Self {
        BranchAndPrice {
            graph,
            time_limit,
            queue: BinaryHeap::new(),
            nodes: HashMap::new(),
            best_integer_objective: f64::INFINITY,
            best_solution: None,
            global_lower_bound: f64::NEG_INFINITY,
            stats: Stats::default(),
        }
    }

    /// Builds the root node: the auxiliary graph for the full input graph,
    /// seeded with one artificial column per cluster (§4.7).
    fn root_node(&self) -> BpNode {
        let aux = AuxiliaryGraph::from_graph(&self.graph);
        let mut pool = ColumnPool::new();
        for cluster in self.graph.clusters() {
            let representative = cluster.members[0];
            pool.add(Column::new(vec![representative], true, "artificial_initialization"));
        }
        BpNode::root(aux, pool)
    }

    fn push(&mut self, node: BpNode) {
        self.stats.nodes_created += 1;
        self.queue.push(std::cmp::Reverse((NodeKey(node.objective), node.id)));
        self.nodes.insert(node.id, node);
    }

    pub fn solve(mut self) -> SolveResult<SolverOutput> {
        let start = Instant::now();
        let deadline = start + self.time_limit;

        self.push(self.root_node());

        while let Some(std::cmp::Reverse((_, node_id))) = self.queue.pop() {
            if Instant::now() >= deadline {
                log::warn!("controller: deadline reached with {} node(s) still queued", self.queue.len() + 1);
                // Not popped for real work; put it back so the lower-bound
                // scan below still sees it.
                let node = self.nodes.get(&node_id).expect("queued node must exist");
                self.queue.push(std::cmp::Reverse((NodeKey(node.objective), node_id)));
                break;
            }

            let mut node = self.nodes.remove(&node_id).expect("queued node must exist");
            self.stats.nodes_processed += 1;
            log::debug!(
                "controller: popped node {:?}, bound {:.6}, incumbent {:.6}",
                node.id,
                node.objective,
                self.best_integer_objective
            );

            if self.is_prunable(node.objective) {
                log::debug!("controller: node {:?} pruned by bound before solving", node.id);
                self.stats.nodes_pruned += 1;
                continue;
            }

            let mut master = HighsMaster::new();
            let mut pricing = CbcPricing::new();
            let cg_result = match cg::run(
                &self.graph,
                &mut node.aux_graph,
                &mut node.pool,
                &mut master,
                &mut pricing,
                self.best_integer_objective,
                0.0,
                deadline,
            ) {
                Ok(result) => result,
                Err(SolveError::Solver(err)) => {
                    // A pathological branch can make the LP infeasible; that
                    // prunes the subtree rather than failing the whole solve
                    // (§7), except at the root, where it is fatal.
                    if node.parent.is_none() {
                        log::warn!("controller: root node's master failed: {err}");
                        return Err(SolveError::Solver(
                            crate::error::SolverError::MasterInfeasible,
                        ));
                    }
                    log::warn!("controller: node {:?} pruned after master/pricing error: {err}", node.id);
                    self.stats.nodes_pruned += 1;
                    continue;
                }
                Err(other) => return Err(other),
            };
            self.stats.cg_iterations += cg_result.iterations as u64;

            if cg_result.timed_out_without_progress {
                log::warn!("controller: node {:?} rescheduled after pricing timed out without progress", node.id);
                node.objective = self.global_lower_bound.max(node.objective);
                self.push(node);
                break;
            }

            node.objective = cg_result.objective;
            node.solution = cg_result.primal;

            if self.is_prunable(node.objective) {
                log::debug!("controller: node {:?} pruned by bound after column generation", node.id);
                self.stats.nodes_pruned += 1;
                continue;
            }

            if has_active_artificial(&node) {
                log::debug!("controller: node {:?} pruned, still has an active artificial column", node.id);
                self.stats.nodes_pruned += 1;
                continue;
            }

            if is_integral(&node) {
                log::info!("controller: node {:?} integral at objective {:.6}", node.id, node.objective);
                self.accept_incumbent(&node);
                continue;
            }

            match branching::branch(&self.graph, &node.aux_graph, &node.pool, &node.solution) {
                Some((left, right)) => {
                    log::debug!("controller: node {:?} branched into two children", node.id);
                    self.spawn_children(&node, left, right)
                }
                None => {
                    // No rule fired on a fractional solution: treat as an
                    // accepted (conservative) incumbent rather than looping.
                    log::warn!(
                        "controller: node {:?} fractional but no branching rule fired, accepting as incumbent",
                        node.id
                    );
                    self.accept_incumbent(&node);
                }
            }
        }

        self.stats.total_solve_time = start.elapsed();
        let optimal = self.queue.is_empty();
        if optimal {
            self.global_lower_bound = self.best_integer_objective;
        } else {
            self.global_lower_bound = self
                .nodes
                .values()
                .map(|n| n.objective)
                .fold(f64::INFINITY, f64::min);
        }

        let status = match (&self.best_solution, optimal) {
            (Some(_), true) => SolveStatus::Optimal,
            (Some(_), false) => SolveStatus::Feasible,
            (None, _) => SolveStatus::NoSolution,
        };

        Ok(SolverOutput {
            status,
            objective: self.best_integer_objective,
            lower_bound: self.global_lower_bound,
            solution: self.best_solution.unwrap_or_default(),
            stats: self.stats,
        })
    }

    fn is_prunable(&self, objective: f64) -> bool {
        (objective - EPSILON).ceil() >= self.best_integer_objective
    }

    fn spawn_children(
        &mut self,
        parent: &BpNode,
        left: branching::BranchDecision,
        right: branching::BranchDecision,
    ) {
        for decision in [left, right] {
            let mut aux = parent.aux_graph.clone();
            let mut pool = parent.pool.clone();
            decision.apply_to_graph(&self.graph, &mut aux);
            decision.filter_pool(&self.graph, &mut pool);
            let child = BpNode::child(parent, aux, pool);
            self.push(child);
        }
    }

    /// Updates the incumbent if `node`'s integral objective improves on it,
    /// then prunes every queued node whose bound no longer beats it (§4.7).
    fn accept_incumbent(&mut self, node: &BpNode) {
        if node.objective >= self.best_integer_objective {
            return;
        }
        log::info!(
            "controller: new incumbent {:.6} at node {:?} (was {:.6})",
            node.objective,
            node.id,
            self.best_integer_objective
        );
        self.best_integer_objective = node.objective;
        self.best_solution = Some(
            node.pool
                .iter()
                .filter_map(|c| {
                    node.solution.get(&c.id()).map(|&value| SolutionColumn {
                        vertices: c.vertices.clone(),
                        value,
                    })
                })
                .filter(|c| c.value > EPSILON)
                .collect(),
        );

        let threshold = self.best_integer_objective;
        let kept: Vec<_> = self
            .queue
            .drain()
            .filter(|std::cmp::Reverse((key, _))| key.0 < threshold)
            .collect();
        let pruned = self.queue_capacity_drop(kept);
        self.stats.nodes_pruned += pruned as u64;
    }

    /// Replaces `self.queue` with `kept`, dropping (and releasing) every
    /// node whose id isn't in it, and returns how many were dropped.
    fn queue_capacity_drop(
        &mut self,
        kept: Vec<std::cmp::Reverse<(NodeKey, NodeId)>>,
    ) -> usize {
        let kept_ids: std::collections::HashSet<NodeId> =
            kept.iter().map(|std::cmp::Reverse((_, id))| *id).collect();
        let dropped = self.nodes.len().saturating_sub(kept_ids.len());
        self.nodes.retain(|id, _| kept_ids.contains(id));
        self.queue = kept.into_iter().collect();
        dropped
    }
}

fn has_active_artificial(node: &BpNode) -> bool {
    node.pool
        .iter()
        .any(|c| c.is_artificial && node.solution.get(&c.id()).copied().unwrap_or(0.0) > EPSILON)
}

fn is_integral(node: &BpNode) -> bool {
    if node.solution.is_empty() {
        return false;
    }
    node.solution
        .values()
        .all(|&v| (v - v.round()).abs() < 1e-6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;

    fn trivial_graph() -> Arc<Graph> {
        Arc::new(
            Graph::new(
                6,
                vec![0, 0, 1, 1, 2, 2],
                vec![Edge::new(0, 2), Edge::new(1, 3), Edge::new(2, 4), Edge::new(0, 4)],
            )
            .unwrap(),
        )
    }

    #[test]
    fn root_node_seeds_one_artificial_column_per_cluster() {
        let graph = trivial_graph();
        let bp = BranchAndPrice::new(graph, Duration::from_secs(1));
        let root = bp.root_node();
        assert_eq!(root.pool.len(), 3);
        assert!(root.pool.iter().all(|c| c.is_artificial));
        assert_eq!(root.objective, f64::NEG_INFINITY);
    }

    #[test]
    fn accept_incumbent_is_monotone() {
        let graph = trivial_graph();
        let mut bp = BranchAndPrice::new(graph, Duration::from_secs(1));
        let mut node = bp.root_node();
        node.objective = 3.0;
        node.solution = HashMap::from([(node.pool.iter().next().unwrap().id(), 1.0)]);
        bp.accept_incumbent(&node);
        assert_eq!(bp.best_integer_objective, 3.0);

        let mut worse = bp.root_node();
        worse.objective = 4.0;
        bp.accept_incumbent(&worse);
        assert_eq!(bp.best_integer_objective, 3.0, "incumbent must not regress");
    }
}
