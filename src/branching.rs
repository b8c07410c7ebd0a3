//! Branching rules and decisions (§4.6).
//!
//! The controller invokes [`branch`] only on nodes whose LP solution is
//! fractional and free of artificial columns. It tries Rule A first, then
//! Rule B; each produces a pair of [`BranchDecision`]s, one per child. A
//! decision knows how to mutate a (already-copied) auxiliary graph and how
//! to filter a (already-copied) column pool; it never touches a parent's
//! fields directly, which is what keeps copy-isolation (§8) trivially true.

use std::collections::{HashMap, HashSet};

use crate::aux_graph::AuxiliaryGraph;
use crate::column::ColumnId;
use crate::graph::{ClusterId, Graph, VertexId};
use crate::pool::ColumnPool;

/// One half of a branching split.
#[derive(Debug, Clone)]
pub enum BranchDecision {
    /// Rule A, left child: keep `vertex`, drop every other vertex of its
    /// cluster from the auxiliary graph and from the pool.
    ImposeVertex { vertex: VertexId },
    /// Rule A, right child: remove `vertex` outright.
    ForbidVertex { vertex: VertexId },
    /// Rule B, left child: merge `u` and `w` into one synthetic vertex.
    SameColor { u: VertexId, w: VertexId },
    /// Rule B, right child: forbid `u` and `w` from sharing a color.
    DifferentColor { u: VertexId, w: VertexId },
}

impl BranchDecision {
    /// Mutates a node's (already-copied) auxiliary graph to reflect this
    /// decision.
    pub fn apply_to_graph(&self, graph: &Graph, aux: &mut AuxiliaryGraph) {
        match *self {
            BranchDecision::ImposeVertex { vertex } => {
                aux.remove_other_vertices_in_cluster(graph, vertex);
            }
            BranchDecision::ForbidVertex { vertex } => {
                aux.remove_vertex(vertex);
            }
            BranchDecision::SameColor { u, w } => {
                aux.same_color(u, w);
            }
            BranchDecision::DifferentColor { u, w } => {
                aux.different_color(u, w);
            }
        }
    }

    /// Filters a node's (already-copied) column pool to drop every
    /// non-artificial column that violates this decision. Artificial
    /// columns always survive (§4.6, §8).
    pub fn filter_pool(&self, graph: &Graph, pool: &mut ColumnPool) {
        match *self {
            BranchDecision::ImposeVertex { vertex } => {
                let cluster = graph.cluster_of(vertex);
                let cluster_mates: HashSet<VertexId> = graph
                    .cluster(cluster)
                    .members
                    .iter()
                    .copied()
                    .filter(|&v| v != vertex)
                    .collect();
                pool.retain_filtered(|c| !c.vertices.iter().any(|v| cluster_mates.contains(v)));
            }
            BranchDecision::ForbidVertex { vertex } => {
                pool.retain_filtered(|c| !c.vertices.contains(&vertex));
            }
            BranchDecision::SameColor { u, w } => {
                pool.retain_filtered(|c| {
                    let has_u = c.vertices.contains(&u);
                    let has_w = c.vertices.contains(&w);
                    has_u == has_w
                });
            }
            BranchDecision::DifferentColor { u, w } => {
                pool.retain_filtered(|c| {
                    !(c.vertices.contains(&u) && c.vertices.contains(&w))
                });
            }
        }
    }
}

/// Tries Rule A, then Rule B, against the node's fractional primal
/// solution. Returns `None` if neither rule finds anything to branch on
/// (which, for a genuinely fractional solution, should not happen).
pub fn branch(
    graph: &Graph,
    aux: &AuxiliaryGraph,
    pool: &ColumnPool,
    primal: &HashMap<ColumnId, f64>,
) -> Option<(BranchDecision, BranchDecision)> {
    rule_a(graph, pool, primal).or_else(|| rule_b(graph, aux, pool, primal))
}

/// Rule A — representative branching. For each cluster, the set of
/// vertices appearing in some positive-value column; pick the cluster with
/// the largest such set, then (among that cluster's candidates) the vertex
/// with the largest accumulated column value.
///
/// The source's ranking loop contains a `return True` reached right after
/// the first candidate whose value exceeds the running max, so it in
/// practice picks the *first* vertex encountered above zero rather than the
/// true maximizer (§9 open question). This implementation adopts the
/// max-value semantics the specification calls the defensible intent.
fn rule_a(
    graph: &Graph,
    pool: &ColumnPool,
    primal: &HashMap<ColumnId, f64>,
) -> Option<(BranchDecision, BranchDecision)> {
    let mut candidates_by_cluster: HashMap<ClusterId, HashSet<VertexId>> = HashMap::new();
    let mut value_by_vertex: HashMap<VertexId, f64> = HashMap::new();

    for column in pool.iter() {
        let Some(&value) = primal.get(&column.id()) else {
            continue;
        };
        if value <= 0.0 {
            continue;
        }
        for &v in &column.vertices {
            candidates_by_cluster
                .entry(graph.cluster_of(v))
                .or_default()
                .insert(v);
            *value_by_vertex.entry(v).or_insert(0.0) += value;
        }
    }

    let (&cluster, candidates) = candidates_by_cluster
        .iter()
        .max_by_key(|(_, vs)| vs.len())?;
    if candidates.len() <= 1 {
        return None;
    }

    let chosen = *candidates
        .iter()
        .max_by(|&&a, &&b| {
            value_by_vertex[&a]
                .partial_cmp(&value_by_vertex[&b])
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .expect("candidates is non-empty");

    log::debug!(
        "branching: rule A fired, cluster {cluster} splits {} ways, chose vertex {chosen}",
        candidates.len()
    );
    Some((
        BranchDecision::ImposeVertex { vertex: chosen },
        BranchDecision::ForbidVertex { vertex: chosen },
    ))
}

/// Rule B — same/different-color branching. Considers every ordered pair
/// of distinct-cluster vertices currently represented in the auxiliary
/// graph (expanding any synthetic into its constituents, since columns
/// always name original vertices, never synthetics), picks the pair with
/// the largest fractional joint column weight.
fn rule_b(
    graph: &Graph,
    aux: &AuxiliaryGraph,
    pool: &ColumnPool,
    primal: &HashMap<ColumnId, f64>,
) -> Option<(BranchDecision, BranchDecision)> {
    let present: Vec<VertexId> = {
        let mut v: Vec<VertexId> = aux.vertices().flat_map(|av| aux.constituents(av.id)).collect();
        v.sort_unstable();
        v.dedup();
        v
    };

    let mut best: Option<(VertexId, VertexId, f64)> = None;
    for (i, &u) in present.iter().enumerate() {
        for &w in &present[i + 1..] {
            if graph.cluster_of(u) == graph.cluster_of(w) {
                continue;
            }
            let gamma: f64 = pool
                .iter()
                .filter(|c| c.vertices.contains(&u) && c.vertices.contains(&w))
                .filter_map(|c| primal.get(&c.id()))
                .sum();
            if gamma <= 0.0 {
                continue;
            }
            if (gamma - gamma.round()).abs() < 1e-9 {
                continue; // integral, not a fractional candidate
            }
            if best.map_or(true, |(_, _, best_gamma)| gamma > best_gamma) {
                best = Some((u, w, gamma));
            }
        }
    }

    let (u, w, gamma) = best?;
    log::debug!("branching: rule B fired, vertices {u} and {w} co-occur at weight {gamma:.6}");
    Some((
        BranchDecision::SameColor { u, w },
        BranchDecision::DifferentColor { u, w },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aux_graph::AuxiliaryGraph;
    use crate::column::Column;
    use crate::graph::Edge;

    fn trivial_graph() -> Graph {
        Graph::new(
            6,
            vec![0, 0, 1, 1, 2, 2],
            vec![Edge::new(0, 2), Edge::new(1, 3), Edge::new(2, 4), Edge::new(0, 4)],
        )
        .unwrap()
    }

    #[test]
    fn rule_a_fires_when_a_cluster_splits_fractionally() {
        let graph = trivial_graph();
        let mut pool = ColumnPool::new();
        let c0 = Column::new(vec![0, 2, 5], false, "pricing");
        let c1 = Column::new(vec![1, 3, 4], false, "pricing");
        let (id0, id1) = (c0.id(), c1.id());
        pool.add(c0);
        pool.add(c1);
        let primal = HashMap::from([(id0, 0.5), (id1, 0.5)]);

        let decision = rule_a(&graph, &pool, &primal);
        assert!(decision.is_some());
        match decision.unwrap() {
            (BranchDecision::ImposeVertex { vertex: a }, BranchDecision::ForbidVertex { vertex: b }) => {
                assert_eq!(a, b);
                assert!(a == 0 || a == 1, "branch vertex should come from cluster 0");
            }
            other => panic!("expected rule A decision, got {other:?}"),
        }
    }

    #[test]
    fn rule_b_fires_on_fractional_cross_cluster_pair() {
        let graph = trivial_graph();
        let aux = AuxiliaryGraph::from_graph(&graph);
        let mut pool = ColumnPool::new();
        // vertex 1 (cluster 0) and vertex 5 (cluster 2) co-occur fractionally
        let c0 = Column::new(vec![1, 3, 5], false, "pricing");
        let c1 = Column::new(vec![0, 3, 5], false, "pricing");
        let id0 = c0.id();
        pool.add(c0);
        pool.add(c1.clone());
        let primal = HashMap::from([(id0, 0.5), (c1.id(), 0.5)]);

        let decision = rule_b(&graph, &aux, &pool, &primal);
        assert!(decision.is_some());
    }

    #[test]
    fn imposed_vertex_filters_other_cluster_members() {
        let graph = trivial_graph();
        let mut pool = ColumnPool::new();
        pool.add(Column::new(vec![0, 2], false, "pricing"));
        pool.add(Column::new(vec![1, 3], false, "pricing"));
        pool.add(Column::new(vec![0], true, "initial"));

        let decision = BranchDecision::ImposeVertex { vertex: 0 };
        decision.filter_pool(&graph, &mut pool);

        assert_eq!(pool.len(), 2, "column with vertex 1 must be dropped, artificial kept");
        assert!(pool.iter().any(|c| c.is_artificial));
        assert!(!pool.iter().any(|c| c.vertices.contains(&1)));
    }

    #[test]
    fn same_color_keeps_columns_with_both_or_neither() {
        let graph = trivial_graph();
        let mut pool = ColumnPool::new();
        pool.add(Column::new(vec![1, 5], false, "pricing")); // both: kept
        pool.add(Column::new(vec![1, 3], false, "pricing")); // only u: dropped
        pool.add(Column::new(vec![0, 4], false, "pricing")); // neither: kept

        let decision = BranchDecision::SameColor { u: 1, w: 5 };
        decision.filter_pool(&graph, &mut pool);

        assert_eq!(pool.len(), 2);
    }
}
