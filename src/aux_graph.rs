//! The auxiliary graph: the mutable per-node pricing domain.
//!
//! Built once per branch-and-price node from the immutable [`Graph`], then
//! mutated in place by branching decisions and deep-copied when a node
//! spawns children (§4.1, §4.7).

use std::collections::{HashMap, HashSet};

use rustc_hash::FxHashMap;

use crate::graph::{ClusterId, Edge, Graph, VertexId};

/// A vertex in the auxiliary graph: either an original vertex (copied
/// verbatim from the input graph) or a synthetic vertex standing in for two
/// jointly-colored vertices merged by `same_color` (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuxVertex {
    pub id: VertexId,
    pub cluster: ClusterId,
}

/// Mutable per-node structure over which the pricing MWIS is solved.
#[derive(Debug, Clone)]
pub struct AuxiliaryGraph {
    vertices: FxHashMap<VertexId, AuxVertex>,
    edges: HashSet<Edge>,
    /// synthetic vertex id -> its original constituents (never nested, §3).
    merged: FxHashMap<VertexId, Vec<VertexId>>,
    weight: FxHashMap<VertexId, f64>,
    next_synthetic_id: VertexId,
}

impl AuxiliaryGraph {
    /// Builds the auxiliary graph for the root node: the input graph's
    /// edges plus a complete intra-cluster edge set (so that the MWIS
    /// pricing problem can never pick two representatives of one cluster).
    pub fn from_graph(graph: &Graph) -> Self {
        let mut vertices = FxHashMap::default();
        for v in graph.vertices() {
            vertices.insert(
                v.id,
                AuxVertex {
                    id: v.id,
                    cluster: v.cluster,
                },
            );
        }

        let mut edges: HashSet<Edge> = graph.edges().iter().copied().collect();
        for cluster in graph.clusters() {
            for (i, &u) in cluster.members.iter().enumerate() {
                for &v in &cluster.members[i + 1..] {
                    edges.insert(Edge::new(u, v));
                }
            }
        }

        AuxiliaryGraph {
            vertices,
            edges,
            merged: FxHashMap::default(),
            weight: FxHashMap::default(),
            next_synthetic_id: graph.num_vertices(),
        }
    }

    pub fn vertices(&self) -> impl Iterator<Item = &AuxVertex> {
        self.vertices.values()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.vertices.contains_key(&v)
    }

    pub fn vertex(&self, v: VertexId) -> Option<&AuxVertex> {
        self.vertices.get(&v)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn has_edge(&self, u: VertexId, v: VertexId) -> bool {
        self.edges.contains(&Edge::new(u, v))
    }

    pub fn weight(&self, v: VertexId) -> f64 {
        self.weight.get(&v).copied().unwrap_or(0.0)
    }

    pub fn is_synthetic(&self, v: VertexId) -> bool {
        self.merged.contains_key(&v)
    }

    /// Constituents of a synthetic vertex, or `[v]` itself if `v` is an
    /// original vertex currently present in the graph.
    pub fn constituents(&self, v: VertexId) -> Vec<VertexId> {
        match self.merged.get(&v) {
            Some(cs) => cs.clone(),
            None => vec![v],
        }
    }

    /// Expands every vertex in `vertices` into its original constituents,
    /// used when a pricing solution or column mentions synthetics.
    pub fn expand(&self, vertices: &[VertexId]) -> Vec<VertexId> {
        let mut out = Vec::with_capacity(vertices.len());
        for &v in vertices {
            out.extend(self.constituents(v));
        }
        out
    }

    fn cluster_of_original(&self, graph: &Graph, v: VertexId) -> ClusterId {
        graph.cluster_of(v)
    }

    /// For each original vertex in cluster `q` set `w[v] = duals[q]`; for
    /// each synthetic, set its weight to the sum of its constituents'
    /// weights (§4.1). Called once per pricing invocation.
    pub fn update_weights(&mut self, graph: &Graph, duals: &[f64]) {
        self.weight.clear();
        for vertex in self.vertices.values() {
            if self.merged.contains_key(&vertex.id) {
                continue;
            }
            let cluster = self.cluster_of_original(graph, vertex.id);
            self.weight.insert(vertex.id, duals[cluster]);
        }
        // collect ids first: constituents borrow would otherwise alias `self.weight`
        let synthetic_ids: Vec<VertexId> = self.merged.keys().copied().collect();
        for z in synthetic_ids {
            let sum: f64 = self
                .constituents(z)
                .iter()
                .map(|c| {
                    let cluster = self.cluster_of_original(graph, *c);
                    duals[cluster]
                })
                .sum();
            self.weight.insert(z, sum);
        }
    }

    /// Removes `v` from the vertex index, weight map, and every incident
    /// edge. Removing an absent vertex is a no-op. If `v` is synthetic, its
    /// constituents are removed as well (their original ids never survive
    /// a merge under any other name).
    pub fn remove_vertex(&mut self, v: VertexId) {
        if !self.vertices.contains_key(&v) {
            return;
        }
        let constituents = self.merged.remove(&v);
        self.vertices.remove(&v);
        self.weight.remove(&v);
        self.edges.retain(|e| e.u != v && e.v != v);
        if let Some(constituents) = constituents {
            for c in constituents {
                self.vertices.remove(&c);
                self.weight.remove(&c);
                self.edges.retain(|e| e.u != c && e.v != c);
            }
        }
    }

    /// Removes every other vertex sharing `v`'s cluster: cluster-mates of
    /// `v` if `v` is original, or cluster-mates of any constituent of `v`
    /// not already represented by `v`, if `v` is synthetic.
    pub fn remove_other_vertices_in_cluster(&mut self, graph: &Graph, v: VertexId) {
        let Some(vertex) = self.vertices.get(&v).copied() else {
            return;
        };
        let constituents: HashSet<VertexId> = self.constituents(v).into_iter().collect();
        let cluster = if self.is_synthetic(v) {
            // all constituents share no single cluster in general; remove
            // cluster-mates of every constituent not part of v itself.
            let clusters: HashSet<ClusterId> = constituents
                .iter()
                .map(|&c| self.cluster_of_original(graph, c))
                .collect();
            let to_remove: Vec<VertexId> = graph
                .vertices()
                .iter()
                .filter(|gv| clusters.contains(&gv.cluster) && !constituents.contains(&gv.id))
                .map(|gv| gv.id)
                .collect();
            for u in to_remove {
                self.remove_vertex(u);
            }
            return;
        } else {
            vertex.cluster
        };
        let to_remove: Vec<VertexId> = graph
            .cluster(cluster)
            .members
            .iter()
            .copied()
            .filter(|&u| u != v)
            .collect();
        for u in to_remove {
            self.remove_vertex(u);
        }
    }

    /// Merges `u` and `w` into a fresh synthetic vertex: every edge
    /// incident on either endpoint is redirected to the synthetic, `u` and
    /// `w` are removed, and `merged[z]` records the union of their
    /// constituents (never nested, §3).
    pub fn same_color(&mut self, u: VertexId, w: VertexId) -> VertexId {
        let z = self.next_synthetic_id;
        self.next_synthetic_id += 1;

        let mut constituents = self.constituents(u);
        constituents.extend(self.constituents(w));

        let mut redirected: HashSet<Edge> = HashSet::new();
        for e in &self.edges {
            let touches_u = e.u == u || e.v == u;
            let touches_w = e.u == w || e.v == w;
            if !touches_u && !touches_w {
                continue;
            }
            let other = if touches_u {
                if e.u == u {
                    e.v
                } else {
                    e.u
                }
            } else if e.u == w {
                e.v
            } else {
                e.u
            };
            if other == u || other == w {
                continue; // u-w edge itself, dropped: z has no self-loop
            }
            redirected.insert(Edge::new(other, z));
        }

        self.remove_vertex(u);
        self.remove_vertex(w);

        self.edges.extend(redirected);
        self.vertices.insert(
            z,
            AuxVertex {
                id: z,
                // synthetic vertices have no single cluster; any constituent
                // works as a representative for cluster-independent bookkeeping.
                cluster: ClusterId::MAX,
            },
        );
        self.merged.insert(z, constituents);
        z
    }

    /// Adds edge `(u, w)` if not already present; a no-op otherwise.
    /// Commutative: `different_color(u, w)` and `different_color(w, u)`
    /// mutate the graph identically.
    pub fn different_color(&mut self, u: VertexId, w: VertexId) {
        self.edges.insert(Edge::new(u, w));
    }

    /// Maps every constituent vertex (expanding synthetics) to the cluster
    /// ids it represents, used by the master problem to build a column's
    /// constraint coefficients.
    pub fn clusters_covered(&self, graph: &Graph, v: VertexId) -> Vec<ClusterId> {
        self.constituents(v)
            .iter()
            .map(|&c| self.cluster_of_original(graph, c))
            .collect()
    }

    /// Checks the invariants claimed in §3 (no self-loops, no duplicate
    /// edges). Returns the first violation found rather than panicking, so
    /// callers can surface it as a `SolveError::Invariant` instead of
    /// aborting the process.
    #[cfg(debug_assertions)]
    pub fn debug_check_invariants(&self) -> Result<(), String> {
        for e in &self.edges {
            if e.u == e.v {
                return Err(format!("self-loop in auxiliary graph at vertex {}", e.u));
            }
        }
        let mut seen = HashMap::new();
        for e in &self.edges {
            let key = (e.u, e.v);
            if seen.insert(key, ()).is_some() {
                return Err(format!("duplicate edge {e} in auxiliary graph"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn trivial_graph() -> Graph {
        // clusters {0,1}, {2,3}, {4,5}; edges (0,2) (1,3) (2,4) (0,4)
        Graph::new(
            6,
            vec![0, 0, 1, 1, 2, 2],
            vec![Edge::new(0, 2), Edge::new(1, 3), Edge::new(2, 4), Edge::new(0, 4)],
        )
        .unwrap()
    }

    #[test]
    fn intra_cluster_edges_are_added() {
        let g = trivial_graph();
        let aux = AuxiliaryGraph::from_graph(&g);
        assert!(aux.has_edge(0, 1));
        assert!(aux.has_edge(2, 3));
        assert!(aux.has_edge(4, 5));
        assert!(aux.has_edge(0, 2));
    }

    #[test]
    fn no_self_loops_or_duplicates() {
        let g = trivial_graph();
        let aux = AuxiliaryGraph::from_graph(&g);
        for e in aux.edges() {
            assert_ne!(e.u, e.v);
        }
        let count = aux.edges().count();
        let unique: HashSet<_> = aux.edges().copied().collect();
        assert_eq!(count, unique.len());
    }

    #[test]
    fn remove_vertex_is_idempotent() {
        let g = trivial_graph();
        let mut aux = AuxiliaryGraph::from_graph(&g);
        aux.remove_vertex(0);
        let snapshot = format!("{:?}", aux);
        aux.remove_vertex(0);
        assert_eq!(snapshot, format!("{:?}", aux));
        assert!(!aux.contains_vertex(0));
        assert!(aux.edges().all(|e| e.u != 0 && e.v != 0));
    }

    #[test]
    fn different_color_is_commutative() {
        let g = trivial_graph();
        let mut a = AuxiliaryGraph::from_graph(&g);
        let mut b = AuxiliaryGraph::from_graph(&g);
        a.different_color(1, 4);
        b.different_color(4, 1);
        assert_eq!(a.has_edge(1, 4), b.has_edge(1, 4));
        assert!(a.has_edge(1, 4));
    }

    #[test]
    fn same_color_merges_constituents_and_weight_sums() {
        let g = trivial_graph();
        let mut aux = AuxiliaryGraph::from_graph(&g);
        let z = aux.same_color(1, 4);
        assert!(!aux.contains_vertex(1));
        assert!(!aux.contains_vertex(4));
        assert!(aux.contains_vertex(z));
        let mut cs = aux.constituents(z);
        cs.sort();
        assert_eq!(cs, vec![1, 4]);

        aux.update_weights(&g, &[1.0, 2.0, 3.0]);
        // vertex 1 is in cluster 0 (dual 1.0), vertex 4 is in cluster 2 (dual 3.0)
        assert_eq!(aux.weight(z), 4.0);
    }

    #[test]
    fn copy_isolation() {
        let g = trivial_graph();
        let parent = AuxiliaryGraph::from_graph(&g);
        let mut child = parent.clone();
        child.remove_vertex(0);
        assert!(parent.contains_vertex(0));
        assert!(!child.contains_vertex(0));
    }
}
