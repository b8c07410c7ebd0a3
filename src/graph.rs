//! Immutable input graph, cluster (partition) structure, and instance parsing.
//!
//! This is the read-only collaborator shared by every branch-and-price node:
//! once built from an instance file it never changes, so it is wrapped in an
//! `Arc` and cloned cheaply by every `AuxiliaryGraph`.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::InputError;

pub type VertexId = usize;
pub type ClusterId = usize;

/// A single vertex: its identity and the cluster it belongs to.
///
/// Two vertices are equal iff their ids match; the cluster reference is
/// informational (and redundant with the `Graph`'s own membership table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vertex {
    pub id: VertexId,
    pub cluster: ClusterId,
}

/// An unordered pair of distinct vertices.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Edge {
    pub u: VertexId,
    pub v: VertexId,
}

impl Edge {
    pub fn new(u: VertexId, v: VertexId) -> Self {
        if u <= v {
            Edge { u, v }
        } else {
            Edge { u: v, v: u }
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.u == other.u && self.v == other.v
    }
}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.u.hash(state);
        self.v.hash(state);
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.u, self.v)
    }
}

/// A disjoint, non-empty, ordered set of member vertices.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub id: ClusterId,
    pub members: Vec<VertexId>,
}

/// The immutable input graph: vertex set, edge set, and cluster partition.
#[derive(Debug, Clone)]
pub struct Graph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    clusters: Vec<Cluster>,
}

impl Graph {
    /// Builds a graph from raw parts, validating the partition invariants:
    /// every vertex belongs to exactly one cluster, clusters are disjoint
    /// non-empty, and their union covers the full vertex set.
    pub fn new(
        num_vertices: usize,
        cluster_of: Vec<ClusterId>,
        mut edges: Vec<Edge>,
    ) -> Result<Self, InputError> {
        if cluster_of.len() != num_vertices {
            return Err(InputError::LineCountMismatch {
                expected: num_vertices,
                found: cluster_of.len(),
            });
        }

        let num_clusters = cluster_of.iter().copied().max().map_or(0, |m| m + 1);
        let mut members: Vec<Vec<VertexId>> = vec![Vec::new(); num_clusters];
        for (vertex, &cluster) in cluster_of.iter().enumerate() {
            if cluster >= num_clusters {
                return Err(InputError::ClusterOutOfRange {
                    vertex,
                    cluster,
                    num_clusters,
                });
            }
            members[cluster].push(vertex);
        }
        for (id, members) in members.iter().enumerate() {
            if members.is_empty() {
                return Err(InputError::EmptyCluster(id));
            }
        }

        let vertices: Vec<Vertex> = cluster_of
            .iter()
            .enumerate()
            .map(|(id, &cluster)| Vertex { id, cluster })
            .collect();

        for e in &edges {
            if e.u >= num_vertices || e.v >= num_vertices {
                return Err(InputError::EdgeVertexOutOfRange {
                    vertex: e.u.max(e.v),
                    num_vertices,
                });
            }
        }

        edges.retain(|e| e.u != e.v);
        let mut seen: HashSet<Edge> = HashSet::with_capacity(edges.len());
        edges.retain(|e| seen.insert(*e));

        let clusters = members
            .into_iter()
            .enumerate()
            .map(|(id, members)| Cluster { id, members })
            .collect();

        Ok(Graph {
            vertices,
            edges,
            clusters,
        })
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn cluster(&self, id: ClusterId) -> &Cluster {
        &self.clusters[id]
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id]
    }

    pub fn cluster_of(&self, vertex: VertexId) -> ClusterId {
        self.vertices[vertex].cluster
    }
}

/// Parses the DIMACS-style PCP format:
/// `|V| |E| |Q|` header, then `|V|` cluster-id lines, then `|E|` edge lines.
/// Self-loops are skipped with a warning; duplicate edges are deduplicated.
pub fn parse_dimacs(contents: &str) -> Result<Graph, InputError> {
    let mut lines = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('%'));

    let header = lines.next().ok_or_else(|| InputError::MalformedHeader {
        line: 1,
        detail: "file is empty".to_string(),
    })?;
    let header_parts: Vec<&str> = header.split_whitespace().collect();
    if header_parts.len() != 3 {
        return Err(InputError::MalformedHeader {
            line: 1,
            detail: format!("expected 3 integers, found {}", header_parts.len()),
        });
    }
    let num_vertices = parse_usize(header_parts[0], 1)?;
    let num_edges = parse_usize(header_parts[1], 1)?;
    let num_clusters_hint = parse_usize(header_parts[2], 1)?;

    let mut cluster_of = Vec::with_capacity(num_vertices);
    for (i, line) in (&mut lines).take(num_vertices).enumerate() {
        cluster_of.push(parse_usize(line, i + 2)?);
    }
    if cluster_of.len() != num_vertices {
        return Err(InputError::LineCountMismatch {
            expected: num_vertices,
            found: cluster_of.len(),
        });
    }

    let mut edges = Vec::with_capacity(num_edges);
    for (i, line) in (&mut lines).take(num_edges).enumerate() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 2 {
            return Err(InputError::MalformedHeader {
                line: num_vertices + i + 2,
                detail: format!("expected 2 integers, found {}", parts.len()),
            });
        }
        let u = parse_usize(parts[0], num_vertices + i + 2)?;
        let v = parse_usize(parts[1], num_vertices + i + 2)?;
        if u == v {
            log::warn!("skipping self-loop at vertex {u}");
            continue;
        }
        edges.push(Edge::new(u, v));
    }

    let graph = Graph::new(num_vertices, cluster_of, edges)?;
    if graph.num_clusters() != num_clusters_hint {
        log::warn!(
            "header declared {num_clusters_hint} clusters but {} are populated",
            graph.num_clusters()
        );
    }
    Ok(graph)
}

fn parse_usize(text: &str, line: usize) -> Result<usize, InputError> {
    text.parse::<usize>().map_err(|e| InputError::NumberFormat {
        line,
        detail: e.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct JsonVertex {
    id: usize,
    partition_id: usize,
    #[allow(dead_code)]
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct JsonEdge {
    source: usize,
    target: usize,
    #[allow(dead_code)]
    #[serde(default)]
    weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct JsonPartition {
    #[allow(dead_code)]
    id: usize,
    #[allow(dead_code)]
    vertex_ids: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct JsonInstance {
    num_vertices: usize,
    #[allow(dead_code)]
    num_partitions: usize,
    vertices: Vec<JsonVertex>,
    edges: Vec<JsonEdge>,
    #[allow(dead_code)]
    #[serde(default)]
    partitions: Vec<JsonPartition>,
    #[allow(dead_code)]
    #[serde(default)]
    optimal_colors: Option<usize>,
    #[allow(dead_code)]
    #[serde(default)]
    name: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    description: Option<String>,
}

/// Parses the alternative JSON instance format.
pub fn parse_json(contents: &str) -> Result<Graph, InputError> {
    let instance: JsonInstance =
        serde_json::from_str(contents).map_err(|e| InputError::Json(e.to_string()))?;

    let mut cluster_of = vec![None; instance.num_vertices];
    for v in &instance.vertices {
        if v.id >= instance.num_vertices {
            return Err(InputError::ClusterOutOfRange {
                vertex: v.id,
                cluster: v.partition_id,
                num_clusters: instance.num_vertices,
            });
        }
        if cluster_of[v.id].replace(v.partition_id).is_some() {
            return Err(InputError::DuplicateVertex(v.id));
        }
    }
    let mut resolved = Vec::with_capacity(instance.num_vertices);
    for (id, c) in cluster_of.into_iter().enumerate() {
        resolved.push(c.ok_or(InputError::UnassignedVertex(id))?);
    }

    let edges = instance
        .edges
        .iter()
        .filter(|e| e.source != e.target)
        .map(|e| Edge::new(e.source, e.target))
        .collect();

    Graph::new(instance.num_vertices, resolved, edges)
}

/// Reads an instance file, dispatching on an explicit format or the file
/// extension (`.json` vs anything else, treated as DIMACS).
pub fn read_instance(path: &Path, format: Option<InstanceFormat>) -> Result<Graph, InputError> {
    let contents = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let format = format.unwrap_or_else(|| {
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            InstanceFormat::Json
        } else {
            InstanceFormat::Pcp
        }
    });
    match format {
        InstanceFormat::Pcp => parse_dimacs(&contents),
        InstanceFormat::Json => parse_json(&contents),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceFormat {
    Pcp,
    Json,
}

impl std::str::FromStr for InstanceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pcp" => Ok(InstanceFormat::Pcp),
            "json" => Ok(InstanceFormat::Json),
            other => Err(format!("unknown format '{other}', expected pcp or json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trivial_instance() {
        let text = "6 4 3\n0\n0\n1\n1\n2\n2\n0 2\n1 3\n2 4\n0 4\n";
        let graph = parse_dimacs(text).unwrap();
        assert_eq!(graph.num_vertices(), 6);
        assert_eq!(graph.num_clusters(), 3);
        assert_eq!(graph.edges().len(), 4);
    }

    #[test]
    fn deduplicates_edges_and_skips_self_loops() {
        let text = "3 4 1\n0\n0\n0\n0 1\n1 0\n2 2\n0 2\n";
        let graph = parse_dimacs(text).unwrap();
        assert_eq!(graph.edges().len(), 2);
    }

    #[test]
    fn rejects_out_of_range_cluster() {
        let text = "2 0 1\n0\n5\n";
        let err = parse_dimacs(text).unwrap_err();
        assert!(matches!(err, InputError::ClusterOutOfRange { .. }));
    }

    #[test]
    fn parses_json_instance() {
        let text = r#"{
            "num_vertices": 3,
            "num_partitions": 2,
            "vertices": [
                {"id": 0, "partition_id": 0},
                {"id": 1, "partition_id": 0},
                {"id": 2, "partition_id": 1}
            ],
            "edges": [{"source": 0, "target": 2}],
            "partitions": [
                {"id": 0, "vertex_ids": [0, 1]},
                {"id": 1, "vertex_ids": [2]}
            ]
        }"#;
        let graph = parse_json(text).unwrap();
        assert_eq!(graph.num_vertices(), 3);
        assert_eq!(graph.num_clusters(), 2);
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn rejects_edge_referencing_out_of_range_vertex() {
        let text = "2 1 1\n0\n0\n0 9\n";
        let err = parse_dimacs(text).unwrap_err();
        assert!(matches!(err, InputError::EdgeVertexOutOfRange { .. }));
    }

    #[test]
    fn json_rejects_edge_referencing_out_of_range_vertex() {
        let text = r#"{
            "num_vertices": 2,
            "num_partitions": 1,
            "vertices": [
                {"id": 0, "partition_id": 0},
                {"id": 1, "partition_id": 0}
            ],
            "edges": [{"source": 0, "target": 9}],
            "partitions": [{"id": 0, "vertex_ids": [0, 1]}]
        }"#;
        let err = parse_json(text).unwrap_err();
        assert!(matches!(err, InputError::EdgeVertexOutOfRange { .. }));
    }
}
