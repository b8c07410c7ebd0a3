//! End-to-end solves over small literal instances, exercising the full
//! branch-and-price stack (master, pricing, column generation, branching,
//! and the controller) together rather than any one module in isolation.

use std::sync::Arc;
use std::time::Duration;

use pcp_bp::column::Column;
use pcp_bp::controller::{BranchAndPrice, SolveStatus};
use pcp_bp::graph::{Edge, Graph};
use pcp_bp::node::BpNode;

fn reset_counters() {
    Column::reset_id_counter_for_tests();
    BpNode::reset_id_counter_for_tests();
}

fn solve(graph: Graph) -> pcp_bp::SolverOutput {
    reset_counters();
    BranchAndPrice::new(Arc::new(graph), Duration::from_secs(10))
        .solve()
        .expect("solve should not error on a well-formed instance")
}

/// Three singleton clusters forming a triangle: every pair of
/// representatives is adjacent, so each needs its own color.
#[test]
fn triangle_of_singleton_clusters_needs_three_colors() {
    let graph = Graph::new(
        3,
        vec![0, 1, 2],
        vec![Edge::new(0, 1), Edge::new(1, 2), Edge::new(0, 2)],
    )
    .unwrap();

    let output = solve(graph);
    assert_eq!(output.status, SolveStatus::Optimal);
    assert_eq!(output.objective as i64, 3);
}

/// A complete graph on 8 vertices split into 4 clusters of 2: no two
/// representatives of any pair of clusters can ever share a color, so every
/// color class is a singleton and the optimum equals the cluster count.
#[test]
fn complete_graph_needs_one_color_per_cluster() {
    let cluster_of = vec![0, 0, 1, 1, 2, 2, 3, 3];
    let mut edges = Vec::new();
    for u in 0..8 {
        for v in (u + 1)..8 {
            edges.push(Edge::new(u, v));
        }
    }
    let graph = Graph::new(8, cluster_of, edges).unwrap();

    let output = solve(graph);
    assert_eq!(output.status, SolveStatus::Optimal);
    assert_eq!(output.objective as i64, 4);
}

/// Ten vertices in five clusters with no edges at all: any transversal is
/// already an independent set, so one color suffices.
#[test]
fn edgeless_instance_needs_one_color() {
    let cluster_of = vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4];
    let graph = Graph::new(10, cluster_of, Vec::new()).unwrap();

    let output = solve(graph);
    assert_eq!(output.status, SolveStatus::Optimal);
    assert_eq!(output.objective as i64, 1);
    assert_eq!(output.solution.len(), 1, "one color class covers every cluster");
}

/// A 3x3 grid graph (bipartite, so 2-colorable) with its three rows as
/// clusters: the optimum must not exceed 2 regardless of which
/// representative each color class picks.
#[test]
fn grid_graph_rows_need_at_most_two_colors() {
    // vertex id = 3*row + col
    let mut edges = Vec::new();
    for row in 0..3 {
        for col in 0..3 {
            let id = 3 * row + col;
            if col + 1 < 3 {
                edges.push(Edge::new(id, id + 1));
            }
            if row + 1 < 3 {
                edges.push(Edge::new(id, id + 3));
            }
        }
    }
    let cluster_of = (0..9).map(|v| v / 3).collect();
    let graph = Graph::new(9, cluster_of, edges).unwrap();

    let output = solve(graph);
    assert_eq!(output.status, SolveStatus::Optimal);
    assert!(output.objective as i64 <= 2);
}

/// A moderate instance with no edges forces the restricted master to
/// converge without ever pricing a negative-reduced-cost column beyond the
/// first round, well inside the loop's iteration cap.
#[test]
fn column_generation_converges_quickly() {
    let cluster_of: Vec<usize> = (0..12).map(|v| v / 2).collect();
    let mut edges = Vec::new();
    for cluster in 0..6 {
        // a short path between consecutive clusters' first vertex, not
        // enough to force more than a couple of pricing rounds
        if cluster + 1 < 6 {
            edges.push(Edge::new(2 * cluster, 2 * (cluster + 1)));
        }
    }
    let graph = Graph::new(12, cluster_of, edges).unwrap();

    let output = solve(graph);
    assert_eq!(output.status, SolveStatus::Optimal);
    assert!(
        output.stats.cg_iterations <= 50,
        "expected convergence within 50 CG iterations total, got {}",
        output.stats.cg_iterations
    );
}

/// An odd cycle of clusters (5 clusters, each a 2-vertex pair wired into a
/// 5-cycle across representatives) cannot be 2-colored, forcing the
/// controller to branch at least once before finding the true optimum.
#[test]
fn odd_cycle_forces_branching() {
    let cluster_of = vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4];
    let mut edges = Vec::new();
    for cluster in 0..5 {
        let next = (cluster + 1) % 5;
        edges.push(Edge::new(2 * cluster, 2 * next));
    }
    let graph = Graph::new(10, cluster_of, edges).unwrap();

    let output = solve(graph);
    assert_eq!(output.status, SolveStatus::Optimal);
    assert_eq!(output.objective as i64, 3, "an odd cycle needs 3 colors");
    assert!(
        output.stats.nodes_processed > 1,
        "an odd cycle's LP relaxation is fractional at the root, so branching must occur"
    );
}
