//! Typed error hierarchy for the solver library.
//!
//! The CLI binary wraps these with `anyhow::Context` for human-readable
//! chains; library callers match on `SolveError` directly.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("input error: {0}")]
    Input(#[from] InputError),

    #[error("solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("invariant violation: {0}")]
    Invariant(String),
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("malformed header on line {line}: {detail}")]
    MalformedHeader { line: usize, detail: String },

    #[error("expected {expected} lines, found {found}")]
    LineCountMismatch { expected: usize, found: usize },

    #[error("vertex {vertex} references out-of-range cluster {cluster} (have {num_clusters})")]
    ClusterOutOfRange {
        vertex: usize,
        cluster: usize,
        num_clusters: usize,
    },

    #[error("vertex id {0} is duplicated")]
    DuplicateVertex(usize),

    #[error("edge references out-of-range vertex {vertex} (have {num_vertices} vertices)")]
    EdgeVertexOutOfRange { vertex: usize, num_vertices: usize },

    #[error("cluster {0} has no member vertices")]
    EmptyCluster(usize),

    #[error("vertex {0} is not assigned to any cluster")]
    UnassignedVertex(usize),

    #[error("could not parse number on line {line}: {detail}")]
    NumberFormat { line: usize, detail: String },

    #[error("JSON instance is malformed: {0}")]
    Json(String),

    #[error("could not read instance file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("restricted master problem is infeasible")]
    MasterInfeasible,

    #[error("restricted master problem is unbounded")]
    MasterUnbounded,

    #[error("restricted master problem solve failed: {0}")]
    MasterFailed(String),

    #[error("pricing subproblem solve failed: {0}")]
    PricingFailed(String),
}

pub type SolveResult<T> = Result<T, SolveError>;
