//! Branch-and-price solver library for the partition coloring problem.
//!
//! An input [`graph::Graph`] partitions its vertices into clusters; a
//! solution picks one representative per cluster and colors them so that no
//! edge joins two same-colored representatives, minimizing colors used. The
//! solve wires a [`controller::BranchAndPrice`] tree search around a
//! [`cg`] column-generation loop, itself built from an [`solver::RmpBackend`]
//! restricted master problem and a [`solver::PricingBackend`] pricing
//! subproblem over each node's [`aux_graph::AuxiliaryGraph`].

pub mod aux_graph;
pub mod branching;
pub mod cg;
pub mod column;
pub mod controller;
pub mod error;
pub mod graph;
pub mod node;
pub mod pool;
pub mod solver;

pub use controller::{BranchAndPrice, SolutionColumn, SolveStatus, SolverOutput, Stats};
pub use error::{InputError, SolveError, SolveResult, SolverError};
pub use graph::{Graph, InstanceFormat};
