//! Solver boundary: the two pluggable pieces of the branch-and-price loop.
//!
//! The core algorithm (`crate::cg`, `crate::controller`) only ever talks to
//! these two traits, never to `good_lp` or `coin_cbc` directly, so a
//! different LP or MIP engine can be swapped in without touching the column
//! generation or branch-and-bound logic.

pub mod master;
pub mod pricing;

use std::collections::HashMap;
use std::time::Instant;

use crate::aux_graph::AuxiliaryGraph;
use crate::column::{Column, ColumnId};
use crate::error::SolveResult;
use crate::graph::Graph;
use crate::pool::ColumnPool;

/// Result of solving the restricted master problem once.
#[derive(Debug, Clone)]
pub struct MasterSolution {
    /// Primal value of every non-zero column, keyed by column id.
    pub values: HashMap<ColumnId, f64>,
    /// Dual value per cluster-coverage constraint, indexed by `ClusterId`.
    pub duals: Vec<f64>,
    pub objective: f64,
}

/// The restricted master problem: a set-covering LP over the current
/// column pool (§4.2, §4.3).
pub trait RmpBackend {
    fn solve(
        &mut self,
        graph: &Graph,
        aux: &AuxiliaryGraph,
        pool: &ColumnPool,
        deadline: Instant,
    ) -> SolveResult<MasterSolution>;
}

/// Result of one pricing call.
#[derive(Debug, Clone, Default)]
pub struct PricingOutcome {
    /// Up to `pool_size` columns with negative reduced cost, ordered by
    /// objective (§4.4).
    pub columns: Vec<Column>,
    /// `true` if the deadline was reached before the solver could prove
    /// that no further improving independent set exists — as opposed to a
    /// solve that converged (found everything there was to find, or proved
    /// the break-even objective unreachable) well within budget. Distinct
    /// from "`columns` is empty", since a solver can time out after having
    /// already banked a few columns (§4.5's deadline handling).
    pub timed_out: bool,
}

/// The pricing subproblem: maximum-weight independent set on the auxiliary
/// graph, returning up to `pool_size` columns with negative reduced cost
/// (§4.4). Callers must call `AuxiliaryGraph::update_weights` with the
/// current duals before invoking this, once per pricing call.
pub trait PricingBackend {
    fn price(
        &mut self,
        graph: &Graph,
        aux: &AuxiliaryGraph,
        pool_size: usize,
        deadline: Instant,
    ) -> SolveResult<PricingOutcome>;
}

fn seconds_until(deadline: Instant) -> f64 {
    let now = Instant::now();
    if deadline <= now {
        0.0
    } else {
        (deadline - now).as_secs_f64()
    }
}
