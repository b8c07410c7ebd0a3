//! Column generation: the master/pricing iteration within one B&P node
//! (§4.5, `ColumnGeneration` in the source).

use std::collections::HashMap;
use std::time::Instant;

use crate::aux_graph::AuxiliaryGraph;
use crate::column::ColumnId;
use crate::error::{SolveError, SolveResult};
use crate::graph::Graph;
use crate::pool::ColumnPool;
use crate::solver::{MasterSolution, PricingBackend, RmpBackend};

const EPSILON: f64 = 1e-6;
/// Hard cap on CG iterations per node: a correct instance converges in a
/// handful of rounds (§8 scenario 5 expects ≤ 50 on a 12-vertex instance);
/// this only guards against a pricing/master inconsistency spinning forever.
const MAX_ITERATIONS: u32 = 1_000;
const PRICING_POOL_SIZE: usize = 10;

/// Outcome of running column generation to convergence (or to the shared
/// deadline) at one node.
#[derive(Debug, Clone)]
pub struct CgResult {
    pub primal: HashMap<ColumnId, f64>,
    pub objective: f64,
    pub iterations: u32,
    /// `true` if the deadline was reached before §4.5's termination
    /// conditions fired — either this loop's own deadline check, a master
    /// solve that hit its time limit, or a pricing call that timed out
    /// without pricing any new column. The controller re-queues the node on
    /// its last real bound when this holds, rather than treating the round
    /// as converged.
    pub timed_out_without_progress: bool,
}

/// Runs master↔pricing to convergence at one node (§4.5). `upper_bound` is
/// the controller's current best integer objective; `lower_bound` is the
/// node's best-known lower bound (0 at the root, per §9's conservative
/// choice — see DESIGN.md).
pub fn run(
    graph: &Graph,
    aux: &mut AuxiliaryGraph,
    pool: &mut ColumnPool,
    master: &mut dyn RmpBackend,
    pricing: &mut dyn PricingBackend,
    upper_bound: f64,
    lower_bound: f64,
    deadline: Instant,
) -> SolveResult<CgResult> {
    let mut last_solution: Option<MasterSolution> = None;
    let mut iterations = 0u32;

    loop {
        iterations += 1;
        if Instant::now() >= deadline {
            log::debug!("cg: deadline reached at iteration {iterations}, before this round's master solve");
            return Ok(CgResult {
                primal: last_solution
                    .as_ref()
                    .map(|s| s.values.clone())
                    .unwrap_or_default(),
                objective: last_solution.as_ref().map(|s| s.objective).unwrap_or(f64::INFINITY),
                iterations,
                timed_out_without_progress: last_solution.is_none(),
            });
        }

        #[cfg(debug_assertions)]
        aux.debug_check_invariants().map_err(SolveError::Invariant)?;

        let solution = master.solve(graph, aux, pool, deadline)?;

        // The master signals "deadline reached without an optimal result" by
        // returning an unreachable objective with no assigned columns (§4.3),
        // rather than an error; treat it exactly like this loop's own
        // deadline check so the node is rescheduled on its last real bound
        // instead of having a fabricated bound prune or accept it.
        if solution.objective.is_infinite() && solution.values.is_empty() {
            log::warn!("cg: master timed out at iteration {iterations}, node will be rescheduled");
            return Ok(CgResult {
                primal: last_solution
                    .as_ref()
                    .map(|s| s.values.clone())
                    .unwrap_or_default(),
                objective: last_solution.as_ref().map(|s| s.objective).unwrap_or(f64::INFINITY),
                iterations,
                timed_out_without_progress: true,
            });
        }

        apply_primal_to_pool(pool, &solution.values);
        let z = solution.objective;
        log::debug!("cg: iteration {iterations} master objective {z:.6}");

        // Termination 1: the LP bound already dominates the incumbent.
        if (z - EPSILON).ceil() >= upper_bound {
            log::debug!("cg: converged, LP bound {z:.6} dominates incumbent {upper_bound:.6}");
            last_solution = Some(solution);
            break;
        }
        // Termination 2: converged against the node's lower bound.
        if (z - lower_bound).abs() < EPSILON {
            log::debug!("cg: converged, LP bound {z:.6} matches node lower bound {lower_bound:.6}");
            last_solution = Some(solution);
            break;
        }

        aux.update_weights(graph, &solution.duals);
        let outcome = pricing.price(graph, aux, PRICING_POOL_SIZE, deadline)?;

        #[cfg(debug_assertions)]
        for column in &outcome.columns {
            debug_assert_reduced_cost(graph, column, &solution.duals).map_err(SolveError::Invariant)?;
        }

        let found_new = !outcome.columns.is_empty();
        log::debug!(
            "cg: iteration {iterations} pricing returned {} column(s), timed_out={}",
            outcome.columns.len(),
            outcome.timed_out
        );
        for column in outcome.columns {
            pool.add(column);
        }
        last_solution = Some(solution);

        if outcome.timed_out && !found_new {
            log::warn!("cg: pricing timed out at iteration {iterations} with no new columns, node will be rescheduled");
            return Ok(CgResult {
                primal: last_solution.as_ref().map(|s| s.values.clone()).unwrap_or_default(),
                objective: last_solution.as_ref().map(|s| s.objective).unwrap_or(f64::INFINITY),
                iterations,
                timed_out_without_progress: true,
            });
        }

        if !found_new {
            log::debug!("cg: converged, pricing found no improving column at iteration {iterations}");
            break;
        }
        if iterations >= MAX_ITERATIONS {
            log::warn!("cg: hit iteration cap {MAX_ITERATIONS} without converging");
            break;
        }
    }

    let solution = last_solution.expect("at least one master solve always runs");
    Ok(CgResult {
        primal: solution.values,
        objective: solution.objective,
        iterations,
        timed_out_without_progress: false,
    })
}

/// Records each column's last master-assigned primal value (§3's `value`
/// field on `Column`), so branching can read it straight off the pool.
fn apply_primal_to_pool(pool: &mut ColumnPool, values: &HashMap<ColumnId, f64>) {
    for column in pool.iter_mut() {
        column.value = values.get(&column.id()).copied().unwrap_or(0.0);
    }
}

#[cfg(debug_assertions)]
fn debug_assert_reduced_cost(
    graph: &Graph,
    column: &crate::column::Column,
    duals: &[f64],
) -> Result<(), String> {
    // Column vertices are always original (never synthetic, §3), so each
    // contributes exactly one cluster's dual.
    let dual_sum: f64 = column.vertices.iter().map(|&v| duals[graph.cluster_of(v)]).sum();
    let reduced_cost = 1.0 - dual_sum;
    if reduced_cost >= 1e-5 {
        return Err(format!(
            "pricing column {column} has non-negative reduced cost {reduced_cost}"
        ));
    }
    Ok(())
}
