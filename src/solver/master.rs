//! Restricted master problem, solved with `good_lp` over the HiGHS backend.
//!
//! The master is rebuilt from scratch on every call rather than warm-started
//! incrementally, following the same model-per-call pattern the teacher's
//! own `good_lp`-backed extractor uses (`HighsExtractor::extract`): simplicity
//! over incrementality, since `good_lp`'s builder consumes itself on `solve`.
//! HiGHS is picked explicitly (rather than `good_lp::default_solver`, which
//! resolves ambiguously once both the `ilp-cbc` and `ilp-highs` features are
//! on) because it is the one `good_lp` backend exposing constraint duals,
//! which §4.3 requires for pricing.

use std::collections::HashMap;
use std::time::Instant;

use good_lp::solvers::highs::highs;
use good_lp::solvers::DualValues;
use good_lp::{constraint, variable, ConstraintReference, Expression, ProblemVariables, Solution, SolverModel};
use indexmap::IndexSet;

use crate::aux_graph::AuxiliaryGraph;
use crate::error::{SolveError, SolveResult, SolverError};
use crate::graph::Graph;
use crate::pool::ColumnPool;

use super::{seconds_until, MasterSolution, RmpBackend};

/// Penalty objective coefficient for artificial columns (§4.2): large
/// enough that the master only uses one when no real column covers a
/// cluster, but never so large it destabilizes the LP.
pub const ARTIFICIAL_PENALTY: f64 = 1000.0;

#[derive(Debug, Default)]
pub struct HighsMaster;

impl HighsMaster {
    pub fn new() -> Self {
        HighsMaster
    }
}

impl RmpBackend for HighsMaster {
    fn solve(
        &mut self,
        graph: &Graph,
        aux: &AuxiliaryGraph,
        pool: &ColumnPool,
        deadline: Instant,
    ) -> SolveResult<MasterSolution> {
        let mut vars = ProblemVariables::new();
        let mut col_vars = Vec::with_capacity(pool.len());
        for column in pool.iter() {
            let v = vars.add(variable().min(0.0));
            col_vars.push((column, v));
        }

        let col_clusters: Vec<IndexSet<_>> = col_vars
            .iter()
            .map(|(column, _)| {
                column
                    .vertices
                    .iter()
                    .flat_map(|&v| aux.clusters_covered(graph, v))
                    .collect::<IndexSet<_>>()
            })
            .collect();

        let mut objective = Expression::from(0.0);
        for (column, v) in &col_vars {
            let cost = if column.is_artificial {
                ARTIFICIAL_PENALTY
            } else {
                1.0
            };
            objective += cost * *v;
        }

        let mut model = vars.minimise(objective).using(highs);
        model.set_time_limit(seconds_until(deadline));

        // Tight tolerances and disabled dual reductions (§4.3) so duals stay
        // available even when the LP degenerates.
        model.set_option("primal_feasibility_tolerance", 1e-9);
        model.set_option("dual_feasibility_tolerance", 1e-9);
        model.set_option("presolve", "off");

        // One constraint per cluster, in ascending cluster-id order; the
        // reference is kept so the dual can be read back after solving.
        let mut cons_refs: Vec<ConstraintReference> = Vec::with_capacity(graph.num_clusters());
        for cluster in 0..graph.num_clusters() {
            let mut expr = Expression::from(0.0);
            for ((_, v), clusters) in col_vars.iter().zip(&col_clusters) {
                if clusters.contains(&cluster) {
                    expr += *v;
                }
            }
            cons_refs.push(model.add_constraint(constraint!(expr >= 1.0)));
        }

        let num_clusters = graph.num_clusters();
        let solution = match model.solve() {
            Ok(solution) => solution,
            Err(good_lp::ResolutionError::Infeasible) => {
                return Err(SolveError::Solver(SolverError::MasterInfeasible));
            }
            Err(good_lp::ResolutionError::Unbounded) => {
                return Err(SolveError::Solver(SolverError::MasterUnbounded));
            }
            Err(other) => {
                // HiGHS' own time limit fires exactly at `deadline`; a solve
                // that neither converged nor proved infeasibility/unbounded-
                // ness but ran past the deadline is a feasible-bound timeout
                // (§4.3), not a hard failure, so it mustn't abort the node or
                // prune a subtree that's actually still live.
                if Instant::now() >= deadline {
                    log::warn!(
                        "master: solve hit the deadline without an optimal result ({other}), \
                         returning a conservative bound"
                    );
                    return Ok(MasterSolution {
                        values: HashMap::new(),
                        duals: vec![0.0; num_clusters],
                        objective: f64::INFINITY,
                    });
                }
                return Err(SolveError::Solver(SolverError::MasterFailed(other.to_string())));
            }
        };

        let mut values = HashMap::with_capacity(col_vars.len());
        for (column, v) in &col_vars {
            let value = solution.value(*v);
            if value > 1e-7 {
                values.insert(column.id(), value);
            }
        }

        let duals: Vec<f64> = cons_refs.iter().map(|c| solution.dual(*c)).collect();
        let objective_value: f64 = col_vars
            .iter()
            .map(|(column, v)| {
                let cost = if column.is_artificial {
                    ARTIFICIAL_PENALTY
                } else {
                    1.0
                };
                cost * solution.value(*v)
            })
            .sum();

        log::debug!(
            "master: solved, objective {objective_value:.6} over {} column(s)",
            values.len()
        );
        Ok(MasterSolution {
            values,
            duals,
            objective: objective_value,
        })
    }
}
