//! Pricing subproblem: maximum-weight independent set on the auxiliary
//! graph, solved directly against `coin_cbc` (§4.4).
//!
//! `coin_cbc`'s safe Rust bindings expose no solution-pool API, unlike the
//! Gurobi `PoolSearchMode`/`PoolSolutions` the source relies on. We emulate
//! a pool of up to `pool_size` columns by repeatedly re-solving with a
//! no-good cut excluding each solution already extracted, stopping once a
//! solve no longer improves on the break-even reduced cost of zero.

use std::collections::HashMap;
use std::time::Instant;

use coin_cbc::{Col, Model, Sense};

use crate::aux_graph::AuxiliaryGraph;
use crate::column::Column;
use crate::error::{SolveError, SolveResult, SolverError};
use crate::graph::{Graph, VertexId};

use super::{seconds_until, PricingBackend, PricingOutcome};

const REDUCED_COST_EPS: f64 = 1e-6;

#[derive(Debug, Default)]
pub struct CbcPricing;

impl CbcPricing {
    pub fn new() -> Self {
        CbcPricing
    }
}

impl PricingBackend for CbcPricing {
    fn price(
        &mut self,
        _graph: &Graph,
        aux: &AuxiliaryGraph,
        pool_size: usize,
        deadline: Instant,
    ) -> SolveResult<PricingOutcome> {
        let vertex_ids: Vec<VertexId> = aux.vertices().map(|v| v.id).collect();
        if vertex_ids.is_empty() {
            return Ok(PricingOutcome::default());
        }

        let weight: HashMap<VertexId, f64> =
            vertex_ids.iter().map(|&v| (v, aux.weight(v))).collect();

        let mut model = Model::default();
        model.set_obj_sense(Sense::Maximize);

        let mut cols: HashMap<VertexId, Col> = HashMap::with_capacity(vertex_ids.len());
        for &v in &vertex_ids {
            let c = model.add_binary();
            model.set_obj_coeff(c, weight[&v]);
            cols.insert(v, c);
        }

        for edge in aux.edges() {
            if !cols.contains_key(&edge.u) || !cols.contains_key(&edge.v) {
                continue;
            }
            let row = model.add_row();
            model.set_row_upper(row, 1.0);
            model.set_weight(row, cols[&edge.u], 1.0);
            model.set_weight(row, cols[&edge.v], 1.0);
        }

        model.set_parameter("seconds", &seconds_until(deadline).max(0.0).to_string());
        model.set_parameter("logLevel", "0");

        let mut columns = Vec::new();
        let mut timed_out = false;
        loop {
            if columns.len() >= pool_size {
                log::debug!("pricing: pool size {pool_size} reached, stopping");
                break;
            }
            if seconds_until(deadline) <= 0.0 {
                log::warn!("pricing: deadline reached before pool filled or convergence");
                timed_out = true;
                break;
            }

            let solution = model.solve();
            if solution.raw().status() != coin_cbc::raw::Status::Finished {
                if seconds_until(deadline) <= 0.0 {
                    log::warn!("pricing: CBC solve interrupted by the deadline before finishing");
                    timed_out = true;
                } else {
                    return Err(SolveError::Solver(SolverError::PricingFailed(
                        "CBC returned a non-terminal status".to_string(),
                    )));
                }
                break;
            }
            if solution.raw().obj_value() < 1.0 + REDUCED_COST_EPS {
                log::debug!(
                    "pricing: converged, best objective {:.6} at or below break-even",
                    solution.raw().obj_value()
                );
                break;
            }

            let chosen: Vec<VertexId> = vertex_ids
                .iter()
                .copied()
                .filter(|v| solution.col(cols[v]) > 0.5)
                .collect();

            if chosen.is_empty() {
                break;
            }

            let reduced_cost = 1.0 - chosen.iter().map(|v| weight[v]).sum::<f64>();
            debug_assert!(
                reduced_cost < REDUCED_COST_EPS,
                "pricing accepted a non-improving column: reduced cost {reduced_cost}"
            );

            log::debug!(
                "pricing: priced column over {} vertices, reduced cost {reduced_cost:.6}",
                chosen.len()
            );
            columns.push(Column::new(aux.expand(&chosen), false, "exact pricing"));

            // No-good cut: forbid selecting every chosen vertex simultaneously
            // again, so the next solve is forced toward a different solution.
            let cut = model.add_row();
            model.set_row_upper(cut, (chosen.len() - 1) as f64);
            for &v in &chosen {
                model.set_weight(cut, cols[&v], 1.0);
            }
        }

        Ok(PricingOutcome { columns, timed_out })
    }
}
