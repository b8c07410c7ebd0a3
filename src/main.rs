use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use pcp_bp::controller::{BranchAndPrice, SolveStatus};
use pcp_bp::graph::{read_instance, InstanceFormat};
use pcp_bp::SolveError;

const USAGE: &str = "\
pcp-bp solve <instance-path> [--time-limit <seconds>] [--format pcp|json] [--debug]

  --time-limit <seconds>  wall-clock budget for the whole search (default: 300)
  --format pcp|json       instance format override (default: inferred from extension)
  --debug                 print per-node statistics after solving

Exit codes: 0 optimal, 1 feasible (time limit reached), 2 no feasible solution
found within the time limit, 3 input error, 4 solver error.";

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            // An error that gets here comes from argument parsing, not from
            // loading or solving an instance (those report their own exit
            // codes below without raising), so it is a CLI usage error.
            eprintln!("error: {err:?}");
            ExitCode::from(3)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        println!("{USAGE}");
        return Ok(ExitCode::SUCCESS);
    }

    let subcommand = args.subcommand()?;
    if subcommand.as_deref() != Some("solve") {
        eprintln!("{USAGE}");
        anyhow::bail!("expected subcommand `solve`");
    }

    let time_limit: f64 = args.opt_value_from_str("--time-limit")?.unwrap_or(300.0);
    let format: Option<InstanceFormat> = args
        .opt_value_from_str("--format")
        .context("--format must be `pcp` or `json`")?;
    let debug = args.contains("--debug");

    let instance_path: PathBuf = args
        .free_from_str()
        .context("expected an instance path")?;
    args.finish();

    let graph = match read_instance(&instance_path, format) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("error: {}", SolveError::from(e));
            return Ok(ExitCode::from(3));
        }
    };
    log::info!(
        "loaded instance {}: {} vertices, {} clusters, {} edges",
        instance_path.display(),
        graph.num_vertices(),
        graph.num_clusters(),
        graph.edges().len()
    );

    let solver = BranchAndPrice::new(Arc::new(graph), Duration::from_secs_f64(time_limit.max(0.0)));
    let output = match solver.solve() {
        Ok(output) => output,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(ExitCode::from(4));
        }
    };

    if debug {
        eprintln!(
            "nodes processed={} created={} pruned={} cg-iterations={} elapsed={:.3}s",
            output.stats.nodes_processed,
            output.stats.nodes_created,
            output.stats.nodes_pruned,
            output.stats.cg_iterations,
            output.stats.total_solve_time.as_secs_f64(),
        );
        eprintln!(
            "objective={} lower_bound={} gap={:.4}",
            output.objective,
            output.lower_bound,
            output.stats.gap(output.objective, output.lower_bound)
        );
    }

    match output.status {
        SolveStatus::Optimal => {
            println!("OPTIMAL {}", output.objective as i64);
            print_solution(&output);
            Ok(ExitCode::SUCCESS)
        }
        SolveStatus::Feasible => {
            println!("FEASIBLE {}", output.objective as i64);
            print_solution(&output);
            Ok(ExitCode::from(1))
        }
        SolveStatus::NoSolution => {
            println!("NO_SOLUTION");
            Ok(ExitCode::from(2))
        }
    }
}

fn print_solution(output: &pcp_bp::SolverOutput) {
    for (color, column) in output.solution.iter().enumerate() {
        let vertices = column
            .vertices
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        println!("{color}: {vertices}");
    }
}
