use super::Placer;
use crate::core::{Module, Node};
use crate::optimization::{PlacementProblem, PsoConfig};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// Place modules on nodes from Python.
///
/// `nodes` are `(name, mips, uplink_latency)` tuples and `modules` are
/// `(name, mips)` tuples. A JSON `config` overrides the keyword defaults.
/// Returns `([(node, [module, ...]), ...], best_fitness, elapsed_ms)`.
#[pyfunction]
#[pyo3(signature = (nodes, modules, num_particles=100, num_iterations=50, seed=None, config=None, verbose=false))]
#[allow(clippy::type_complexity)]
pub fn place(
    nodes: Vec<(String, f64, f64)>,
    modules: Vec<(String, f64)>,
    num_particles: usize,
    num_iterations: u32,
    seed: Option<u64>,
    config: Option<&str>,
    verbose: bool,
) -> PyResult<(Vec<(String, Vec<String>)>, f64, f64)> {
    let mut config = match config {
        Some(json) => PsoConfig::from_json_str(json)
            .map_err(|e| PyValueError::new_err(format!("Invalid config: {}", e)))?,
        None => PsoConfig::new(num_particles, num_iterations),
    };
    if seed.is_some() {
        config.seed = seed;
    }

    let nodes = nodes
        .into_iter()
        .map(|(name, mips, latency)| Node::new(name, mips, latency))
        .collect();
    let modules = modules
        .into_iter()
        .map(|(name, mips)| Module::new(name, mips))
        .collect();

    let problem = PlacementProblem::from_topology(nodes, modules)
        .map_err(|e| PyValueError::new_err(format!("Validation failed: {}", e)))?;
    let outcome = Placer::new(config)
        .with_verbose(verbose)
        .place(&problem)
        .map_err(|e| PyValueError::new_err(format!("Placement failed: {}", e)))?;

    let placement = outcome
        .placement
        .into_inner()
        .into_iter()
        .collect();

    Ok((
        placement,
        outcome.best_fitness,
        outcome.elapsed.as_secs_f64() * 1e3,
    ))
}
