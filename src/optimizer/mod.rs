#[cfg(feature = "python")]
pub mod python;

use crate::core::{AssignmentMatrix, Module, Node};
use crate::error::Result;
use crate::optimization::{
    HistoryCallback, IterationResult, ParticleOptimizer, PlacementProblem, PsoConfig, Solver,
};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Module names grouped by the node they were placed on, in node order.
/// Nodes that host nothing are kept with an empty list.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PlacementResult {
    placements: IndexMap<String, Vec<String>>,
}

impl PlacementResult {
    pub fn from_assignment(nodes: &[Node], modules: &[Module], assignment: &AssignmentMatrix) -> Self {
        let mut placements: IndexMap<String, Vec<String>> = IndexMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            let placed = assignment
                .modules_on(i)
                .map(|j| modules[j].name.clone());
            placements.entry(node.name.clone()).or_default().extend(placed);
        }
        Self { placements }
    }

    pub fn modules_on(&self, node: &str) -> &[String] {
        self.placements.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_of(&self, module: &str) -> Option<&str> {
        self.placements
            .iter()
            .find(|(_, mods)| mods.iter().any(|m| m == module))
            .map(|(node, _)| node.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.placements
            .iter()
            .map(|(node, mods)| (node.as_str(), mods.as_slice()))
    }

    pub fn num_nodes(&self) -> usize {
        self.placements.len()
    }

    pub fn into_inner(self) -> IndexMap<String, Vec<String>> {
        self.placements
    }
}

/// Everything a caller gets back from one placement run.
#[derive(Clone, Debug, Serialize)]
pub struct PlacementOutcome {
    pub placement: PlacementResult,
    pub assignment: AssignmentMatrix,
    pub best_fitness: f64,
    /// Wall-clock time spent in the search
    pub elapsed: Duration,
    pub iterations: u32,
    pub cost_evals: usize,
    pub history: Vec<IterationResult>,
}

impl PlacementOutcome {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Entry point: runs the swarm search on a placement problem.
pub struct Placer {
    config: PsoConfig,
    verbose: bool,
}

impl Placer {
    pub fn new(config: PsoConfig) -> Self {
        Self {
            config,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn config(&self) -> &PsoConfig {
        &self.config
    }

    /// Run with an RNG seeded from `config.seed`, or from OS entropy.
    pub fn place(&self, problem: &PlacementProblem) -> Result<PlacementOutcome> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.place_with_rng(problem, &mut rng)
    }

    pub fn place_with_rng(
        &self,
        problem: &PlacementProblem,
        rng: &mut dyn RngCore,
    ) -> Result<PlacementOutcome> {
        let mut solver = ParticleOptimizer::new(self.config.clone());
        let mut callback = HistoryCallback::new(self.verbose);

        let start = Instant::now();
        let result = solver.solve(problem, &mut callback, rng)?;
        let elapsed = start.elapsed();

        tracing::info!(
            best_fitness = result.fitness,
            elapsed_ms = elapsed.as_secs_f64() * 1e3,
            cost_evals = result.cost_evals,
            "placement search finished"
        );
        if self.verbose {
            callback.log_summary();
        }

        let placement = PlacementResult::from_assignment(problem.nodes(), problem.modules(), &result.best);

        Ok(PlacementOutcome {
            placement,
            assignment: result.best,
            best_fitness: result.fitness,
            elapsed,
            iterations: result.iterations,
            cost_evals: result.cost_evals,
            history: callback.into_history(),
        })
    }
}

impl Default for Placer {
    fn default() -> Self {
        Self::new(PsoConfig::default())
    }
}
