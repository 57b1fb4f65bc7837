use super::swarm::Swarm;
use crate::core::AssignmentMatrix;
use crate::error::Result;
use rand::RngCore;

#[derive(Clone, Debug)]
pub struct SolverResult {
    pub best: AssignmentMatrix,
    pub fitness: f64,
    pub iterations: u32,
    pub cost_evals: usize,
    /// Global-best fitness after initialization and after each iteration
    pub history: Vec<f64>,
    pub message: String,
}

/// Progress hook invoked once after swarm initialization (iteration 0) and
/// once at the end of every iteration.
pub trait OptimizationCallback {
    fn on_iteration(&mut self, iteration: u32, swarm: &Swarm);
}

/// Placement problem as seen by a solver: a node x module grid and a score
/// for each complete assignment.
pub trait Problem: Sync {
    fn num_nodes(&self) -> usize;

    fn num_modules(&self) -> usize;

    /// Score a valid assignment. Lower is better.
    fn fitness(&self, assignment: &AssignmentMatrix) -> f64;
}

/// Solver interface - takes problem, callback and the run's randomness
pub trait Solver {
    fn name(&self) -> &str;

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
        rng: &mut dyn RngCore,
    ) -> Result<SolverResult>;
}
