use super::solvers::swarm::Swarm;
use super::solvers::traits::OptimizationCallback;
use serde::Serialize;

/// Iteration result for tracking optimization progress
#[derive(Debug, Clone, Serialize)]
pub struct IterationResult {
    pub iteration: u32,
    pub best_fitness: f64,
    /// Mean current fitness across the swarm
    pub mean_fitness: f64,
}

/// Discards progress.
pub struct NoopCallback;

impl OptimizationCallback for NoopCallback {
    fn on_iteration(&mut self, _iteration: u32, _swarm: &Swarm) {}
}

/// Records the swarm's progress and reports it through `tracing`.
#[derive(Default)]
pub struct HistoryCallback {
    verbose: bool,
    history: Vec<IterationResult>,
}

impl HistoryCallback {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            history: Vec::new(),
        }
    }

    /// Get iteration history
    pub fn history(&self) -> &[IterationResult] {
        &self.history
    }

    pub fn into_history(self) -> Vec<IterationResult> {
        self.history
    }

    /// Log a summary of the recorded run
    pub fn log_summary(&self) {
        let (Some(first), Some(last)) = (self.history.first(), self.history.last()) else {
            return;
        };

        let improvement = if first.best_fitness > 0.0 {
            100.0 * (first.best_fitness - last.best_fitness) / first.best_fitness
        } else {
            0.0
        };

        tracing::info!(
            iterations = last.iteration,
            initial_best = first.best_fitness,
            final_best = last.best_fitness,
            improvement_pct = improvement,
            "placement search summary"
        );
    }
}

impl OptimizationCallback for HistoryCallback {
    fn on_iteration(&mut self, iteration: u32, swarm: &Swarm) {
        let particles = swarm.particles();
        let mean_fitness = if particles.is_empty() {
            0.0
        } else {
            particles.iter().map(|p| p.fitness).sum::<f64>() / particles.len() as f64
        };

        let record = IterationResult {
            iteration,
            best_fitness: swarm.global().fitness(),
            mean_fitness,
        };

        if self.verbose {
            tracing::info!(
                iteration,
                best = record.best_fitness,
                mean = record.mean_fitness,
                "swarm progress"
            );
        }

        self.history.push(record);
    }
}
