use super::inertia::InertiaSchedule;
use super::swarm::Swarm;
use super::traits::{OptimizationCallback, Problem, Solver, SolverResult};
use crate::error::{PlacementError, Result};
use crate::optimization::config::{PsoConfig, UpdateMode};
use rand::RngCore;

/// Binary Particle Swarm Optimization over node x module assignment matrices.
///
/// Runs exactly `num_iterations` iterations from a fresh random swarm; there
/// is no convergence or stagnation exit.
pub struct ParticleOptimizer {
    config: PsoConfig,
}

impl ParticleOptimizer {
    pub fn new(config: PsoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PsoConfig {
        &self.config
    }
}

impl Default for ParticleOptimizer {
    fn default() -> Self {
        Self::new(PsoConfig::default())
    }
}

impl Solver for ParticleOptimizer {
    fn name(&self) -> &str {
        "BPSO"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
        rng: &mut dyn RngCore,
    ) -> Result<SolverResult> {
        self.config.validate()?;
        if problem.num_nodes() == 0 {
            return Err(PlacementError::NoNodes);
        }
        if problem.num_modules() == 0 {
            return Err(PlacementError::NoModules);
        }

        let config = &self.config;
        let schedule = InertiaSchedule::new(config);

        tracing::info!(
            solver = self.name(),
            nodes = problem.num_nodes(),
            modules = problem.num_modules(),
            particles = config.num_particles,
            iterations = config.num_iterations,
            mode = ?config.update_mode,
            "starting placement search"
        );

        // Initialize swarm
        let mut swarm = Swarm::initialize(problem, config, rng);
        let mut cost_evals = config.num_particles;
        let mut history = Vec::with_capacity(config.num_iterations as usize + 1);
        history.push(swarm.global().fitness());
        callback.on_iteration(0, &swarm);

        // Main optimization loop
        for t in 0..config.num_iterations {
            match config.update_mode {
                UpdateMode::Sequential => {
                    swarm.iterate_sequential(t, config, &schedule, problem, rng)
                }
                UpdateMode::Barrier => swarm.iterate_barrier(t, config, &schedule, problem, rng),
            }
            cost_evals += config.num_particles;

            let best = swarm.global().fitness();
            history.push(best);
            tracing::debug!(iteration = t + 1, best_fitness = best, "iteration finished");

            callback.on_iteration(t + 1, &swarm);
        }

        let global = swarm.into_global();
        debug_assert!(global.position().is_valid());

        Ok(SolverResult {
            fitness: global.fitness(),
            best: global.position().clone(),
            iterations: config.num_iterations,
            cost_evals,
            history,
            message: "Max iterations reached".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AssignmentMatrix, CostMatrix};
    use crate::optimization::callback::NoopCallback;
    use crate::optimization::fitness;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Costs(CostMatrix);

    impl Problem for Costs {
        fn num_nodes(&self) -> usize {
            self.0.num_nodes()
        }

        fn num_modules(&self) -> usize {
            self.0.num_modules()
        }

        fn fitness(&self, assignment: &AssignmentMatrix) -> f64 {
            fitness::evaluate(&self.0, assignment)
        }
    }

    struct Empty;

    impl Problem for Empty {
        fn num_nodes(&self) -> usize {
            3
        }

        fn num_modules(&self) -> usize {
            0
        }

        fn fitness(&self, _: &AssignmentMatrix) -> f64 {
            0.0
        }
    }

    #[test]
    fn global_best_history_never_increases() {
        let rows = (0..6)
            .map(|i| (0..9).map(|j| ((i + 2 * j) % 7) as f64 + 0.5).collect())
            .collect();
        let problem = Costs(CostMatrix::new(rows).unwrap());

        for mode in [UpdateMode::Sequential, UpdateMode::Barrier] {
            let mut solver = ParticleOptimizer::new(PsoConfig::new(20, 30).with_update_mode(mode));
            let mut rng = StdRng::seed_from_u64(17);
            let result = solver.solve(&problem, &mut NoopCallback, &mut rng).unwrap();

            assert_eq!(result.history.len(), 31);
            assert!(result.history.windows(2).all(|w| w[1] <= w[0]));
            assert_eq!(*result.history.last().unwrap(), result.fitness);
            assert_eq!(result.cost_evals, 20 * 31);
            assert!(result.best.is_valid());
            assert_eq!(fitness::evaluate(&problem.0, &result.best), result.fitness);
        }
    }

    #[test]
    fn refuses_problems_without_modules() {
        let mut solver = ParticleOptimizer::default();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            solver.solve(&Empty, &mut NoopCallback, &mut rng),
            Err(PlacementError::NoModules)
        ));
    }

    #[test]
    fn refuses_invalid_config() {
        let problem = Costs(CostMatrix::new(vec![vec![1.0]]).unwrap());
        let mut solver = ParticleOptimizer::new(PsoConfig::new(0, 5));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            solver.solve(&problem, &mut NoopCallback, &mut rng),
            Err(PlacementError::Config(_))
        ));
    }
}
