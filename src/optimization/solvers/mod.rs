pub mod inertia;
mod particle;
pub mod swarm;
pub mod traits;

pub use inertia::InertiaSchedule;
pub use particle::ParticleOptimizer;
pub use swarm::{GlobalBest, Particle, Swarm};
pub use traits::{OptimizationCallback, Problem, Solver, SolverResult};
