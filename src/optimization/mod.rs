pub mod callback;
pub mod config;
pub mod fitness;
pub mod problem;
pub mod solvers;

pub use callback::{HistoryCallback, IterationResult, NoopCallback};
pub use config::{InertiaDivision, PsoConfig, UpdateMode, VelocityRead};
pub use problem::PlacementProblem;
pub use solvers::{OptimizationCallback, ParticleOptimizer, Problem, Solver, SolverResult};
