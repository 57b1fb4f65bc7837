use super::inertia::InertiaSchedule;
use super::traits::Problem;
use crate::core::{AssignedColumns, AssignmentMatrix, VelocityField};
use crate::optimization::config::{PsoConfig, VelocityRead};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// One candidate placement plus its search memory.
#[derive(Clone, Debug)]
pub struct Particle {
    pub position: AssignmentMatrix,
    pub velocity: VelocityField,
    pub fitness: f64,
    pub best_position: AssignmentMatrix,
    pub best_fitness: f64,
    /// Fitness recorded at each iteration; unvisited slots hold 0
    pub history: Vec<f64>,
}

impl Particle {
    pub fn random<R: Rng + ?Sized>(problem: &dyn Problem, iterations: u32, rng: &mut R) -> Self {
        let (m, n) = (problem.num_nodes(), problem.num_modules());

        let position = AssignmentMatrix::random_valid(m, n, rng);
        let fitness = problem.fitness(&position);
        let velocity = VelocityField::random(m, n, rng);

        Self {
            best_position: position.clone(),
            best_fitness: fitness,
            position,
            velocity,
            fitness,
            history: vec![0.0; iterations as usize],
        }
    }

    /// Velocity pass. A column whose velocity saturates at 1 on some node is
    /// closed for the remaining nodes of the pass.
    fn update_velocity<R: Rng + ?Sized>(
        &mut self,
        w: f64,
        global: &AssignmentMatrix,
        config: &PsoConfig,
        rng: &mut R,
    ) {
        let (m, n) = (self.position.num_nodes(), self.position.num_modules());
        let offset = config.velocity_read.offset();
        let scan = config.velocity_read.scan_len(n);

        let mut next = VelocityField::zeros(m, n);
        let mut assigned = AssignedColumns::new(n);

        for i in 0..m {
            for j in 0..scan {
                let r1 = f64::from(rng.gen_range(0..2u8));
                let r2 = f64::from(rng.gen_range(0..2u8));
                if assigned.is_assigned(j) {
                    continue;
                }

                let current = self.position.value(i, j);
                let v = w * self.velocity.get(i, j + offset)
                    + config.cognitive * r1 * (self.best_position.value(i, j) - current)
                    + config.social * r2 * (global.value(i, j) - current);
                next.set(i, j, v);

                if next.get(i, j) == 1.0 {
                    assigned.mark(j);
                }
            }
        }

        self.velocity = next;
    }

    /// Sigmoid transfer from velocity to a fresh position. Returns the columns
    /// that received a node; the rest still need repair.
    fn update_position<R: Rng + ?Sized>(
        &mut self,
        read: VelocityRead,
        rng: &mut R,
    ) -> AssignedColumns {
        let (m, n) = (self.position.num_nodes(), self.position.num_modules());
        let scan = read.scan_len(n);

        let mut next = AssignmentMatrix::zeros(m, n);
        let mut assigned = AssignedColumns::new(n);

        for i in 0..m {
            for j in 0..scan {
                let draw = f64::from(rng.gen_range(0..2u8));
                if assigned.is_assigned(j) {
                    continue;
                }

                let sigmoid = 1.0 / (1.0 + (-self.velocity.get(i, j)).exp());
                if sigmoid > draw {
                    next.set(i, j, true);
                    assigned.mark(j);
                }
            }
        }

        self.position = next;
        assigned
    }

    /// One full update at iteration `t`; returns the new fitness.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        t: u32,
        global: &AssignmentMatrix,
        config: &PsoConfig,
        schedule: &InertiaSchedule,
        problem: &dyn Problem,
        rng: &mut R,
    ) -> f64 {
        let w = schedule.weight(t, &self.history, self.best_fitness, rng);

        self.update_velocity(w, global, config, rng);
        let assigned = self.update_position(config.velocity_read, rng);
        self.position.repair(&assigned, rng);

        let fitness = problem.fitness(&self.position);
        self.fitness = fitness;
        if fitness < self.best_fitness {
            self.best_position = self.position.clone();
            self.best_fitness = fitness;
        }
        self.history[t as usize] = fitness;

        fitness
    }
}

/// Best placement seen by any particle so far.
#[derive(Clone, Debug)]
pub struct GlobalBest {
    position: AssignmentMatrix,
    fitness: f64,
}

impl GlobalBest {
    pub fn new(n_nodes: usize, n_modules: usize) -> Self {
        Self {
            position: AssignmentMatrix::zeros(n_nodes, n_modules),
            fitness: f64::INFINITY,
        }
    }

    /// Replace the record if `fitness` is strictly better.
    pub fn offer(&mut self, position: &AssignmentMatrix, fitness: f64) -> bool {
        if fitness < self.fitness {
            self.position = position.clone();
            self.fitness = fitness;
            tracing::trace!(fitness, "global best improved");
            true
        } else {
            false
        }
    }

    pub fn position(&self) -> &AssignmentMatrix {
        &self.position
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }
}

/// Fixed-size population sharing a single global best.
#[derive(Clone, Debug)]
pub struct Swarm {
    particles: Vec<Particle>,
    global: GlobalBest,
}

impl Swarm {
    pub fn initialize<R: Rng + ?Sized>(
        problem: &dyn Problem,
        config: &PsoConfig,
        rng: &mut R,
    ) -> Self {
        let mut global = GlobalBest::new(problem.num_nodes(), problem.num_modules());
        let mut particles = Vec::with_capacity(config.num_particles);

        for _ in 0..config.num_particles {
            let particle = Particle::random(problem, config.num_iterations, rng);
            global.offer(&particle.position, particle.fitness);
            particles.push(particle);
        }

        Self { particles, global }
    }

    /// Particles in index order, each seeing every improvement made before it.
    pub fn iterate_sequential<R: Rng + ?Sized>(
        &mut self,
        t: u32,
        config: &PsoConfig,
        schedule: &InertiaSchedule,
        problem: &dyn Problem,
        rng: &mut R,
    ) {
        for particle in &mut self.particles {
            let fitness = particle.step(t, self.global.position(), config, schedule, problem, rng);
            self.global.offer(&particle.position, fitness);
        }
    }

    /// Particles in parallel against the start-of-iteration global best.
    ///
    /// Per-particle RNGs are seeded from `rng` in particle order, and offers
    /// merge in particle order, so the outcome does not depend on scheduling.
    pub fn iterate_barrier<R: Rng + ?Sized>(
        &mut self,
        t: u32,
        config: &PsoConfig,
        schedule: &InertiaSchedule,
        problem: &dyn Problem,
        rng: &mut R,
    ) {
        let snapshot = self.global.position().clone();
        let seeds: Vec<u64> = (0..self.particles.len()).map(|_| rng.r#gen()).collect();

        let results: Vec<f64> = self
            .particles
            .par_iter_mut()
            .zip(seeds.par_iter())
            .map(|(particle, &seed)| {
                let mut local = StdRng::seed_from_u64(seed);
                particle.step(t, &snapshot, config, schedule, problem, &mut local)
            })
            .collect();

        for (particle, fitness) in self.particles.iter().zip(results) {
            self.global.offer(&particle.position, fitness);
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn global(&self) -> &GlobalBest {
        &self.global
    }

    pub fn into_global(self) -> GlobalBest {
        self.global
    }
}
