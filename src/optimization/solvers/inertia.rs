use crate::optimization::config::{InertiaDivision, PsoConfig};
use rand::Rng;

/// Hybrid inertia weight: linearly decreasing by default, replaced every
/// `interval`-th iteration by a randomized annealing draw.
///
/// Based on "A new particle swarm optimization algorithm with random inertia
/// weight and evolution strategy".
#[derive(Clone, Debug)]
pub struct InertiaSchedule {
    max: f64,
    min: f64,
    interval: u32,
    iterations: u32,
    division: InertiaDivision,
}

impl InertiaSchedule {
    pub fn new(config: &PsoConfig) -> Self {
        Self {
            max: config.inertia_max,
            min: config.inertia_min,
            interval: config.annealing_interval.max(1),
            iterations: config.num_iterations,
            division: config.inertia_division,
        }
    }

    #[inline]
    pub fn is_annealing_step(&self, t: u32) -> bool {
        t != 0 && t % self.interval == 0
    }

    /// `w_max - (w_max - w_min) * (t_max - t) / t_max`
    pub fn linear(&self, t: u32) -> f64 {
        let t_max = f64::from(self.iterations);
        self.max - (self.max - self.min) * (t_max - f64::from(t)) / t_max
    }

    /// Acceptance probability of the annealing step at iteration `t`.
    ///
    /// `history` holds one fitness slot per iteration; the slot for `t` has
    /// not been written yet when the schedule is consulted.
    pub fn annealing_probability(&self, t: u32, history: &[f64], personal_best: f64) -> f64 {
        let t = t as usize;
        let current = history[t];
        let previous = history[t - self.interval as usize];

        if previous <= current {
            return 1.0;
        }

        let (sum, count) = history[..t]
            .iter()
            .filter(|&&f| f > 0.0)
            .fold((0.0, 0usize), |(sum, count), &f| (sum + f, count + 1));

        if count == 0 || personal_best <= 0.0 {
            tracing::debug!(
                iteration = t,
                personal_best,
                "annealing temperature undefined, accepting unconditionally"
            );
            return 1.0;
        }

        let temperature = (sum / count as f64) / personal_best - 1.0;
        let p = (-(previous - current) / temperature).exp();
        if p.is_nan() { 1.0 } else { p }
    }

    fn half(&self, r: u8) -> f64 {
        match self.division {
            InertiaDivision::Truncating => f64::from(r / 2),
            InertiaDivision::Real => f64::from(r) / 2.0,
        }
    }

    /// Inertia weight for one particle at iteration `t`.
    pub fn weight<R: Rng + ?Sized>(
        &self,
        t: u32,
        history: &[f64],
        personal_best: f64,
        rng: &mut R,
    ) -> f64 {
        if !self.is_annealing_step(t) {
            return self.linear(t);
        }

        let p = self.annealing_probability(t, history, personal_best);
        let r: u8 = rng.gen_range(0..2);

        if p >= f64::from(r) {
            1.0 + self.half(r)
        } else {
            self.half(r)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn schedule(division: InertiaDivision) -> InertiaSchedule {
        InertiaSchedule::new(&PsoConfig::new(10, 50).with_inertia_division(division))
    }

    #[test]
    fn linear_weight_between_annealing_steps() {
        let s = schedule(InertiaDivision::Truncating);
        let mut rng = StdRng::seed_from_u64(1);
        let history = vec![0.0; 50];

        assert!((s.weight(0, &history, 1.0, &mut rng) - 0.1).abs() < 1e-12);
        assert!((s.weight(25, &history, 1.0, &mut rng) - 0.5).abs() < 1e-12);
        assert!((s.weight(49, &history, 1.0, &mut rng) - 0.884).abs() < 1e-12);
    }

    #[test]
    fn annealing_steps_are_positive_multiples_of_interval() {
        let s = schedule(InertiaDivision::Truncating);
        assert!(!s.is_annealing_step(0));
        assert!(!s.is_annealing_step(4));
        assert!(s.is_annealing_step(5));
        assert!(s.is_annealing_step(45));
    }

    #[test]
    fn no_improvement_accepts_with_certainty() {
        let s = schedule(InertiaDivision::Truncating);
        let mut history = vec![0.0; 50];
        history[0] = 3.0;
        history[5] = 4.0;
        assert_eq!(s.annealing_probability(5, &history, 3.0), 1.0);
    }

    #[test]
    fn improvement_uses_temperature_from_history() {
        let s = schedule(InertiaDivision::Truncating);
        let mut history = vec![0.0; 50];
        history[..5].copy_from_slice(&[4.0, 4.0, 2.0, 2.0, 3.0]);

        // avg = 3, temp = 3 / 2 - 1 = 0.5, p = exp(-(4 - 0) / 0.5)
        let p = s.annealing_probability(5, &history, 2.0);
        assert!((p - (-8.0f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn zero_personal_best_is_guarded() {
        let s = schedule(InertiaDivision::Truncating);
        let mut history = vec![0.0; 50];
        history[0] = 1.0;
        assert_eq!(s.annealing_probability(5, &history, 0.0), 1.0);
    }

    #[test]
    fn zero_personal_best_keeps_full_inertia_on_every_annealing_step() {
        let s = schedule(InertiaDivision::Truncating);
        let mut rng = StdRng::seed_from_u64(3);
        let mut history = vec![0.0; 50];
        for t in 0..50 {
            if s.is_annealing_step(t) {
                assert_eq!(s.weight(t, &history, 0.0, &mut rng), 1.0);
            }
            history[t as usize] = if t % 2 == 0 { 2.0 } else { 0.0 };
        }
    }

    #[test]
    fn truncating_division_yields_zero_or_one() {
        let s = schedule(InertiaDivision::Truncating);
        let mut rng = StdRng::seed_from_u64(42);
        let mut history = vec![0.0; 50];
        history[..5].copy_from_slice(&[10.0, 9.0, 9.0, 9.0, 9.0]);

        for _ in 0..64 {
            let w = s.weight(5, &history, 9.0, &mut rng);
            assert!(w == 0.0 || w == 1.0, "unexpected inertia {w}");
        }
    }

    #[test]
    fn real_division_reaches_half_steps() {
        let s = schedule(InertiaDivision::Real);
        let mut rng = StdRng::seed_from_u64(42);
        let mut history = vec![0.0; 50];
        history[0] = 2.0;
        history[5] = 2.0;

        let mut seen = Vec::new();
        for _ in 0..64 {
            let w = s.weight(5, &history, 2.0, &mut rng);
            assert!(w == 1.0 || w == 1.5, "unexpected inertia {w}");
            if !seen.contains(&w) {
                seen.push(w);
            }
        }
        assert_eq!(seen.len(), 2);
    }
}
