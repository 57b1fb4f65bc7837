use crate::error::{PlacementError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which previous-velocity cell feeds the inertia term.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityRead {
    /// `v[i][j]` reads `v_prev[i][j + 1]` and the last column is never
    /// scanned, so it is always placed by repair.
    #[default]
    ShiftedByOne,
    /// `v[i][j]` reads `v_prev[i][j]` over every column.
    Aligned,
}

impl VelocityRead {
    #[inline]
    pub(crate) fn offset(self) -> usize {
        match self {
            Self::ShiftedByOne => 1,
            Self::Aligned => 0,
        }
    }

    /// Columns visited by the velocity and position scans.
    #[inline]
    pub(crate) fn scan_len(self, n_modules: usize) -> usize {
        n_modules.saturating_sub(self.offset())
    }
}

/// How `r / 2` is computed in the annealing branch of the inertia schedule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InertiaDivision {
    /// Integer division: `r / 2 == 0`, so `w` is either 1 or 0.
    #[default]
    Truncating,
    /// Real division: `w` is one of 1, 1.5, 0 or 0.5.
    Real,
}

/// When particles observe each other's improvements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Particles run one after another; an improvement is visible to every
    /// particle updated after it in the same iteration.
    #[default]
    Sequential,
    /// Particles run in parallel against the global best as it stood at the
    /// start of the iteration; improvements merge at the iteration boundary.
    Barrier,
}

/// Hyperparameters of the binary PSO placement search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsoConfig {
    pub num_particles: usize,
    pub num_iterations: u32,
    pub cognitive: f64, // c1 - personal best influence
    pub social: f64,    // c2 - global best influence
    pub inertia_max: f64,
    pub inertia_min: f64,
    /// Every `annealing_interval`-th iteration uses the randomized rule
    pub annealing_interval: u32,
    pub velocity_read: VelocityRead,
    pub inertia_division: InertiaDivision,
    pub update_mode: UpdateMode,
    /// Seed for the run's RNG; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            num_particles: 100,
            num_iterations: 50,
            cognitive: 1.49445,
            social: 1.49445,
            inertia_max: 0.9,
            inertia_min: 0.1,
            annealing_interval: 5,
            velocity_read: VelocityRead::default(),
            inertia_division: InertiaDivision::default(),
            update_mode: UpdateMode::default(),
            seed: None,
        }
    }
}

impl PsoConfig {
    pub fn new(num_particles: usize, num_iterations: u32) -> Self {
        Self {
            num_particles,
            num_iterations,
            ..Self::default()
        }
    }

    /// Configure swarm size (default: 100)
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.num_particles = size;
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.num_iterations = iterations;
        self
    }

    /// Configure PSO coefficients (defaults: c1 = c2 = 1.49445)
    pub fn with_pso_params(mut self, cognitive: f64, social: f64) -> Self {
        self.cognitive = cognitive;
        self.social = social;
        self
    }

    /// Configure the linearly decreasing inertia bounds (defaults: 0.9 / 0.1)
    pub fn with_inertia_bounds(mut self, max: f64, min: f64) -> Self {
        self.inertia_max = max;
        self.inertia_min = min;
        self
    }

    pub fn with_velocity_read(mut self, read: VelocityRead) -> Self {
        self.velocity_read = read;
        self
    }

    pub fn with_inertia_division(mut self, division: InertiaDivision) -> Self {
        self.inertia_division = division;
        self
    }

    pub fn with_update_mode(mut self, mode: UpdateMode) -> Self {
        self.update_mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_particles == 0 {
            return Err(PlacementError::Config("swarm needs at least one particle".into()));
        }
        if self.annealing_interval == 0 {
            return Err(PlacementError::Config("annealing interval must be positive".into()));
        }
        for (name, value) in [
            ("cognitive", self.cognitive),
            ("social", self.social),
            ("inertia_max", self.inertia_max),
            ("inertia_min", self.inertia_min),
        ] {
            if !value.is_finite() {
                return Err(PlacementError::Config(format!("{name} must be finite, got {value}")));
            }
        }
        if self.inertia_min > self.inertia_max {
            return Err(PlacementError::Config(format!(
                "inertia_min {} exceeds inertia_max {}",
                self.inertia_min, self.inertia_max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_parameters() {
        let config = PsoConfig::default();
        assert_eq!(config.num_particles, 100);
        assert_eq!(config.num_iterations, 50);
        assert_eq!(config.cognitive, 1.49445);
        assert_eq!(config.social, config.cognitive);
        assert_eq!(config.annealing_interval, 5);
        assert_eq!(config.velocity_read, VelocityRead::ShiftedByOne);
        assert_eq!(config.inertia_division, InertiaDivision::Truncating);
        assert_eq!(config.update_mode, UpdateMode::Sequential);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = PsoConfig::from_json_str(
            r#"{ "num_particles": 12, "update_mode": "barrier", "velocity_read": "aligned", "seed": 4 }"#,
        )
        .unwrap();

        assert_eq!(config.num_particles, 12);
        assert_eq!(config.num_iterations, 50);
        assert_eq!(config.update_mode, UpdateMode::Barrier);
        assert_eq!(config.velocity_read, VelocityRead::Aligned);
        assert_eq!(config.seed, Some(4));
    }

    #[test]
    fn rejects_degenerate_settings() {
        assert!(PsoConfig::from_json_str(r#"{ "num_particles": 0 }"#).is_err());
        assert!(PsoConfig::default().with_inertia_bounds(0.1, 0.9).validate().is_err());
        assert!(matches!(
            PsoConfig::from_json_str("{ not json"),
            Err(PlacementError::Json(_))
        ));
    }

    #[test]
    fn scan_len_drops_the_last_column_when_shifted() {
        assert_eq!(VelocityRead::ShiftedByOne.scan_len(4), 3);
        assert_eq!(VelocityRead::ShiftedByOne.scan_len(1), 0);
        assert_eq!(VelocityRead::Aligned.scan_len(4), 4);
    }
}
