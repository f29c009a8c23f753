use std::fmt::Display;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use flappy_core::SimConfig;
use serde::{Deserialize, Serialize};

/// Episodes without a cap can run forever once a genome learns to fly.
pub const DEFAULT_MAX_TICKS: u32 = 6_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub population_size: usize,
    pub generations: u32,
    pub seeds_per_generation: u32,
    /// Seeds every generation's episode seeds and the mutation stream.
    pub base_seed: u32,
    pub elite_count: usize,
    pub tournament_size: usize,
    /// Probability that any single weight is perturbed.
    pub mutation_rate: f64,
    /// Standard deviation of a weight perturbation.
    pub mutation_scale: f64,
    pub hidden_units: usize,
    /// Stop early once the best mean fitness reaches this value.
    pub fitness_target: Option<f64>,
    pub sim: SimConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        let mut sim = SimConfig::default();
        sim.max_ticks = Some(DEFAULT_MAX_TICKS);
        Self {
            population_size: 50,
            generations: 50,
            seeds_per_generation: 3,
            base_seed: 0x5EED_F1A9,
            elite_count: 2,
            tournament_size: 3,
            mutation_rate: 0.2,
            mutation_scale: 0.5,
            hidden_units: 6,
            fitness_target: None,
            sim,
        }
    }
}

impl TrainConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing config {}", path.display()))
    }

    pub fn clamp(&mut self) {
        clamp_field("population_size", &mut self.population_size, 2, 10_000);
        clamp_field("generations", &mut self.generations, 1, 100_000);
        clamp_field("seeds_per_generation", &mut self.seeds_per_generation, 1, 256);
        let max_elites = self.population_size - 1;
        clamp_field("elite_count", &mut self.elite_count, 0, max_elites);
        let max_tournament = self.population_size;
        clamp_field("tournament_size", &mut self.tournament_size, 1, max_tournament);
        clamp_field("mutation_rate", &mut self.mutation_rate, 0.0, 1.0);
        clamp_field("mutation_scale", &mut self.mutation_scale, 0.0, 10.0);
        clamp_field("hidden_units", &mut self.hidden_units, 1, 64);
        if self.sim.max_ticks.is_none() {
            tracing::warn!(
                fallback = DEFAULT_MAX_TICKS,
                "sim.max_ticks unset; capping episodes for training"
            );
            self.sim.max_ticks = Some(DEFAULT_MAX_TICKS);
        }
    }
}

fn clamp_field<T>(name: &str, value: &mut T, min: T, max: T)
where
    T: PartialOrd + Copy + Display,
{
    let original = *value;
    // NaN fails both comparisons and lands on the floor.
    let clamped = if original > max {
        max
    } else if original >= min {
        original
    } else {
        min
    };
    if clamped != original {
        tracing::warn!(field = name, from = %original, to = %clamped, "clamped config value");
        *value = clamped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_clamp() {
        let mut config = TrainConfig::default();
        config.clamp();
        assert_eq!(config, TrainConfig::default());
    }

    #[test]
    fn clamp_pulls_values_into_range() {
        let mut config = TrainConfig {
            population_size: 1,
            elite_count: 9,
            tournament_size: 0,
            mutation_rate: 3.0,
            mutation_scale: f64::NAN,
            hidden_units: 0,
            ..TrainConfig::default()
        };
        config.sim.max_ticks = None;
        config.clamp();

        assert_eq!(config.population_size, 2);
        assert_eq!(config.elite_count, 1);
        assert_eq!(config.tournament_size, 1);
        assert_eq!(config.mutation_rate, 1.0);
        assert_eq!(config.mutation_scale, 0.0);
        assert_eq!(config.hidden_units, 1);
        assert_eq!(config.sim.max_ticks, Some(DEFAULT_MAX_TICKS));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: TrainConfig = serde_json::from_str(
            r#"{"population_size":12,"sim":{"obstacles":{"gap_size":240}}}"#,
        )
        .expect("partial config should decode");
        assert_eq!(config.population_size, 12);
        assert_eq!(config.generations, TrainConfig::default().generations);
        assert_eq!(config.sim.obstacles.gap_size, 240);
        // Nested sim config falls back to core defaults, not the training cap.
        assert_eq!(config.sim.max_ticks, None);
    }
}
