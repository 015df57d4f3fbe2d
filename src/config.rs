//! Model tunables: calibration scale, matchup table and simulator limits.

use crate::error::{PredictError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Calibration and simulation settings. Every field has a default, so a config
/// file only needs the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Rating difference that multiplies the odds by ten.
    pub scale: f64,
    /// Single-game probabilities are clamped to `[epsilon, 1 - epsilon]`.
    pub epsilon: f64,
    /// Additive rating modifier by (own race, opponent race), rows and columns in P/T/Z order.
    pub matchup_modifiers: [[f64; 3]; 3],
    /// How often a random player ends up on P/T/Z. Used when a side is announced as random.
    pub random_race_weights: [f64; 3],
    /// Bracket occupants at or below this probability are dropped.
    pub prune_threshold: f64,
    /// Largest round-robin group solved by exact enumeration.
    pub exact_group_limit: usize,
    /// Simulated groups when sampling.
    pub trials: usize,
    /// Seed for sampling.
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            scale: 400.0,
            epsilon: 1e-9,
            matchup_modifiers: [[0.0; 3]; 3],
            random_race_weights: [1.0 / 3.0; 3],
            prune_threshold: 1e-12,
            exact_group_limit: 6,
            trials: 100_000,
            seed: 0x5eed,
        }
    }
}

impl ModelConfig {
    /// Parse from TOML text and validate.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ModelConfig =
            toml::from_str(text).map_err(|e| PredictError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PredictError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(PredictError::Config(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if !(self.epsilon > 0.0 && self.epsilon < 0.5) {
            return Err(PredictError::Config(format!(
                "epsilon must be in (0, 0.5), got {}",
                self.epsilon
            )));
        }
        if self.matchup_modifiers.iter().flatten().any(|m| !m.is_finite()) {
            return Err(PredictError::Config("matchup modifiers must be finite".into()));
        }
        let weight_sum: f64 = self.random_race_weights.iter().sum();
        if self.random_race_weights.iter().any(|w| !w.is_finite() || *w < 0.0) || weight_sum <= 0.0 {
            return Err(PredictError::Config(
                "random race weights must be non-negative with a positive sum".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.prune_threshold) {
            return Err(PredictError::Config(format!(
                "prune threshold must be in [0, 1), got {}",
                self.prune_threshold
            )));
        }
        if self.trials == 0 {
            return Err(PredictError::Config("trials must be positive".into()));
        }
        Ok(())
    }

    /// Race weights rescaled to sum to one.
    pub fn normalized_race_weights(&self) -> [f64; 3] {
        let sum: f64 = self.random_race_weights.iter().sum();
        self.random_race_weights.map(|w| w / sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ModelConfig::from_toml_str("scale = 1.5\nseed = 7\n").unwrap();
        assert_eq!(c.scale, 1.5);
        assert_eq!(c.seed, 7);
        assert_eq!(c.exact_group_limit, 6);
    }

    #[test]
    fn rejects_non_positive_scale() {
        assert!(matches!(
            ModelConfig::from_toml_str("scale = 0.0"),
            Err(PredictError::Config(_))
        ));
    }

    #[test]
    fn matchup_table_parses() {
        let c = ModelConfig::from_toml_str(
            "matchup_modifiers = [[0.0, 10.0, -5.0], [-10.0, 0.0, 0.0], [5.0, 0.0, 0.0]]",
        )
        .unwrap();
        assert_eq!(c.matchup_modifiers[0][1], 10.0);
    }
}
