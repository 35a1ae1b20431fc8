//! Configuration System
//!
//! Model parameters, loadable from a TOML file so experiments can be adjusted
//! without recompiling. Defaults follow Calhoun's social pool setup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, SimError};
use crate::policy::{FrustratedEncounter, PolicyKind};

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "social_pool.toml";

/// Everything needed to construct a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub population_size: u32,
    pub grid_width: u32,
    pub grid_height: u32,
    /// Wrap movement around the grid edges
    pub toroidal: bool,
    /// Population default for ticks spent gratified
    pub gratification_limit: u32,
    /// Per-agent jitter, uniform in `[-variation, +variation]`
    pub gratification_limit_variation: u32,
    pub need_limit: u32,
    pub need_limit_variation: u32,
    pub frustration_limit: u32,
    /// Upper bound of the per-agent frustration multiplier
    pub frustration_variation: f32,
    pub random_seed: u64,
    pub policy: PolicyConfig,
}

/// Which transition table to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub kind: PolicyKind,
    /// How a frustrated agent reacts to an encounter (Calhoun table only)
    pub frustrated_encounter: FrustratedEncounter,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            population_size: 10,
            grid_width: 20,
            grid_height: 20,
            toroidal: false,
            gratification_limit: 10,
            gratification_limit_variation: 2,
            need_limit: 10,
            need_limit_variation: 3,
            frustration_limit: 5,
            frustration_variation: 0.0,
            random_seed: 42,
            policy: PolicyConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load and validate a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Same configuration with a different seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Reject any parameter set that could produce a non-positive limit.
    pub fn validate(&self) -> Result<(), SimError> {
        positive("population_size", self.population_size)?;
        positive("grid_width", self.grid_width)?;
        positive("grid_height", self.grid_height)?;
        positive("gratification_limit", self.gratification_limit)?;
        positive("need_limit", self.need_limit)?;
        positive("frustration_limit", self.frustration_limit)?;

        jitter_fits(
            "gratification_limit",
            self.gratification_limit,
            self.gratification_limit_variation,
        )?;
        jitter_fits("need_limit", self.need_limit, self.need_limit_variation)?;

        if !self.frustration_variation.is_finite() || self.frustration_variation < 0.0 {
            return Err(SimError::Configuration(format!(
                "frustration_variation must be a non-negative number, got {}",
                self.frustration_variation
            )));
        }
        Ok(())
    }

    pub fn cell_count(&self) -> u64 {
        u64::from(self.grid_width) * u64::from(self.grid_height)
    }
}

fn positive(name: &str, value: u32) -> Result<(), SimError> {
    if value == 0 {
        return Err(SimError::Configuration(format!("{name} must be positive")));
    }
    Ok(())
}

fn jitter_fits(name: &str, limit: u32, variation: u32) -> Result<(), SimError> {
    if variation >= limit {
        return Err(SimError::Configuration(format!(
            "{name} of {limit} with variation {variation} could drop to {}",
            i64::from(limit) - i64::from(variation)
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.population_size, 10);
        assert_eq!(config.cell_count(), 400);
        assert_eq!(config.policy.kind, PolicyKind::Calhoun);
    }

    fn assert_rejected(mutate: impl FnOnce(&mut SimulationConfig)) {
        let mut config = SimulationConfig::default();
        mutate(&mut config);
        assert!(matches!(config.validate(), Err(SimError::Configuration(_))));
    }

    #[test]
    fn test_zero_values_rejected() {
        assert_rejected(|c| c.population_size = 0);
        assert_rejected(|c| c.grid_width = 0);
        assert_rejected(|c| c.grid_height = 0);
        assert_rejected(|c| c.gratification_limit = 0);
        assert_rejected(|c| c.need_limit = 0);
        assert_rejected(|c| c.frustration_limit = 0);
    }

    #[test]
    fn test_jitter_must_leave_positive_limit() {
        let mut config = SimulationConfig {
            need_limit: 3,
            need_limit_variation: 3,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SimError::Configuration(_))));

        config.need_limit_variation = 2;
        assert!(config.validate().is_ok());

        config.gratification_limit = 2;
        config.gratification_limit_variation = 5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("could drop to -3"));
    }

    #[test]
    fn test_frustration_variation_rejected_when_negative() {
        let mut config = SimulationConfig {
            frustration_variation: -0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.frustration_variation = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            population_size = 4
            random_seed = 7

            [policy]
            frustrated_encounter = "consoled"
            "#,
        )
        .unwrap();

        assert_eq!(config.population_size, 4);
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.grid_width, 20);
        assert_eq!(config.policy.frustrated_encounter, FrustratedEncounter::Consoled);
        assert_eq!(config.policy.kind, PolicyKind::Calhoun);
    }

    #[test]
    fn test_invalid_toml_is_validated() {
        let result = SimulationConfig::from_toml_str("grid_width = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = SimulationConfig::from_toml_str("need_limit = -1");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_toml_roundtrip_through_file() {
        let config = SimulationConfig {
            toroidal: true,
            frustration_variation: 1.5,
            ..Default::default()
        };
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_toml().unwrap().as_bytes()).unwrap();

        let loaded = SimulationConfig::load(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let result = SimulationConfig::load("does/not/exist.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
