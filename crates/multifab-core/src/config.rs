//! Factory tuning values, loadable from TOML.

use serde::Deserialize;

/// Errors that can occur while loading a [`FactoryConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Tuning values shared by every factory built from them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Ticks one operation takes with no speed upgrades.
    pub base_ticks_required: u64,
    /// Multiplier reached at the maximum number of installed upgrades.
    pub max_upgrade_multiplier: f64,
    /// Energy one active process uses per tick with no upgrades.
    pub base_energy_per_tick: f64,
    /// Energy storage contributed by each process.
    pub base_energy_capacity: f64,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            base_ticks_required: 200,
            max_upgrade_multiplier: 10.0,
            base_energy_per_tick: 50.0,
            base_energy_capacity: 20_000.0,
        }
    }
}

impl FactoryConfig {
    /// Parse and validate a config from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: FactoryConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_ticks_required == 0 {
            return Err(ConfigError::InvalidValue {
                field: "base_ticks_required",
                reason: "must be at least 1".into(),
            });
        }
        if !self.max_upgrade_multiplier.is_finite() || self.max_upgrade_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "max_upgrade_multiplier",
                reason: format!("must be a finite value >= 1, got {}", self.max_upgrade_multiplier),
            });
        }
        for (field, value) in [
            ("base_energy_per_tick", self.base_energy_per_tick),
            ("base_energy_capacity", self.base_energy_capacity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be a finite non-negative value, got {value}"),
                });
            }
        }
        Ok(())
    }
}
