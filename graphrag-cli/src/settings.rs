//! Effective optimizer configuration for one CLI invocation
//!
//! Defaults, then `GRAPHRAG_*` environment variables, then command-line flags.

use anyhow::{Context, Result};
use graphrag_cache::{HitVerification, OptimizerConfig};

/// Command-line overrides layered on top of the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub max_fingerprint_cache: Option<usize>,
    pub max_type_cache: Option<usize>,
    pub trust_signatures: bool,
}

impl ConfigOverrides {
    /// Apply the overrides to `config` and validate the result
    pub fn apply(&self, mut config: OptimizerConfig) -> Result<OptimizerConfig> {
        if let Some(size) = self.max_fingerprint_cache {
            config.max_fingerprint_cache_size = size;
        }
        if let Some(size) = self.max_type_cache {
            config.max_type_cache_size = size;
        }
        if self.trust_signatures {
            config.hit_verification = HitVerification::Trust;
        }

        config.validate().context("Invalid command-line configuration")?;
        Ok(config)
    }
}

/// Resolve the configuration from the process environment plus `overrides`
pub fn load_config(overrides: &ConfigOverrides) -> Result<OptimizerConfig> {
    let config = OptimizerConfig::from_env().context("Invalid GRAPHRAG_* environment")?;
    overrides.apply(config)
}
