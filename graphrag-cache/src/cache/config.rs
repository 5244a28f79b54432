//! Configuration for the optimizer caches

use crate::error::{OptimizerError, Result};
use crate::optimizer::classifier::ClassifierRules;
use crate::optimizer::fingerprint::FingerprintConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ENV_MAX_FINGERPRINT_CACHE_SIZE: &str = "GRAPHRAG_MAX_FINGERPRINT_CACHE_SIZE";
pub const ENV_MAX_TYPE_CACHE_SIZE: &str = "GRAPHRAG_MAX_TYPE_CACHE_SIZE";
pub const ENV_HIT_VERIFICATION: &str = "GRAPHRAG_HIT_VERIFICATION";
pub const ENV_VECTOR_HINT_THRESHOLD: &str = "GRAPHRAG_VECTOR_HINT_THRESHOLD";

/// How a fingerprint-cache hit is checked before it is returned
///
/// Signatures only read a few fields, so two different requests can share one.
/// `Verify` keeps the canonical encoding of the request with each entry and
/// recomputes when the incoming request encodes differently; `Trust` returns
/// whatever the signature maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitVerification {
    Verify,
    Trust,
}

impl Default for HitVerification {
    fn default() -> Self {
        HitVerification::Verify
    }
}

impl fmt::Display for HitVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitVerification::Verify => write!(f, "verify"),
            HitVerification::Trust => write!(f, "trust"),
        }
    }
}

impl FromStr for HitVerification {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verify" => Ok(HitVerification::Verify),
            "trust" => Ok(HitVerification::Trust),
            other => Err(OptimizerError::Config(format!(
                "unknown hit verification mode: {}",
                other
            ))),
        }
    }
}

/// Configuration for one [`QueryOptimizer`](crate::optimizer::QueryOptimizer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Capacity of the signature -> fingerprint cache
    pub max_fingerprint_cache_size: usize,

    /// Capacity of the detection signature -> graph type cache
    pub max_type_cache_size: usize,

    pub hit_verification: HitVerification,

    pub fingerprint: FingerprintConfig,

    pub classifier: ClassifierRules,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_fingerprint_cache_size: 1000,
            max_type_cache_size: 500,
            hit_verification: HitVerification::Verify,
            fingerprint: FingerprintConfig::default(),
            classifier: ClassifierRules::default(),
        }
    }
}

impl OptimizerConfig {
    /// Create a new builder for optimizer configuration
    pub fn builder() -> OptimizerConfigBuilder {
        OptimizerConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_fingerprint_cache_size == 0 {
            return Err(OptimizerError::Config(
                "max_fingerprint_cache_size must be greater than 0".to_string(),
            ));
        }

        if self.max_type_cache_size == 0 {
            return Err(OptimizerError::Config(
                "max_type_cache_size must be greater than 0".to_string(),
            ));
        }

        self.fingerprint.validate().map_err(OptimizerError::Config)?;
        self.classifier.validate().map_err(OptimizerError::Config)?;

        Ok(())
    }

    /// Defaults overridden by `GRAPHRAG_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `GRAPHRAG_*` keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(size) = parse_var(&lookup, ENV_MAX_FINGERPRINT_CACHE_SIZE)? {
            config.max_fingerprint_cache_size = size;
        }
        if let Some(size) = parse_var(&lookup, ENV_MAX_TYPE_CACHE_SIZE)? {
            config.max_type_cache_size = size;
        }
        if let Some(mode) = lookup(ENV_HIT_VERIFICATION) {
            config.hit_verification = mode.parse()?;
        }
        if let Some(threshold) = parse_var(&lookup, ENV_VECTOR_HINT_THRESHOLD)? {
            config.fingerprint.vector_hint_threshold = threshold;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<F>(lookup: &F, key: &str) -> Result<Option<usize>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<usize>().map(Some).map_err(|e| {
            OptimizerError::Config(format!("{} must be a positive integer ({}): {}", key, raw, e))
        }),
    }
}

/// Builder for optimizer configuration with validation
#[derive(Debug, Default)]
pub struct OptimizerConfigBuilder {
    max_fingerprint_cache_size: Option<usize>,
    max_type_cache_size: Option<usize>,
    hit_verification: Option<HitVerification>,
    fingerprint: Option<FingerprintConfig>,
    classifier: Option<ClassifierRules>,
}

impl OptimizerConfigBuilder {
    /// Set fingerprint cache capacity
    pub fn max_fingerprint_cache_size(mut self, max: usize) -> Self {
        self.max_fingerprint_cache_size = Some(max);
        self
    }

    /// Set graph-type cache capacity
    pub fn max_type_cache_size(mut self, max: usize) -> Self {
        self.max_type_cache_size = Some(max);
        self
    }

    /// Set how fingerprint-cache hits are checked
    pub fn hit_verification(mut self, mode: HitVerification) -> Self {
        self.hit_verification = Some(mode);
        self
    }

    /// Set fingerprint normalization rules
    pub fn fingerprint(mut self, config: FingerprintConfig) -> Self {
        self.fingerprint = Some(config);
        self
    }

    /// Set classifier keyword tables and scan bounds
    pub fn classifier(mut self, rules: ClassifierRules) -> Self {
        self.classifier = Some(rules);
        self
    }

    /// Build the configuration
    pub fn build(self) -> OptimizerConfig {
        let defaults = OptimizerConfig::default();

        OptimizerConfig {
            max_fingerprint_cache_size: self
                .max_fingerprint_cache_size
                .unwrap_or(defaults.max_fingerprint_cache_size),
            max_type_cache_size: self
                .max_type_cache_size
                .unwrap_or(defaults.max_type_cache_size),
            hit_verification: self.hit_verification.unwrap_or(defaults.hit_verification),
            fingerprint: self.fingerprint.unwrap_or(defaults.fingerprint),
            classifier: self.classifier.unwrap_or(defaults.classifier),
        }
    }
}

/// Preset configurations
impl OptimizerConfig {
    /// Memory-constrained hosts
    pub fn small() -> Self {
        Self {
            max_fingerprint_cache_size: 100,
            max_type_cache_size: 50,
            ..Default::default()
        }
    }

    /// Busy request-serving hosts with a wide query mix
    pub fn large() -> Self {
        Self {
            max_fingerprint_cache_size: 50_000,
            max_type_cache_size: 10_000,
            ..Default::default()
        }
    }
}
